/*
All the storage related functions are implemented here.
This makes it easier to change them in the future
*/

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use simplelog::warn;
use tokio::fs;

/* Logs */
const LOGS_DIRECTORY: &str = "logs";
const LATEST_LOG_FILE: &str = "latest.log";

/* Eggs */
const EGGS_DIRECTORY: &str = "eggs";

/* Nodes */
const NODES_DIRECTORY: &str = "nodes";

/* Users */
const USERS_DIRECTORY: &str = "users";

/* Servers */
const SERVERS_DIRECTORY: &str = "servers";

/* Configs */
const CONFIG_DIRECTORY: &str = "configs";
const PRIMARY_CONFIG_FILE: &str = "config.toml";

pub struct Storage;

impl Storage {
    /* Logs */
    pub fn latest_log_file() -> PathBuf {
        PathBuf::from(LOGS_DIRECTORY).join(LATEST_LOG_FILE)
    }

    /* Eggs */
    pub fn eggs_directory() -> PathBuf {
        PathBuf::from(EGGS_DIRECTORY)
    }

    /* Nodes */
    pub fn nodes_directory() -> PathBuf {
        PathBuf::from(NODES_DIRECTORY)
    }
    pub fn node_file(name: &str) -> PathBuf {
        Storage::nodes_directory().join(format!("{}.toml", name))
    }

    /* Users */
    pub fn users_directory() -> PathBuf {
        PathBuf::from(USERS_DIRECTORY)
    }
    pub fn user_file(username: &str) -> PathBuf {
        Storage::users_directory().join(format!("{}.toml", username))
    }

    /* Servers */
    pub fn servers_directory() -> PathBuf {
        PathBuf::from(SERVERS_DIRECTORY)
    }
    pub fn server_file(uuid: &uuid::Uuid) -> PathBuf {
        Storage::servers_directory().join(format!("{}.toml", uuid))
    }

    /* Configs */
    pub fn configs_directory() -> PathBuf {
        PathBuf::from(CONFIG_DIRECTORY)
    }
    pub fn primary_config_file() -> PathBuf {
        Storage::configs_directory().join(PRIMARY_CONFIG_FILE)
    }

    pub async fn for_each_content_toml<T: LoadFromTomlFile>(
        path: &Path,
        error_message: &str,
    ) -> Result<Vec<(PathBuf, String, String, T)>> {
        let mut result = Vec::new();
        let mut directory = fs::read_dir(path).await?;
        while let Some(entry) = directory.next_entry().await? {
            if entry.path().is_dir() {
                continue;
            }
            match T::from_file(&entry.path()).await {
                Ok(value) => {
                    let path = entry.path();
                    match (path.file_name(), path.file_stem()) {
                        (Some(name), Some(stem)) => result.push((
                            path.to_owned(),
                            name.to_string_lossy().to_string(),
                            stem.to_string_lossy().to_string(),
                            value,
                        )),
                        _ => {
                            warn!("Failed to read file names: {:?}", path);
                        }
                    }
                }
                Err(error) => {
                    warn!("{}@{:?}: {:?}", error_message, entry.path(), error);
                }
            }
        }
        Ok(result)
    }
}

pub trait SaveToTomlFile: Serialize {
    async fn save(&self, path: &Path, create_parent: bool) -> Result<()> {
        if create_parent {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, toml::to_string(self)?).await?;
        Ok(())
    }
}

pub trait LoadFromTomlFile: DeserializeOwned {
    async fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).await?;
        let value = toml::from_str(&data)?;
        Ok(value)
    }
}
