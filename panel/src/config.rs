use std::{fs, time::Duration};

use anyhow::Result;
use common::file::SyncLoadFromTomlFile;
use serde::Deserialize;

use crate::storage::Storage;

const DEFAULT_CONFIG: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/configs/config.toml"));

#[derive(Deserialize)]
struct Session {
    timeout: u64,
}

#[derive(Deserialize)]
pub struct Config {
    session: Session,
}

impl Config {
    pub fn parse() -> Result<Self> {
        let path = Storage::primary_config_file();
        if path.exists() {
            Self::from_file(&path)
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG)?;
            Self::from_file(&path)
        }
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session.timeout)
    }
}

impl SyncLoadFromTomlFile for Config {}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_CONFIG};

    #[test]
    fn default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).expect("default config is valid");
        assert_eq!(config.session_timeout().as_secs(), 900);
    }
}
