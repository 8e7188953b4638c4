use std::collections::BTreeMap;

use anyhow::Result;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::storage::{SaveToTomlFile, Storage};

use self::manager::stored::StoredServer;

pub mod manager;

/// A provisioned server instance.
#[derive(Getters, CopyGetters)]
pub struct Server {
    /* Identity */
    #[getset(get_copy = "pub")]
    uuid: Uuid,
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    description: String,

    /* Where */
    #[getset(get = "pub")]
    egg: String,
    #[getset(get = "pub")]
    node: String,
    #[getset(get = "pub")]
    owner: String,

    /* Network */
    #[getset(get = "pub")]
    ports: Vec<u16>,

    /* How */
    #[getset(get = "pub")]
    resources: Resources,
    #[getset(get = "pub")]
    spec: Specification,

    /* State */
    #[getset(get = "pub")]
    status: Status,
}

impl Server {
    pub async fn save(&self) -> Result<()> {
        StoredServer::from(self)
            .save(&Storage::server_file(&self.uuid), true)
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        let path = Storage::server_file(&self.uuid);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

/// Runtime limits handed to the daemon when the server starts.
///
/// A memory, disk or cpu value of 0 means unlimited. Swap keeps the docker
/// convention of -1 for unlimited and 0 for disabled.
#[derive(Serialize, Deserialize, Clone, Default, CopyGetters)]
pub struct Resources {
    #[getset(get_copy = "pub")]
    memory: u32,
    #[getset(get_copy = "pub")]
    swap: i64,
    #[getset(get_copy = "pub")]
    disk: u32,
    #[getset(get_copy = "pub")]
    cpu: u32,
    #[getset(get_copy = "pub")]
    io: u32,
    #[getset(get_copy = "pub")]
    oom_kill: bool,
}

impl Resources {
    pub fn new(memory: u32, swap: i64, disk: u32, cpu: u32, io: u32, oom_kill: bool) -> Self {
        Self {
            memory,
            swap,
            disk,
            cpu,
            io,
            oom_kill,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Getters)]
pub struct Specification {
    /* Image */
    #[getset(get = "pub")]
    image: String,

    /* Startup */
    #[getset(get = "pub")]
    startup: String,
    #[getset(get = "pub")]
    environment: BTreeMap<String, String>,

    /* Docker */
    #[getset(get = "pub")]
    labels: BTreeMap<String, String>,

    /* Features */
    #[getset(get = "pub")]
    feature_limits: FeatureLimits,
}

impl Specification {
    pub fn new(
        image: String,
        startup: String,
        environment: BTreeMap<String, String>,
        labels: BTreeMap<String, String>,
        feature_limits: FeatureLimits,
    ) -> Self {
        Self {
            image,
            startup,
            environment,
            labels,
            feature_limits,
        }
    }
}

/// Caps on how many extra allocations, databases and backups a server may
/// use once it is running.
#[derive(Serialize, Deserialize, Clone, Default, CopyGetters)]
pub struct FeatureLimits {
    #[getset(get_copy = "pub")]
    allocations: u32,
    #[getset(get_copy = "pub")]
    databases: u32,
    #[getset(get_copy = "pub")]
    backups: u32,
}

impl FeatureLimits {
    pub fn new(allocations: u32, databases: u32, backups: u32) -> Self {
        Self {
            allocations,
            databases,
            backups,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub enum Status {
    #[serde(rename = "installing")]
    Installing,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "offline")]
    Offline,
    #[serde(rename = "suspended")]
    Suspended,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Installing => "installing",
            Status::Running => "running",
            Status::Offline => "offline",
            Status::Suspended => "suspended",
        }
    }
}
