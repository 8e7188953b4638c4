use anyhow::Result;
use common::allocator::PortAllocator;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use tokio::fs;
use url::Url;

use crate::storage::{SaveToTomlFile, Storage};

use self::manager::stored::StoredNode;

pub mod manager;

/// Ports a server may use. Everything at or below 1024 and the top port
/// 65535 stay off limits.
pub const PORT_RANGE: std::ops::Range<u16> = 1025..65535;

pub struct Node {
    /* Settings */
    name: String,
    capabilities: Capabilities,
    status: LifecycleStatus,

    /* Daemon */
    daemon: Url,

    /* Ports claimed by servers on this node */
    ports: PortAllocator,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
    pub fn status(&self) -> &LifecycleStatus {
        &self.status
    }
    pub fn daemon(&self) -> &Url {
        &self.daemon
    }

    pub fn set_status(&mut self, status: LifecycleStatus) {
        self.status = status;
    }

    /// Claims every port in the slice or none of them. The failing port is
    /// returned when one is already taken by another server.
    pub fn claim_ports(&mut self, ports: &[u16]) -> Result<(), u16> {
        self.ports.claim_all(ports)
    }

    pub fn release_ports(&mut self, ports: &[u16]) {
        self.ports.release_all(ports);
    }

    pub fn is_port_claimed(&self, port: u16) -> bool {
        self.ports.is_claimed(port)
    }

    pub async fn save(&self) -> Result<()> {
        StoredNode::from(self)
            .save(&Storage::node_file(&self.name), true)
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        let path = Storage::node_file(&self.name);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Default, CopyGetters)]
pub struct Capabilities {
    /* Limits servers have to share on this node */
    #[getset(get_copy = "pub")]
    memory: Option<u32>,
    #[getset(get_copy = "pub")]
    max_servers: Option<u32>,
}

impl Capabilities {
    pub fn new(memory: Option<u32>, max_servers: Option<u32>) -> Self {
        Self {
            memory,
            max_servers,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
pub enum LifecycleStatus {
    #[serde(rename = "inactive")]
    #[default]
    Inactive,
    #[serde(rename = "active")]
    Active,
}
