use std::collections::HashMap;

use anyhow::Result;
use common::allocator::PortAllocator;
use simplelog::info;
use stored::StoredNode;
use tokio::fs;
use url::Url;

use crate::{
    application::server::manager::ServerManager,
    resource::{CreateResourceError, DeleteResourceError, UpdateResourceError},
    storage::Storage,
};

use super::{Capabilities, LifecycleStatus, Node, PORT_RANGE};

pub struct NodeManager {
    nodes: HashMap<String, Node>,
}

impl NodeManager {
    pub async fn init() -> Result<Self> {
        info!("Loading nodes...");
        let mut nodes = HashMap::new();

        let directory = Storage::nodes_directory();
        if !directory.exists() {
            fs::create_dir_all(&directory).await?;
        }

        for (_, _, name, value) in Storage::for_each_content_toml::<StoredNode>(
            &directory,
            "Failed to read node from file",
        )
        .await?
        {
            info!("Loading node {}", name);
            nodes.insert(name.clone(), Node::new(&name, value));
        }

        info!("Loaded {} node(s)", nodes.len());
        Ok(Self { nodes })
    }

    pub async fn create_node(
        &mut self,
        name: &str,
        capabilities: &Capabilities,
        daemon: &Url,
    ) -> Result<(), CreateResourceError> {
        if self.nodes.contains_key(name) {
            return Err(CreateResourceError::AlreadyExists);
        }

        let node = Node::new(
            name,
            StoredNode::new(capabilities.clone(), daemon.clone()),
        );
        node.save().await.map_err(CreateResourceError::Error)?;
        self.nodes.insert(name.to_string(), node);
        info!("Created node {}", name);
        Ok(())
    }

    pub async fn set_node_status(
        &mut self,
        name: &str,
        status: LifecycleStatus,
    ) -> Result<(), UpdateResourceError> {
        let node = self
            .get_node_mut(name)
            .ok_or(UpdateResourceError::NotFound)?;
        node.set_status(status);
        node.save().await.map_err(UpdateResourceError::Error)?;
        info!("Updated status of node {}", name);
        Ok(())
    }

    pub async fn delete_node(
        &mut self,
        name: &str,
        servers: &ServerManager,
    ) -> Result<(), DeleteResourceError> {
        if servers.is_node_used(name) {
            return Err(DeleteResourceError::StillInUse);
        }
        let node = self.get_node(name).ok_or(DeleteResourceError::NotFound)?;
        if *node.status() == LifecycleStatus::Active {
            return Err(DeleteResourceError::StillActive);
        }
        node.delete().await?;
        self.nodes.remove(name);
        info!("Deleted node {}", name);
        Ok(())
    }

    pub fn get_nodes(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }
    pub fn get_node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }
}

impl Node {
    pub(crate) fn new(name: &str, node: StoredNode) -> Self {
        Self {
            name: name.to_string(),
            capabilities: node.capabilities().clone(),
            status: node.status().clone(),
            daemon: node.daemon().clone(),
            ports: PortAllocator::new(PORT_RANGE),
        }
    }
}

pub(crate) mod stored {
    use getset::Getters;
    use serde::{Deserialize, Serialize};
    use url::Url;

    use crate::{
        application::node::{Capabilities, LifecycleStatus, Node},
        storage::{LoadFromTomlFile, SaveToTomlFile},
    };

    #[derive(Serialize, Deserialize, Getters)]
    pub struct StoredNode {
        /* Settings */
        #[getset(get = "pub")]
        capabilities: Capabilities,
        #[getset(get = "pub")]
        status: LifecycleStatus,

        /* Daemon */
        #[getset(get = "pub")]
        daemon: Url,
    }

    impl StoredNode {
        pub fn new(capabilities: Capabilities, daemon: Url) -> Self {
            Self {
                capabilities,
                status: LifecycleStatus::Inactive,
                daemon,
            }
        }

        pub fn from(node: &Node) -> Self {
            Self {
                capabilities: node.capabilities.clone(),
                status: node.status.clone(),
                daemon: node.daemon.clone(),
            }
        }
    }

    impl LoadFromTomlFile for StoredNode {}
    impl SaveToTomlFile for StoredNode {}
}
