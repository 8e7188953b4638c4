use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
};

use anyhow::Result;
use simplelog::{info, warn};
use stored::StoredServer;
use tokio::fs;
use uuid::Uuid;

use crate::{
    application::{
        draft::ServerConfigurationPayload,
        node::{manager::NodeManager, LifecycleStatus, Node},
    },
    resource::DeleteResourceError,
    storage::Storage,
};

use super::{Server, Status};

pub struct ServerManager {
    servers: HashMap<Uuid, Server>,
}

impl ServerManager {
    pub async fn init(nodes: &mut NodeManager) -> Result<Self> {
        info!("Loading servers...");
        let mut servers = HashMap::new();

        let directory = Storage::servers_directory();
        if !directory.exists() {
            fs::create_dir_all(&directory).await?;
        }

        for (_, _, stem, value) in Storage::for_each_content_toml::<StoredServer>(
            &directory,
            "Failed to read server from file",
        )
        .await?
        {
            let uuid = match stem.parse::<Uuid>() {
                Ok(uuid) => uuid,
                Err(_) => {
                    warn!("Skipping server file with an invalid uuid: {}", stem);
                    continue;
                }
            };

            let server = Server::new_from_stored(uuid, value);
            match nodes.get_node_mut(server.node()) {
                Some(node) => {
                    if let Err(port) = node.claim_ports(server.ports()) {
                        warn!(
                            "Server {} uses port {} which is already claimed on node {}",
                            server.name(),
                            port,
                            server.node()
                        );
                    }
                }
                None => {
                    warn!(
                        "Node {} of server {} is not loaded",
                        server.node(),
                        server.name()
                    );
                }
            }
            servers.insert(uuid, server);
        }

        info!("Loaded {} server(s)", servers.len());
        Ok(Self { servers })
    }

    /// Provisions a server on the given node from a finished configuration
    /// payload. This is the creation side of a draft submission.
    pub async fn create(
        &mut self,
        payload: &ServerConfigurationPayload,
        node: &mut Node,
    ) -> Result<Uuid, CreationError> {
        if *node.status() != LifecycleStatus::Active {
            return Err(CreationError::NodeNotActive);
        }

        if let Some(max_servers) = node.capabilities().max_servers() {
            if self.servers_on_node(node.name()).len() as u32 >= max_servers {
                return Err(CreationError::NodeFull);
            }
        }
        if let Some(memory) = node.capabilities().memory() {
            let used = self.used_memory_on_node(node.name());
            if used + u64::from(payload.resources().memory()) > u64::from(memory) {
                return Err(CreationError::OutOfMemory);
            }
        }

        node.claim_ports(payload.ports())
            .map_err(CreationError::PortInUse)?;

        let server = Server::new_from_payload(Uuid::new_v4(), payload);
        if let Err(error) = server.save().await {
            node.release_ports(payload.ports());
            return Err(CreationError::Error(error));
        }

        info!(
            "Created server {} on node {}",
            server.name(),
            server.node()
        );
        let uuid = server.uuid();
        self.servers.insert(uuid, server);
        Ok(uuid)
    }

    pub async fn delete_server(
        &mut self,
        uuid: &Uuid,
        nodes: &mut NodeManager,
    ) -> Result<(), DeleteResourceError> {
        let server = self.servers.get(uuid).ok_or(DeleteResourceError::NotFound)?;
        server.delete().await?;
        if let Some(node) = nodes.get_node_mut(server.node()) {
            node.release_ports(server.ports());
        }
        let server = self
            .servers
            .remove(uuid)
            .expect("Server vanished while deleting it");
        info!("Deleted server {}", server.name());
        Ok(())
    }

    pub fn get_server(&self, uuid: &Uuid) -> Option<&Server> {
        self.servers.get(uuid)
    }

    pub fn get_servers(&self) -> Vec<&Server> {
        self.servers.values().collect()
    }

    pub fn is_node_used(&self, name: &str) -> bool {
        self.servers.values().any(|server| server.node() == name)
    }

    pub fn is_user_used(&self, username: &str) -> bool {
        self.servers.values().any(|server| server.owner() == username)
    }

    pub fn servers_on_node(&self, name: &str) -> Vec<&Server> {
        self.servers
            .values()
            .filter(|server| server.node() == name)
            .collect()
    }

    pub fn used_memory_on_node(&self, name: &str) -> u64 {
        self.servers
            .values()
            .filter(|server| server.node() == name)
            .map(|server| u64::from(server.resources().memory()))
            .sum()
    }
}

// Ticking
impl ServerManager {
    pub async fn tick(&mut self) -> Result<()> {
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Server {
    fn new_from_payload(uuid: Uuid, payload: &ServerConfigurationPayload) -> Self {
        let status = if payload.start_on_completion() {
            Status::Installing
        } else {
            Status::Offline
        };
        Self {
            uuid,
            name: payload.name().clone(),
            description: payload.description().clone(),
            egg: payload.egg().clone(),
            node: payload.node().clone(),
            owner: payload.owner().clone(),
            ports: payload.ports().clone(),
            resources: payload.resources().clone(),
            spec: payload.spec(),
            status,
        }
    }

    fn new_from_stored(uuid: Uuid, server: StoredServer) -> Self {
        Self {
            uuid,
            name: server.name,
            description: server.description,
            egg: server.egg,
            node: server.node,
            owner: server.owner,
            ports: server.ports,
            resources: server.resources,
            spec: server.spec,
            status: server.status,
        }
    }
}

#[derive(Debug)]
pub enum CreationError {
    NodeNotFound,
    NodeNotActive,
    NodeFull,
    OutOfMemory,
    PortInUse(u16),
    EggNotFound,
    OwnerNotFound,
    Error(anyhow::Error),
}

impl Display for CreationError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationError::NodeNotFound => write!(formatter, "Node not found"),
            CreationError::NodeNotActive => write!(formatter, "Node is not active"),
            CreationError::NodeFull => {
                write!(formatter, "Node has reached its maximum amount of servers")
            }
            CreationError::OutOfMemory => {
                write!(formatter, "Node does not have enough memory left")
            }
            CreationError::PortInUse(port) => {
                write!(formatter, "Port {} is already in use on this node", port)
            }
            CreationError::EggNotFound => write!(formatter, "Egg not found"),
            CreationError::OwnerNotFound => write!(formatter, "Owner not found"),
            CreationError::Error(error) => write!(formatter, "Error: {}", error),
        }
    }
}

pub(crate) mod stored {
    use serde::{Deserialize, Serialize};

    use crate::{
        application::server::{Resources, Server, Specification, Status},
        storage::{LoadFromTomlFile, SaveToTomlFile},
    };

    #[derive(Serialize, Deserialize)]
    pub struct StoredServer {
        /* Identity */
        pub name: String,
        #[serde(default)]
        pub description: String,

        /* Where */
        pub egg: String,
        pub node: String,
        pub owner: String,

        /* Network */
        pub ports: Vec<u16>,

        /* How */
        pub resources: Resources,
        pub spec: Specification,

        /* State */
        pub status: Status,
    }

    impl StoredServer {
        pub fn from(server: &Server) -> Self {
            Self {
                name: server.name.clone(),
                description: server.description.clone(),
                egg: server.egg.clone(),
                node: server.node.clone(),
                owner: server.owner.clone(),
                ports: server.ports.clone(),
                resources: server.resources.clone(),
                spec: server.spec.clone(),
                status: server.status.clone(),
            }
        }
    }

    impl LoadFromTomlFile for StoredServer {}
    impl SaveToTomlFile for StoredServer {}
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use url::Url;
    use uuid::Uuid;

    use crate::application::{
        draft::{rules::BasicRuleEvaluator, Draft, DraftEvent, ServerConfigurationPayload},
        egg::Egg,
        node::{manager::stored::StoredNode, Capabilities, LifecycleStatus, Node},
        server::{Resources, Specification, Status},
    };

    use super::{CreationError, Server, ServerManager};

    fn node(capabilities: Capabilities, active: bool) -> Node {
        let mut node = Node::new(
            "node01",
            StoredNode::new(capabilities, Url::parse("https://daemon.example:8080").unwrap()),
        );
        if active {
            node.set_status(LifecycleStatus::Active);
        }
        node
    }

    fn manager_with(servers: Vec<Server>) -> ServerManager {
        let mut map = HashMap::new();
        for server in servers {
            map.insert(server.uuid(), server);
        }
        ServerManager { servers: map }
    }

    fn existing_server(name: &str, memory: u32) -> Server {
        Server {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            egg: "minecraft".to_string(),
            node: "node01".to_string(),
            owner: "admin".to_string(),
            ports: Vec::new(),
            resources: Resources::new(memory, 0, 0, 0, 500, false),
            spec: Specification::new(
                "ghcr.io/example/game:1".to_string(),
                "run".to_string(),
                Default::default(),
                Default::default(),
                Default::default(),
            ),
            status: Status::Running,
        }
    }

    fn payload(memory: u32) -> ServerConfigurationPayload {
        let mut draft = Draft::new(Uuid::new_v4());
        let egg = Egg::new(
            "Minecraft",
            "",
            "run",
            vec!["ghcr.io/example/game:1".to_string()],
            Vec::new(),
        );
        draft.apply(DraftEvent::SelectEgg(egg)).unwrap();
        draft
            .apply(DraftEvent::SelectNode("node01".to_string()))
            .unwrap();
        draft
            .apply(DraftEvent::SelectOwner("admin".to_string()))
            .unwrap();
        draft
            .apply(DraftEvent::SetPortTokens(vec!["25565".to_string()]))
            .unwrap();
        if memory > 0 {
            draft
                .apply(DraftEvent::ToggleLimit {
                    kind: crate::application::draft::limits::LimitKind::Memory,
                    unlimited: false,
                })
                .unwrap();
            draft
                .apply(DraftEvent::SetLimit {
                    kind: crate::application::draft::limits::LimitKind::Memory,
                    value: memory,
                })
                .unwrap();
        }
        draft.build_payload(&BasicRuleEvaluator).unwrap()
    }

    #[tokio::test]
    async fn inactive_nodes_refuse_servers() {
        let mut node = node(Capabilities::default(), false);
        let mut manager = manager_with(Vec::new());
        assert!(matches!(
            manager.create(&payload(0), &mut node).await,
            Err(CreationError::NodeNotActive)
        ));
    }

    #[tokio::test]
    async fn full_nodes_refuse_servers() {
        let mut node = node(Capabilities::new(None, Some(1)), true);
        let mut manager = manager_with(vec![existing_server("existing", 0)]);
        assert!(matches!(
            manager.create(&payload(0), &mut node).await,
            Err(CreationError::NodeFull)
        ));
    }

    #[tokio::test]
    async fn memory_capacity_is_enforced() {
        let mut node = node(Capabilities::new(Some(4096), None), true);
        let mut manager = manager_with(vec![existing_server("existing", 3072)]);
        assert!(matches!(
            manager.create(&payload(2048), &mut node).await,
            Err(CreationError::OutOfMemory)
        ));
    }

    #[tokio::test]
    async fn claimed_ports_refuse_servers() {
        let mut node = node(Capabilities::default(), true);
        node.claim_ports(&[25565]).unwrap();
        let mut manager = manager_with(Vec::new());
        assert!(matches!(
            manager.create(&payload(0), &mut node).await,
            Err(CreationError::PortInUse(25565))
        ));
    }
}
