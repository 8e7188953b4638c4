use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::{server::Server, Panel},
    task::{BoxedAny, GenericTask},
};

use super::{AdminError, AdminTask};

pub struct GetServersTask(pub Option<ServerGrouping>);
pub struct GetServerTask(pub Uuid);
pub struct DeleteServerTask(pub Uuid);

/// Grouping of the server listing, mirrors the columns an admin can group
/// by.
#[derive(Clone, Copy)]
pub enum ServerGrouping {
    Node,
    Owner,
    Egg,
}

#[derive(Clone)]
pub struct ServerSummary {
    pub uuid: Uuid,
    pub name: String,
    pub node: String,
    pub egg: String,
    pub owner: String,
    pub status: String,
    pub ports: Vec<u16>,
}

pub struct ServerGroup {
    pub key: String,
    pub servers: Vec<ServerSummary>,
}

pub struct ServerDetail {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub node: String,
    pub egg: String,
    pub owner: String,
    pub status: String,
    pub ports: Vec<u16>,
    pub image: String,
    pub startup: String,
    pub environment: BTreeMap<String, String>,
}

#[async_trait]
impl GenericTask for GetServersTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let mut servers = panel
            .servers
            .get_servers()
            .iter()
            .map(|server| ServerSummary::from(*server))
            .collect::<Vec<_>>();
        servers.sort_by(|left, right| left.name.cmp(&right.name));
        AdminTask::new_ok(group_servers(servers, self.0))
    }
}

#[async_trait]
impl GenericTask for GetServerTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(server) = panel.servers.get_server(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Server not found".to_string()));
        };
        AdminTask::new_ok(ServerDetail::from(server))
    }
}

#[async_trait]
impl GenericTask for DeleteServerTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel.servers.delete_server(&self.0, &mut panel.nodes).await {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

/// Splits an already sorted listing into groups while keeping the sort
/// order inside every group. Without a grouping everything lands in one
/// unnamed group.
pub fn group_servers(servers: Vec<ServerSummary>, grouping: Option<ServerGrouping>) -> Vec<ServerGroup> {
    let Some(grouping) = grouping else {
        return vec![ServerGroup {
            key: String::new(),
            servers,
        }];
    };

    let mut groups: Vec<ServerGroup> = Vec::new();
    for server in servers {
        let key = match grouping {
            ServerGrouping::Node => &server.node,
            ServerGrouping::Owner => &server.owner,
            ServerGrouping::Egg => &server.egg,
        }
        .clone();
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.servers.push(server),
            None => groups.push(ServerGroup {
                key,
                servers: vec![server],
            }),
        }
    }
    groups.sort_by(|left, right| left.key.cmp(&right.key));
    groups
}

impl From<&Server> for ServerSummary {
    fn from(server: &Server) -> Self {
        Self {
            uuid: server.uuid(),
            name: server.name().clone(),
            node: server.node().clone(),
            egg: server.egg().clone(),
            owner: server.owner().clone(),
            status: server.status().as_str().to_string(),
            ports: server.ports().clone(),
        }
    }
}

impl From<&Server> for ServerDetail {
    fn from(server: &Server) -> Self {
        Self {
            uuid: server.uuid(),
            name: server.name().clone(),
            description: server.description().clone(),
            node: server.node().clone(),
            egg: server.egg().clone(),
            owner: server.owner().clone(),
            status: server.status().as_str().to_string(),
            ports: server.ports().clone(),
            image: server.spec().image().clone(),
            startup: server.spec().startup().clone(),
            environment: server.spec().environment().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{group_servers, ServerGrouping, ServerSummary};

    fn summary(name: &str, node: &str, owner: &str) -> ServerSummary {
        ServerSummary {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            node: node.to_string(),
            egg: "minecraft".to_string(),
            owner: owner.to_string(),
            status: "running".to_string(),
            ports: vec![25565],
        }
    }

    #[test]
    fn no_grouping_keeps_one_flat_group() {
        let groups = group_servers(
            vec![summary("a", "node01", "admin"), summary("b", "node02", "admin")],
            None,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].servers.len(), 2);
    }

    #[test]
    fn grouping_by_node_splits_and_sorts() {
        let groups = group_servers(
            vec![
                summary("a", "node02", "admin"),
                summary("b", "node01", "admin"),
                summary("c", "node02", "other"),
            ],
            Some(ServerGrouping::Node),
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "node01");
        assert_eq!(groups[1].key, "node02");
        assert_eq!(groups[1].servers.len(), 2);
    }

    #[test]
    fn grouping_by_owner_uses_the_owner_key() {
        let groups = group_servers(
            vec![summary("a", "node01", "admin"), summary("b", "node01", "zoe")],
            Some(ServerGrouping::Owner),
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "admin");
        assert_eq!(groups[1].key, "zoe");
    }
}
