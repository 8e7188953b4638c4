use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::{
    application::{
        node::{Capabilities, LifecycleStatus, Node},
        Panel,
    },
    task::{BoxedAny, GenericTask},
};

use super::{server::ServerSummary, AdminError, AdminTask};

/// Page size of the servers listing on a node view.
pub const SERVERS_PER_PAGE: usize = 25;

/// Memory usage below the low threshold renders green, between the two
/// yellow and above the medium threshold red.
pub const THRESHOLD_PERCENTAGE_LOW: f64 = 75.0;
pub const THRESHOLD_PERCENTAGE_MEDIUM: f64 = 90.0;

pub struct CreateNodeTask {
    pub name: String,
    pub capabilities: Capabilities,
    pub daemon: Url,
}
pub struct SetNodeStatusTask(pub String, pub LifecycleStatus);
pub struct DeleteNodeTask(pub String);
pub struct GetNodesTask;
pub struct GetNodeViewTask {
    pub name: String,
    pub page: usize,
}

pub struct NodeSummary {
    pub name: String,
    pub active: bool,
    pub daemon: String,
    pub servers: usize,
}

/// Detail view of one node with a paginated listing of its servers.
pub struct NodeView {
    pub name: String,
    pub active: bool,
    pub daemon: String,
    pub servers: usize,
    pub memory_used: u64,
    pub memory_capacity: Option<u32>,
    pub memory_utilization: Option<Utilization>,
    pub page: Vec<ServerSummary>,
    pub pages: usize,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Utilization {
    Low,
    Medium,
    High,
}

impl Utilization {
    pub fn classify(percent: f64) -> Self {
        if percent >= THRESHOLD_PERCENTAGE_MEDIUM {
            Utilization::High
        } else if percent >= THRESHOLD_PERCENTAGE_LOW {
            Utilization::Medium
        } else {
            Utilization::Low
        }
    }
}

#[async_trait]
impl GenericTask for CreateNodeTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel
            .nodes
            .create_node(&self.name, &self.capabilities, &self.daemon)
            .await
        {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for SetNodeStatusTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel.nodes.set_node_status(&self.0, self.1.clone()).await {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for DeleteNodeTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        match panel.nodes.delete_node(&self.0, &panel.servers).await {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for GetNodesTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let mut nodes = panel
            .nodes
            .get_nodes()
            .iter()
            .map(|node| NodeSummary {
                name: node.name().to_string(),
                active: *node.status() == LifecycleStatus::Active,
                daemon: node.daemon().to_string(),
                servers: panel.servers.servers_on_node(node.name()).len(),
            })
            .collect::<Vec<_>>();
        nodes.sort_by(|left, right| left.name.cmp(&right.name));
        AdminTask::new_ok(nodes)
    }
}

#[async_trait]
impl GenericTask for GetNodeViewTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(node) = panel.nodes.get_node(&self.name) else {
            return AdminTask::new_err(AdminError::NotFound("Node not found".to_string()));
        };

        let mut servers = panel
            .servers
            .servers_on_node(node.name())
            .iter()
            .map(|server| ServerSummary::from(*server))
            .collect::<Vec<_>>();
        servers.sort_by(|left, right| left.name.cmp(&right.name));

        AdminTask::new_ok(NodeView::assemble(
            node,
            servers,
            panel.servers.used_memory_on_node(node.name()),
            self.page,
        ))
    }
}

impl NodeView {
    fn assemble(node: &Node, servers: Vec<ServerSummary>, memory_used: u64, page: usize) -> Self {
        let memory_capacity = node.capabilities().memory();
        let memory_utilization = memory_capacity.filter(|capacity| *capacity > 0).map(|capacity| {
            Utilization::classify(memory_used as f64 / f64::from(capacity) * 100.0)
        });
        let total = servers.len();
        let (page, pages) = paginate(servers, page, SERVERS_PER_PAGE);
        Self {
            name: node.name().to_string(),
            active: *node.status() == LifecycleStatus::Active,
            daemon: node.daemon().to_string(),
            servers: total,
            memory_used,
            memory_capacity,
            memory_utilization,
            page,
            pages,
        }
    }
}

/// Returns the requested zero based page and the total page count. Pages
/// past the end come back empty.
fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> (Vec<T>, usize) {
    let pages = items.len().div_ceil(per_page);
    let page = items
        .into_iter()
        .skip(page.saturating_mul(per_page))
        .take(per_page)
        .collect();
    (page, pages)
}
