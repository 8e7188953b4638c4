use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    application::{
        draft::{
            assignment::ASSIGNMENTS_DISABLED_HINT,
            rules::{check_variable, RuleEvaluator, VariableInputKind},
            CreationService, Draft, DraftEvent, ServerConfigurationPayload, SubmitError,
        },
        egg::manager::EggManager,
        node::manager::NodeManager,
        server::manager::{CreationError, ServerManager},
        user::manager::UserManager,
        Panel,
    },
    task::{BoxedAny, GenericTask},
};

use super::{AdminError, AdminTask};

pub struct OpenDraftTask;
pub struct SelectDraftEggTask(pub Uuid, pub String);
pub struct ApplyDraftEventTask(pub Uuid, pub Option<DraftEvent>);
pub struct GetDraftTask(pub Uuid);
pub struct SubmitDraftTask(pub Uuid);
pub struct DiscardDraftTask(pub Uuid);

/// Snapshot of a draft for the frontend: the normalized ports, the
/// assignment slots with their enabled state, the environment mapping and
/// the per field validation messages.
pub struct DraftView {
    pub uuid: Uuid,
    pub egg: Option<String>,
    pub node: Option<String>,
    pub owner: Option<String>,
    pub name: String,
    pub description: String,
    pub startup: String,
    pub port_tokens: Vec<String>,
    pub ports: Vec<u16>,
    pub assignments: Vec<AssignmentSlot>,
    pub environment: BTreeMap<String, String>,
    pub variables: Vec<VariableField>,
    pub selected_image: String,
    pub image: String,
    pub start_on_completion: bool,
}

pub struct AssignmentSlot {
    pub variable: String,
    pub port: Option<u16>,
    pub enabled: bool,
    pub hint: Option<String>,
}

pub struct VariableField {
    pub env_variable: String,
    pub description: String,
    pub value: String,
    /// `Some` turns the field into a closed dropdown.
    pub options: Option<Vec<String>>,
    pub message: Option<String>,
}

#[async_trait]
impl GenericTask for OpenDraftTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        AdminTask::new_ok(panel.drafts.open())
    }
}

#[async_trait]
impl GenericTask for SelectDraftEggTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(egg) = panel.eggs.get_egg(&self.1).cloned() else {
            return AdminTask::new_err(AdminError::NotFound("Egg not found".to_string()));
        };
        let Some(draft) = panel.drafts.get_draft_mut(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Draft not found".to_string()));
        };
        match draft.apply(DraftEvent::SelectEgg(egg)) {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(AdminError::Invalid(error.to_string())),
        }
    }
}

#[async_trait]
impl GenericTask for ApplyDraftEventTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(event) = self.1.take() else {
            return AdminTask::new_err(AdminError::Internal(
                "Draft event was already consumed".to_string(),
            ));
        };
        let Some(draft) = panel.drafts.get_draft_mut(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Draft not found".to_string()));
        };
        match draft.apply(event) {
            Ok(()) => AdminTask::new_empty(),
            Err(error) => AdminTask::new_err(AdminError::Invalid(error.to_string())),
        }
    }
}

#[async_trait]
impl GenericTask for GetDraftTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(draft) = panel.drafts.get_draft(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Draft not found".to_string()));
        };
        AdminTask::new_ok(DraftView::assemble(draft, panel.evaluator.as_ref()))
    }
}

#[async_trait]
impl GenericTask for SubmitDraftTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(draft) = panel.drafts.get_draft_mut(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Draft not found".to_string()));
        };

        let mut service = PanelCreation {
            servers: &mut panel.servers,
            nodes: &mut panel.nodes,
            eggs: &panel.eggs,
            users: &panel.users,
        };
        match draft.submit(panel.evaluator.as_ref(), &mut service).await {
            Ok(server) => {
                // The session is done, only failures keep it alive
                panel.drafts.discard(&self.0);
                AdminTask::new_ok(server)
            }
            Err(error) => AdminTask::new_err(error.into()),
        }
    }
}

#[async_trait]
impl GenericTask for DiscardDraftTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        if panel.drafts.discard(&self.0) {
            AdminTask::new_empty()
        } else {
            AdminTask::new_err(AdminError::NotFound("Draft not found".to_string()))
        }
    }
}

impl DraftView {
    fn assemble(draft: &Draft, evaluator: &dyn RuleEvaluator) -> Self {
        let enabled = !draft.ports().is_empty();
        let hint = if enabled {
            None
        } else {
            Some(ASSIGNMENTS_DISABLED_HINT.to_string())
        };

        let assignments = draft
            .assignments()
            .effective(draft.ports())
            .into_iter()
            .map(|(variable, port)| AssignmentSlot {
                variable: variable.to_string(),
                port,
                enabled,
                hint: hint.clone(),
            })
            .collect();

        let variables = draft
            .resolved()
            .free_variables()
            .iter()
            .map(|variable| {
                let definition = variable.definition();
                let value = draft
                    .environment()
                    .get(definition.env_variable())
                    .cloned()
                    .unwrap_or_default();
                let message = check_variable(
                    variable.kind(),
                    definition.env_variable(),
                    definition.rules(),
                    &value,
                    evaluator,
                );
                let options = match variable.kind() {
                    VariableInputKind::Enumeration(values) => Some(values.clone()),
                    VariableInputKind::Text => None,
                };
                VariableField {
                    env_variable: definition.env_variable().clone(),
                    description: definition.description().clone(),
                    value,
                    options,
                    message,
                }
            })
            .collect();

        Self {
            uuid: draft.uuid(),
            egg: draft.egg().map(|egg| egg.name().clone()),
            node: draft.node().cloned(),
            owner: draft.owner().cloned(),
            name: draft.name().to_string(),
            description: draft.description().to_string(),
            startup: draft.startup().to_string(),
            port_tokens: draft.port_tokens().to_vec(),
            ports: draft.ports().to_vec(),
            assignments,
            environment: draft.environment().clone(),
            variables,
            selected_image: draft.image().selected().to_string(),
            image: draft.image().image().to_string(),
            start_on_completion: draft.start_on_completion(),
        }
    }
}

/// Creation service backed by the panel's own managers.
struct PanelCreation<'a> {
    servers: &'a mut ServerManager,
    nodes: &'a mut NodeManager,
    eggs: &'a EggManager,
    users: &'a UserManager,
}

#[async_trait]
impl CreationService for PanelCreation<'_> {
    async fn create(
        &mut self,
        payload: &ServerConfigurationPayload,
    ) -> Result<Uuid, CreationError> {
        if !self.eggs.has_egg(payload.egg()) {
            return Err(CreationError::EggNotFound);
        }
        if !self.users.has_user(payload.owner()) {
            return Err(CreationError::OwnerNotFound);
        }
        let node = self
            .nodes
            .get_node_mut(payload.node())
            .ok_or(CreationError::NodeNotFound)?;
        self.servers.create(payload, node).await
    }
}

impl From<SubmitError> for AdminError {
    fn from(error: SubmitError) -> Self {
        match error {
            SubmitError::Validation(_) | SubmitError::NameTooLong => {
                AdminError::Invalid(error.to_string())
            }
            _ => AdminError::Precondition(error.to_string()),
        }
    }
}
