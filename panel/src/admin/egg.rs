use anyhow::Result;
use async_trait::async_trait;

use crate::{
    application::{
        draft::rules::VariableInputKind,
        egg::{Egg, VariableDefinition},
        Panel,
    },
    task::{BoxedAny, GenericTask},
};

use super::{AdminError, AdminTask};

pub struct GetEggsTask;
pub struct GetEggTask(pub String);

pub struct EggSummary {
    pub name: String,
    pub description: String,
    pub variables: usize,
}

pub struct EggDetail {
    pub name: String,
    pub description: String,
    pub startup: String,
    pub docker_images: Vec<String>,
    pub variables: Vec<VariableDetail>,
}

pub struct VariableDetail {
    pub env_variable: String,
    pub description: String,
    pub rules: String,
    pub default_value: String,
    pub port_bound: bool,
    /// The closed value set for enumeration variables, `None` for free
    /// form text.
    pub options: Option<Vec<String>>,
}

#[async_trait]
impl GenericTask for GetEggsTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let mut eggs = panel
            .eggs
            .get_eggs()
            .iter()
            .map(|egg| EggSummary::from(*egg))
            .collect::<Vec<_>>();
        eggs.sort_by(|left, right| left.name.cmp(&right.name));
        AdminTask::new_ok(eggs)
    }
}

#[async_trait]
impl GenericTask for GetEggTask {
    async fn run(&mut self, panel: &mut Panel) -> Result<BoxedAny> {
        let Some(egg) = panel.eggs.get_egg(&self.0) else {
            return AdminTask::new_err(AdminError::NotFound("Egg not found".to_string()));
        };
        AdminTask::new_ok(EggDetail::from(egg))
    }
}

impl From<&Egg> for EggSummary {
    fn from(egg: &Egg) -> Self {
        Self {
            name: egg.name().clone(),
            description: egg.description().clone(),
            variables: egg.variables().len(),
        }
    }
}

impl From<&Egg> for EggDetail {
    fn from(egg: &Egg) -> Self {
        Self {
            name: egg.name().clone(),
            description: egg.description().clone(),
            startup: egg.startup().clone(),
            docker_images: egg.docker_images().clone(),
            variables: egg.variables().iter().map(VariableDetail::from).collect(),
        }
    }
}

impl From<&VariableDefinition> for VariableDetail {
    fn from(definition: &VariableDefinition) -> Self {
        let options = match VariableInputKind::resolve(definition.rules()) {
            VariableInputKind::Enumeration(values) => Some(values),
            VariableInputKind::Text => None,
        };
        Self {
            env_variable: definition.env_variable().clone(),
            description: definition.description().clone(),
            rules: definition.rules().clone(),
            default_value: definition.default_value().clone(),
            port_bound: definition.is_port_bound(),
            options,
        }
    }
}
