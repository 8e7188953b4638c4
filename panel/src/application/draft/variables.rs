use crate::application::egg::{Egg, VariableDefinition};

use super::rules::VariableInputKind;

/// Synthetic port slot that exists whenever the startup command references
/// it, even if the egg defines no variable with this name.
pub const SERVER_PORT_VARIABLE: &str = "SERVER_PORT";

/// The variables of an egg, split by how provisioning treats them.
///
/// Port bound variables become assignment slots fed from the port pool,
/// everything else is a free variable edited through the variable form.
#[derive(Default)]
pub struct ResolvedVariables {
    port_slots: Vec<PortSlot>,
    free: Vec<FreeVariable>,
}

pub struct PortSlot {
    variable: String,
    default: Option<u32>,
}

impl PortSlot {
    pub fn variable(&self) -> &str {
        &self.variable
    }
    pub fn default(&self) -> Option<u32> {
        self.default
    }
}

pub struct FreeVariable {
    definition: VariableDefinition,
    kind: VariableInputKind,
}

impl FreeVariable {
    pub fn definition(&self) -> &VariableDefinition {
        &self.definition
    }
    pub fn kind(&self) -> &VariableInputKind {
        &self.kind
    }
}

impl ResolvedVariables {
    /// Recomputed whenever the egg selection changes or the startup command
    /// is edited.
    pub fn resolve(egg: &Egg, startup: &str) -> Self {
        let mut port_slots: Vec<PortSlot> = Vec::new();
        if startup.contains(&format!("{{{{{}}}}}", SERVER_PORT_VARIABLE)) {
            port_slots.push(PortSlot {
                variable: SERVER_PORT_VARIABLE.to_string(),
                default: None,
            });
        }

        let mut free = Vec::new();
        for definition in egg.variables() {
            if definition.is_port_bound() {
                let default = definition.default_value().trim().parse::<u32>().ok();
                match port_slots
                    .iter_mut()
                    .find(|slot| slot.variable == *definition.env_variable())
                {
                    Some(slot) => slot.default = default,
                    None => port_slots.push(PortSlot {
                        variable: definition.env_variable().clone(),
                        default,
                    }),
                }
            } else {
                free.push(FreeVariable {
                    kind: VariableInputKind::resolve(definition.rules()),
                    definition: definition.clone(),
                });
            }
        }
        free.sort_by_key(|variable| variable.definition.sort());

        Self { port_slots, free }
    }

    /// Ordered default ports of all port bound variables, used to seed the
    /// port pool.
    pub fn default_ports(&self) -> Vec<u32> {
        self.port_slots
            .iter()
            .filter_map(|slot| slot.default)
            .collect()
    }

    pub fn port_slots(&self) -> &[PortSlot] {
        &self.port_slots
    }

    pub fn free_variables(&self) -> &[FreeVariable] {
        &self.free
    }

    pub fn find_free(&self, env_variable: &str) -> Option<&FreeVariable> {
        self.free
            .iter()
            .find(|variable| variable.definition.env_variable() == env_variable)
    }
}
