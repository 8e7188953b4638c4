use std::fmt::{Display, Formatter};

use super::{ports::PortSet, variables::PortSlot};

/// Advisory shown for assignment slots while the port pool is empty.
pub const ASSIGNMENTS_DISABLED_HINT: &str = "Ports must be added before they can be assigned";

/// One to one binding of port bound variables to ports from the pool.
#[derive(Default)]
pub struct Assignments {
    entries: Vec<Assignment>,
}

pub struct Assignment {
    variable: String,
    port: Option<u16>,
}

impl Assignment {
    pub fn variable(&self) -> &str {
        &self.variable
    }
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl Assignments {
    /// Seeds one slot per port bound variable. A slot starts out bound to
    /// its own default port when the pool holds it and no earlier sibling
    /// already took it, otherwise it starts unset.
    pub fn reset(slots: &[PortSlot], pool: &PortSet) -> Self {
        let mut entries: Vec<Assignment> = Vec::new();
        for slot in slots {
            let port = slot
                .default()
                .and_then(|default| u16::try_from(default).ok())
                .filter(|port| pool.contains(*port))
                .filter(|port| !entries.iter().any(|entry| entry.port == Some(*port)));
            entries.push(Assignment {
                variable: slot.variable().to_string(),
                port,
            });
        }
        Self { entries }
    }

    /// Binds a slot to a port or unsets it.
    ///
    /// # Errors
    ///
    /// Fails while the pool is empty (the slot is disabled), for unknown
    /// slots, for ports outside the pool and for ports a sibling slot
    /// already uses.
    pub fn assign(
        &mut self,
        variable: &str,
        port: Option<u16>,
        pool: &PortSet,
    ) -> Result<(), AssignError> {
        if pool.is_empty() {
            return Err(AssignError::Disabled);
        }
        let index = self
            .entries
            .iter()
            .position(|entry| entry.variable == variable)
            .ok_or_else(|| AssignError::UnknownSlot(variable.to_string()))?;

        if let Some(port) = port {
            if !pool.contains(port) {
                return Err(AssignError::NotInPool(port));
            }
            if self
                .entries
                .iter()
                .enumerate()
                .any(|(sibling, entry)| sibling != index && entry.port == Some(port))
            {
                return Err(AssignError::AlreadyAssigned(port));
            }
        }

        self.entries[index].port = port;
        Ok(())
    }

    /// View of the bindings with stale ports treated as unset. Ports leave
    /// the pool without touching the stored bindings, so staleness is
    /// resolved at read time.
    pub fn effective(&self, pool: &PortSet) -> Vec<(&str, Option<u16>)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.variable.as_str(),
                    entry.port.filter(|port| pool.contains(*port)),
                )
            })
            .collect()
    }

    /// Unsets every stale binding and returns the affected variables. Runs
    /// as part of the validation pass before submission.
    pub fn sweep(&mut self, pool: &PortSet) -> Vec<String> {
        let mut swept = Vec::new();
        for entry in &mut self.entries {
            if let Some(port) = entry.port {
                if !pool.contains(port) {
                    entry.port = None;
                    swept.push(entry.variable.clone());
                }
            }
        }
        swept
    }

    pub fn get(&self, variable: &str) -> Option<Option<u16>> {
        self.entries
            .iter()
            .find(|entry| entry.variable == variable)
            .map(|entry| entry.port)
    }

    pub fn entries(&self) -> &[Assignment] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub enum AssignError {
    Disabled,
    UnknownSlot(String),
    NotInPool(u16),
    AlreadyAssigned(u16),
}

impl Display for AssignError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignError::Disabled => write!(formatter, "{}", ASSIGNMENTS_DISABLED_HINT),
            AssignError::UnknownSlot(variable) => {
                write!(formatter, "There is no port assignment for {}", variable)
            }
            AssignError::NotInPool(port) => {
                write!(formatter, "Port {} is not part of the port pool", port)
            }
            AssignError::AlreadyAssigned(port) => {
                write!(formatter, "Port {} is already assigned", port)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::{
        draft::{ports::PortSet, variables::ResolvedVariables},
        egg::{Egg, VariableDefinition},
    };

    use super::{AssignError, Assignments};

    fn slots() -> ResolvedVariables {
        let egg = Egg::new(
            "Egg",
            "",
            "./start {{SERVER_PORT}}",
            Vec::new(),
            vec![VariableDefinition::new("QUERY_PORT", "25566", "port", 1, "")],
        );
        ResolvedVariables::resolve(&egg, egg.startup())
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn reset_binds_defaults_and_leaves_synthetic_unset() {
        let resolved = slots();
        let pool = PortSet::seed(&resolved.default_ports());
        let assignments = Assignments::reset(resolved.port_slots(), &pool);

        assert_eq!(assignments.get("SERVER_PORT"), Some(None));
        assert_eq!(assignments.get("QUERY_PORT"), Some(Some(25566)));
    }

    #[test]
    fn duplicate_defaults_leave_later_slots_unset() {
        let egg = Egg::new(
            "Egg",
            "",
            "run",
            Vec::new(),
            vec![
                VariableDefinition::new("GAME_PORT", "25565", "port", 1, ""),
                VariableDefinition::new("QUERY_PORT", "25565", "port", 2, ""),
            ],
        );
        let resolved = ResolvedVariables::resolve(&egg, egg.startup());
        let pool = PortSet::seed(&resolved.default_ports());
        let assignments = Assignments::reset(resolved.port_slots(), &pool);

        assert_eq!(assignments.get("GAME_PORT"), Some(Some(25565)));
        assert_eq!(assignments.get("QUERY_PORT"), Some(None));
    }

    #[test]
    fn a_port_can_only_back_one_slot() {
        let resolved = slots();
        let pool = PortSet::parse(&tokens(&["25565", "25566"]));
        let mut assignments = Assignments::reset(resolved.port_slots(), &pool);

        assert!(assignments
            .assign("SERVER_PORT", Some(25565), &pool)
            .is_ok());
        assert!(matches!(
            assignments.assign("QUERY_PORT", Some(25565), &pool),
            Err(AssignError::AlreadyAssigned(25565))
        ));

        // Re-assigning the same slot to its own port is fine
        assert!(assignments
            .assign("SERVER_PORT", Some(25565), &pool)
            .is_ok());
    }

    #[test]
    fn slots_are_disabled_while_the_pool_is_empty() {
        let resolved = slots();
        let pool = PortSet::default();
        let mut assignments = Assignments::reset(resolved.port_slots(), &pool);

        assert!(matches!(
            assignments.assign("SERVER_PORT", Some(25565), &pool),
            Err(AssignError::Disabled)
        ));
    }

    #[test]
    fn ports_outside_the_pool_are_rejected() {
        let resolved = slots();
        let pool = PortSet::parse(&tokens(&["25565"]));
        let mut assignments = Assignments::reset(resolved.port_slots(), &pool);

        assert!(matches!(
            assignments.assign("SERVER_PORT", Some(8080), &pool),
            Err(AssignError::NotInPool(8080))
        ));
    }

    #[test]
    fn stale_bindings_count_as_unset() {
        let resolved = slots();
        let pool = PortSet::parse(&tokens(&["25565", "25566"]));
        let mut assignments = Assignments::reset(resolved.port_slots(), &pool);
        assignments
            .assign("SERVER_PORT", Some(25565), &pool)
            .unwrap();

        // The user removes 25565 from the port tokens
        let shrunk = PortSet::parse(&tokens(&["25566"]));
        let effective = assignments.effective(&shrunk);
        assert_eq!(effective[0], ("SERVER_PORT", None));

        let swept = assignments.sweep(&shrunk);
        assert_eq!(swept, vec!["SERVER_PORT".to_string()]);
        assert_eq!(assignments.get("SERVER_PORT"), Some(None));
    }
}
