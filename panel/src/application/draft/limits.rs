use std::fmt::{Display, Formatter};

use crate::application::server::Resources;

/// Relative block IO weight every server gets. Not exposed in the panel.
pub const IO_WEIGHT: u32 = 500;

/// Swap starts at this many MiB when it is switched to limited.
pub const SWAP_LIMITED_DEFAULT: i64 = 128;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LimitKind {
    Memory,
    Disk,
    Cpu,
}

impl Display for LimitKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::Memory => write!(formatter, "memory"),
            LimitKind::Disk => write!(formatter, "disk"),
            LimitKind::Cpu => write!(formatter, "cpu"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub enum SwapMode {
    Unlimited,
    #[default]
    Disabled,
    Limited,
}

/// One unlimited/limited toggle with its numeric field.
///
/// The stored value and the toggle never disagree: every toggle flip resets
/// the value to 0 and the value can only be edited while limited.
#[derive(Clone, Copy)]
pub struct Limit {
    unlimited: bool,
    value: u32,
}

impl Default for Limit {
    fn default() -> Self {
        Self {
            unlimited: true,
            value: 0,
        }
    }
}

impl Limit {
    pub fn unlimited(&self) -> bool {
        self.unlimited
    }
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Resource limits of a draft, driven by the toggle events of the form.
#[derive(Default)]
pub struct Limits {
    memory: Limit,
    disk: Limit,
    cpu: Limit,

    swap_mode: SwapMode,
    swap: i64,

    oom_kill: bool,
}

impl Limits {
    /// Flipping a toggle always resets the numeric field to 0, in both
    /// directions. A value entered before the flip is not restored.
    pub fn toggle(&mut self, kind: LimitKind, unlimited: bool) {
        let limit = self.limit_mut(kind);
        limit.unlimited = unlimited;
        limit.value = 0;
    }

    /// Sets the numeric field of a limited resource.
    ///
    /// # Errors
    ///
    /// Fails while the resource is unlimited, the field is disabled then.
    pub fn set_value(&mut self, kind: LimitKind, value: u32) -> Result<(), LimitError> {
        let limit = self.limit_mut(kind);
        if limit.unlimited {
            return Err(LimitError::FieldDisabled(kind));
        }
        limit.value = value;
        Ok(())
    }

    /// Entering a swap mode snaps the stored value to the mode's base
    /// value. Only the limited mode allows further edits.
    pub fn set_swap_mode(&mut self, mode: SwapMode) {
        self.swap_mode = mode;
        self.swap = match mode {
            SwapMode::Unlimited => -1,
            SwapMode::Disabled => 0,
            SwapMode::Limited => SWAP_LIMITED_DEFAULT,
        };
    }

    /// # Errors
    ///
    /// Fails while swap is not limited and for values below -1.
    pub fn set_swap(&mut self, value: i64) -> Result<(), LimitError> {
        if self.swap_mode != SwapMode::Limited {
            return Err(LimitError::SwapNotLimited);
        }
        if value < -1 {
            return Err(LimitError::SwapBelowMinimum(value));
        }
        self.swap = value;
        Ok(())
    }

    pub fn set_oom_kill(&mut self, enabled: bool) {
        self.oom_kill = enabled;
    }

    pub fn limit(&self, kind: LimitKind) -> &Limit {
        match kind {
            LimitKind::Memory => &self.memory,
            LimitKind::Disk => &self.disk,
            LimitKind::Cpu => &self.cpu,
        }
    }

    fn limit_mut(&mut self, kind: LimitKind) -> &mut Limit {
        match kind {
            LimitKind::Memory => &mut self.memory,
            LimitKind::Disk => &mut self.disk,
            LimitKind::Cpu => &mut self.cpu,
        }
    }

    pub fn swap_mode(&self) -> SwapMode {
        self.swap_mode
    }
    pub fn swap(&self) -> i64 {
        self.swap
    }
    pub fn oom_kill(&self) -> bool {
        self.oom_kill
    }

    /// The toggle state and the stored value may never disagree.
    pub fn is_consistent(&self) -> bool {
        let toggles = [&self.memory, &self.disk, &self.cpu]
            .iter()
            .all(|limit| !limit.unlimited || limit.value == 0);
        let swap = match self.swap_mode {
            SwapMode::Unlimited => self.swap == -1,
            SwapMode::Disabled => self.swap == 0,
            SwapMode::Limited => self.swap >= -1,
        };
        toggles && swap
    }

    pub fn to_resources(&self) -> Resources {
        Resources::new(
            self.memory.value,
            self.swap,
            self.disk.value,
            self.cpu.value,
            IO_WEIGHT,
            self.oom_kill,
        )
    }
}

#[derive(Debug)]
pub enum LimitError {
    FieldDisabled(LimitKind),
    SwapNotLimited,
    SwapBelowMinimum(i64),
}

impl Display for LimitError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitError::FieldDisabled(kind) => {
                write!(formatter, "The {} limit is set to unlimited", kind)
            }
            LimitError::SwapNotLimited => write!(formatter, "Swap is not set to limited"),
            LimitError::SwapBelowMinimum(value) => {
                write!(formatter, "Swap can not be lower than -1, got {}", value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LimitKind, Limits, SwapMode, IO_WEIGHT, SWAP_LIMITED_DEFAULT};

    #[test]
    fn defaults_are_unlimited_with_swap_disabled() {
        let limits = Limits::default();
        assert!(limits.limit(LimitKind::Memory).unlimited());
        assert_eq!(limits.limit(LimitKind::Memory).value(), 0);
        assert_eq!(limits.swap_mode(), SwapMode::Disabled);
        assert_eq!(limits.swap(), 0);
        assert!(!limits.oom_kill());
        assert!(limits.is_consistent());
    }

    #[test]
    fn toggling_unlimited_resets_the_value() {
        let mut limits = Limits::default();
        limits.toggle(LimitKind::Memory, false);
        limits.set_value(LimitKind::Memory, 4096).unwrap();
        assert_eq!(limits.limit(LimitKind::Memory).value(), 4096);

        limits.toggle(LimitKind::Memory, true);
        assert_eq!(limits.limit(LimitKind::Memory).value(), 0);

        // The old value stays gone after toggling back
        limits.toggle(LimitKind::Memory, false);
        assert_eq!(limits.limit(LimitKind::Memory).value(), 0);
        assert!(limits.is_consistent());
    }

    #[test]
    fn values_are_locked_while_unlimited() {
        let mut limits = Limits::default();
        assert!(limits.set_value(LimitKind::Cpu, 200).is_err());
        limits.toggle(LimitKind::Cpu, false);
        assert!(limits.set_value(LimitKind::Cpu, 200).is_ok());
    }

    #[test]
    fn swap_modes_snap_to_their_base_value() {
        let mut limits = Limits::default();
        limits.set_swap_mode(SwapMode::Unlimited);
        assert_eq!(limits.swap(), -1);
        limits.set_swap_mode(SwapMode::Limited);
        assert_eq!(limits.swap(), SWAP_LIMITED_DEFAULT);
        limits.set_swap_mode(SwapMode::Disabled);
        assert_eq!(limits.swap(), 0);
        assert!(limits.is_consistent());
    }

    #[test]
    fn swap_edits_require_limited_mode() {
        let mut limits = Limits::default();
        assert!(limits.set_swap(256).is_err());
        limits.set_swap_mode(SwapMode::Limited);
        assert!(limits.set_swap(256).is_ok());
        assert!(limits.set_swap(-2).is_err());
        assert!(limits.set_swap(-1).is_ok());
    }

    #[test]
    fn resources_carry_the_io_weight() {
        let mut limits = Limits::default();
        limits.toggle(LimitKind::Memory, false);
        limits.set_value(LimitKind::Memory, 2048).unwrap();
        limits.set_oom_kill(true);

        let resources = limits.to_resources();
        assert_eq!(resources.memory(), 2048);
        assert_eq!(resources.io(), IO_WEIGHT);
        assert!(resources.oom_kill());
        assert_eq!(resources.swap(), 0);
    }
}
