//! Worker lifecycle states.

use std::fmt;

/// Where a worker is in its lifecycle.
///
/// `Parsed -> Installing -> Installed -> Activating -> Activated`; a failed
/// install, or replacement by a newer version, ends in `Redundant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    /// Whether fetches are routed through the worker.
    pub fn is_controlling(self) -> bool {
        self == WorkerState::Activated
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_activated_controls() {
        assert!(WorkerState::Activated.is_controlling());
        assert!(!WorkerState::Installed.is_controlling());
        assert!(!WorkerState::Redundant.is_controlling());
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkerState::Installing.to_string(), "installing");
    }
}
