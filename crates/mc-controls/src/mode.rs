//! Operating modes and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supervisory operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Arming: carrier configured, regulator reset. Initial mode.
    #[default]
    Initializing,
    /// Actuator held at zero duty.
    Stopped,
    /// Regulator drives the actuator.
    Running,
    /// Actuator held at zero duty until an explicit re-arm.
    Faulted,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Initializing => write!(f, "Initializing"),
            OperatingMode::Stopped => write!(f, "Stopped"),
            OperatingMode::Running => write!(f, "Running"),
            OperatingMode::Faulted => write!(f, "Faulted"),
        }
    }
}

/// How the table treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRule {
    Allow,
    /// Allowed, but already there.
    NoOp,
    Reject,
}

impl OperatingMode {
    /// Look up `self -> target` in the transition table.
    pub fn rule_to(self, target: OperatingMode) -> TransitionRule {
        use OperatingMode::*;
        use TransitionRule::*;

        match (self, target) {
            (Initializing, Running) => Allow,
            (Initializing, Stopped) => Reject,
            (Initializing, Faulted) => Allow,
            (Initializing, Initializing) => NoOp,

            (Stopped, Running) => Allow,
            (Stopped, Stopped) => Reject,
            (Stopped, Faulted) => Allow,
            (Stopped, Initializing) => Allow,

            (Running, Running) => Reject,
            (Running, Stopped) => Allow,
            (Running, Faulted) => Allow,
            (Running, Initializing) => Allow,

            (Faulted, Running) => Reject,
            (Faulted, Stopped) => Reject,
            (Faulted, Faulted) => NoOp,
            (Faulted, Initializing) => Allow,
        }
    }
}

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed {
        from: OperatingMode,
        to: OperatingMode,
    },
    Unchanged(OperatingMode),
    Rejected {
        from: OperatingMode,
        requested: OperatingMode,
    },
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperatingMode::*;

    const ALL: [OperatingMode; 4] = [Initializing, Stopped, Running, Faulted];

    #[test]
    fn faulted_only_exits_through_initializing() {
        for target in ALL {
            let rule = Faulted.rule_to(target);
            match target {
                Initializing => assert_eq!(rule, TransitionRule::Allow),
                Faulted => assert_eq!(rule, TransitionRule::NoOp),
                _ => assert_eq!(rule, TransitionRule::Reject),
            }
        }
    }

    #[test]
    fn fault_reachable_from_everywhere() {
        for from in ALL {
            assert_ne!(from.rule_to(Faulted), TransitionRule::Reject);
        }
    }

    #[test]
    fn stop_only_from_running() {
        for from in ALL {
            let expected = if from == Running {
                TransitionRule::Allow
            } else {
                TransitionRule::Reject
            };
            assert_eq!(from.rule_to(Stopped), expected);
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(Running.to_string(), "Running");
        assert_eq!(OperatingMode::default(), Initializing);
    }
}
