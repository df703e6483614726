use serde::{Deserialize, Serialize};

/// Ordered severity classification derived from the aggregate risk score.
///
/// The order is total: `Safe < Warning < Critical < Irreversible`. All
/// transitions may move up or down except that `Irreversible` is terminal;
/// that asymmetry is enforced by the gate state machine, not by callers.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum GateState {
    Safe,
    Warning,
    Critical,
    Irreversible,
}

impl GateState {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::Irreversible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateState::Safe => "SAFE",
            GateState::Warning => "WARNING",
            GateState::Critical => "CRITICAL",
            GateState::Irreversible => "IRREVERSIBLE",
        }
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order() {
        assert!(GateState::Safe < GateState::Warning);
        assert!(GateState::Warning < GateState::Critical);
        assert!(GateState::Critical < GateState::Irreversible);
    }

    #[test]
    fn only_irreversible_is_terminal() {
        assert!(GateState::Irreversible.is_terminal());
        assert!(!GateState::Safe.is_terminal());
        assert!(!GateState::Warning.is_terminal());
        assert!(!GateState::Critical.is_terminal());
    }

    #[test]
    fn display_labels() {
        assert_eq!(GateState::Irreversible.to_string(), "IRREVERSIBLE");
        assert_eq!(GateState::Safe.to_string(), "SAFE");
    }
}
