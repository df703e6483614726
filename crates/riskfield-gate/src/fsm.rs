use serde::{Deserialize, Serialize};
use tracing::info;

use riskfield_types::GateState;

use crate::error::GateError;

/// One entity's gate cell: the current state plus the terminal-state policy.
///
/// Invariant: once the cell reads `Irreversible` it never changes again.
/// There is no administrative downgrade path; attempts surface
/// `ForbiddenTransition` rather than silently holding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateCell {
    current: GateState,
}

impl GateCell {
    pub fn new() -> Self {
        Self {
            current: GateState::Safe,
        }
    }

    pub fn current(&self) -> GateState {
        self.current
    }

    /// Move to `target`. Returns the `(from, to)` pair when the state
    /// actually changed, `None` when re-evaluation landed on the same state
    /// (a no-op: no ledger record, no notification).
    pub fn transition(
        &mut self,
        target: GateState,
    ) -> Result<Option<(GateState, GateState)>, GateError> {
        if target == self.current {
            return Ok(None);
        }
        if self.current.is_terminal() {
            return Err(GateError::ForbiddenTransition {
                from: self.current,
                to: target,
            });
        }
        let from = self.current;
        self.current = target;
        info!(%from, to = %target, "Gate transition");
        Ok(Some((from, target)))
    }
}

impl Default for GateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_safe() {
        assert_eq!(GateCell::new().current(), GateState::Safe);
    }

    #[test]
    fn moves_up_and_down_freely_below_terminal() {
        let mut cell = GateCell::new();
        assert!(cell.transition(GateState::Critical).unwrap().is_some());
        assert!(cell.transition(GateState::Warning).unwrap().is_some());
        assert!(cell.transition(GateState::Safe).unwrap().is_some());
        assert_eq!(cell.current(), GateState::Safe);
    }

    #[test]
    fn same_state_is_a_noop() {
        let mut cell = GateCell::new();
        assert_eq!(cell.transition(GateState::Safe).unwrap(), None);
        cell.transition(GateState::Warning).unwrap();
        assert_eq!(cell.transition(GateState::Warning).unwrap(), None);
    }

    #[test]
    fn irreversible_is_terminal() {
        let mut cell = GateCell::new();
        let (from, to) = cell
            .transition(GateState::Irreversible)
            .unwrap()
            .unwrap();
        assert_eq!((from, to), (GateState::Safe, GateState::Irreversible));

        for target in [GateState::Safe, GateState::Warning, GateState::Critical] {
            assert!(matches!(
                cell.transition(target),
                Err(GateError::ForbiddenTransition { .. })
            ));
            assert_eq!(cell.current(), GateState::Irreversible);
        }
        // Re-evaluating to the terminal state remains a no-op, not an error.
        assert_eq!(cell.transition(GateState::Irreversible).unwrap(), None);
    }

    proptest! {
        #[test]
        fn no_sequence_escapes_terminal(targets in proptest::collection::vec(0u8..4, 1..50)) {
            let mut cell = GateCell::new();
            cell.transition(GateState::Irreversible).unwrap();
            for t in targets {
                let target = match t {
                    0 => GateState::Safe,
                    1 => GateState::Warning,
                    2 => GateState::Critical,
                    _ => GateState::Irreversible,
                };
                let _ = cell.transition(target);
                prop_assert_eq!(cell.current(), GateState::Irreversible);
            }
        }
    }
}
