use riskfield_types::GateState;
use thiserror::Error;

/// Gate policy violations. Distinct from input validation: a forbidden
/// transition is a well-formed request the policy refuses.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("forbidden transition: {from} is terminal, cannot move to {to}")]
    ForbiddenTransition { from: GateState, to: GateState },
}
