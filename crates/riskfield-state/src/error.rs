use riskfield_types::EntityId;
use thiserror::Error;

/// Errors from state-vector mutation. Everything here is per-request: a
/// rejected input leaves the vector untouched.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("stale event for {entity_id}: submitted {submitted} precedes last applied {last_applied}")]
    StaleEvent {
        entity_id: EntityId,
        last_applied: u64,
        submitted: u64,
    },

    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("entity already registered: {0}")]
    DuplicateEntity(EntityId),

    #[error("lock poisoned")]
    Lock,
}
