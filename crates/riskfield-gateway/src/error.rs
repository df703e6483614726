use thiserror::Error;

use crate::AccessTier;

/// Authorization failures at the query boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("tier {actual:?} may not perform an operation requiring {required:?}")]
    Forbidden {
        required: AccessTier,
        actual: AccessTier,
    },
}
