use riskfield_types::EdgeId;
use thiserror::Error;

/// Errors from the topology table and the diffusion pass.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid topology change: {0}")]
    Validation(String),

    #[error("unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("propagation would not converge: {0}")]
    NonConvergence(String),
}
