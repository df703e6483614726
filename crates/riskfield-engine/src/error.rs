use thiserror::Error;

use riskfield_gate::GateError;
use riskfield_gateway::GatewayError;
use riskfield_graph::GraphError;
use riskfield_ledger::LedgerError;
use riskfield_state::StateError;
use riskfield_types::EntityId;

/// Engine-level errors. Per-request variants leave global state untouched;
/// only tamper detection and propagation non-convergence are system-fatal.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] riskfield_config::ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    #[error("lock poisoned")]
    Lock,
}
