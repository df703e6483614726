//! The Riskfield engine ties the physics together.
//!
//! Flow per the architecture: collaborator → event ingest → state store
//! (decay + event) → graph propagator → classifier → ledger append on actual
//! transition → access gateway → collaborator. The engine owns the
//! concurrency model: per-entity mutation runs in parallel across entities,
//! ticks and propagation passes quiesce mutation for a consistent snapshot,
//! and ledger appends are linearized through one path.

pub mod engine;
pub mod error;

pub use engine::Engine;
pub use error::EngineError;

pub use riskfield_config::DomainConfig;
pub use riskfield_gateway::{AccessTier, TierView};
pub use riskfield_ledger::{LedgerRecord, ReplayedEntity};
pub use riskfield_types::{
    EdgeId, EntityId, EventId, GateState, Hash32, RiskEvent, RiskSnapshot, TopologyChange,
    TransitionNotice,
};
