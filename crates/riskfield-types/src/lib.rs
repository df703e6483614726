//! Shared vocabulary for the Riskfield engine.
//!
//! Strong-typed identifiers, the content hash wrapper, the ordered gate
//! state, and the immutable event/snapshot records exchanged between the
//! physics, graph, ledger, and gateway crates.

pub mod event;
pub mod gate;
pub mod hash;
pub mod ids;
pub mod snapshot;

pub use event::{RiskEvent, TopologyChange};
pub use gate::GateState;
pub use hash::Hash32;
pub use ids::{EdgeId, EntityId, EventId};
pub use snapshot::{RiskSnapshot, TransitionNotice};
