use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::gate::GateState;
use crate::ids::EntityId;

/// Derived view of one entity's risk posture. Recomputed on demand from the
/// state store, the propagated pressure field, and the gate machine; never
/// independently mutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub entity_id: EntityId,
    /// Per-dimension risk, i.e. `1 - value`, keyed by dimension name.
    pub dimension_risk: BTreeMap<String, f64>,
    /// Weighted combination of mean dimension risk and propagated pressure.
    pub aggregate_score: f64,
    pub gate_state: GateState,
    /// Graph-diffused systemic contribution from neighboring entities.
    pub pressure: f64,
    /// Ticks until the irreversible crossing at current velocity. `None`
    /// whenever velocity is non-positive; no countdown is surfaced then.
    pub pnr_eta: Option<f64>,
    /// Version string of the domain configuration this snapshot was computed
    /// under, so replays can assert config parity.
    pub config_version: String,
    /// Logical timestamp of the last applied input for this entity.
    pub timestamp: u64,
}

/// Emitted exactly once per actual gate transition, never per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionNotice {
    pub entity_id: EntityId,
    pub from: GateState,
    pub to: GateState,
    pub aggregate_score: f64,
    /// Set when this transition crossed into the terminal state.
    pub terminal: bool,
    pub timestamp: u64,
}
