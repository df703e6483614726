//! Access tier gateway.
//!
//! A pure read projection over risk snapshots. Each tier sees a distinct
//! response shape: fields a tier may not read are absent from its variant
//! entirely, never merely nulled or hidden downstream. Enforcement happens
//! here, at the query boundary; ledger verify/replay are additionally gated
//! to the highest tier by `require`.

pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use riskfield_config::DomainConfig;
use riskfield_types::{EntityId, GateState, RiskSnapshot};

pub use error::GatewayError;

/// Ordered authorization tiers. Higher tiers subsume lower ones.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AccessTier {
    /// Sees the current gate state and an operator hint, nothing else.
    Observer,
    /// Adds the numeric risk surface: dimensions, score, pressure, ETA.
    Analyst,
    /// Full snapshot plus the verify/replay surface.
    Auditor,
}

/// Tier-shaped projection of one entity's risk snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TierView {
    Observer {
        entity_id: EntityId,
        gate_state: GateState,
        next_action_hint: String,
    },
    Analyst {
        entity_id: EntityId,
        gate_state: GateState,
        next_action_hint: String,
        dimension_risk: BTreeMap<String, f64>,
        aggregate_score: f64,
        pressure: f64,
        pnr_eta: Option<f64>,
    },
    Auditor {
        snapshot: RiskSnapshot,
        next_action_hint: String,
    },
}

/// Project a snapshot into the caller's tier. Pure; never mutates anything.
pub fn project(tier: AccessTier, snapshot: &RiskSnapshot, config: &DomainConfig) -> TierView {
    let hint = config.next_action_hint(snapshot.gate_state).to_string();
    match tier {
        AccessTier::Observer => TierView::Observer {
            entity_id: snapshot.entity_id.clone(),
            gate_state: snapshot.gate_state,
            next_action_hint: hint,
        },
        AccessTier::Analyst => TierView::Analyst {
            entity_id: snapshot.entity_id.clone(),
            gate_state: snapshot.gate_state,
            next_action_hint: hint,
            dimension_risk: snapshot.dimension_risk.clone(),
            aggregate_score: snapshot.aggregate_score,
            pressure: snapshot.pressure,
            pnr_eta: snapshot.pnr_eta,
        },
        AccessTier::Auditor => TierView::Auditor {
            snapshot: snapshot.clone(),
            next_action_hint: hint,
        },
    }
}

/// Gate an operation on a minimum tier.
pub fn require(actual: AccessTier, required: AccessTier) -> Result<(), GatewayError> {
    if actual < required {
        return Err(GatewayError::Forbidden { required, actual });
    }
    Ok(())
}
