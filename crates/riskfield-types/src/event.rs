use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, EntityId, EventId};

/// An immutable business event submitted by a collaborator or a scheduled
/// tick. Timestamps are logical milliseconds supplied by the caller; the
/// engine never consults a wall clock for physics.
///
/// `weights` optionally overrides the per-dimension weights declared by the
/// category schema in configuration. Keys are dimension names; a `BTreeMap`
/// keeps serialization (and therefore payload hashing) deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub id: EventId,
    pub entity_id: EntityId,
    pub category: String,
    pub magnitude: f64,
    pub confidence: f64,
    pub timestamp: u64,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

impl RiskEvent {
    pub fn new(entity_id: EntityId, category: impl Into<String>, timestamp: u64) -> Self {
        Self {
            id: EventId::new(),
            entity_id,
            category: category.into(),
            magnitude: 0.0,
            confidence: 1.0,
            timestamp,
            weights: BTreeMap::new(),
        }
    }

    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_weight(mut self, dimension: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(dimension.into(), weight);
        self
    }
}

/// A topology mutation. Topology is itself event-sourced: every change is
/// ledgered before the edge table is touched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TopologyChange {
    AddEdge {
        edge_id: EdgeId,
        from: EntityId,
        to: EntityId,
        weight: f64,
        timestamp: u64,
    },
    RemoveEdge {
        edge_id: EdgeId,
        timestamp: u64,
    },
    ReweightEdge {
        edge_id: EdgeId,
        weight: f64,
        timestamp: u64,
    },
}

impl TopologyChange {
    pub fn timestamp(&self) -> u64 {
        match self {
            TopologyChange::AddEdge { timestamp, .. }
            | TopologyChange::RemoveEdge { timestamp, .. }
            | TopologyChange::ReweightEdge { timestamp, .. } => *timestamp,
        }
    }

    pub fn edge_id(&self) -> &EdgeId {
        match self {
            TopologyChange::AddEdge { edge_id, .. }
            | TopologyChange::RemoveEdge { edge_id, .. }
            | TopologyChange::ReweightEdge { edge_id, .. } => edge_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let e = RiskEvent::new(EntityId::new(), "payment_failure", 1000);
        assert_eq!(e.magnitude, 0.0);
        assert_eq!(e.confidence, 1.0);
        assert!(e.weights.is_empty());
    }

    #[test]
    fn event_serde_roundtrip() {
        let e = RiskEvent::new(EntityId::new(), "chargeback", 42)
            .with_magnitude(250_000.0)
            .with_confidence(0.92)
            .with_weight("liquidity", 0.4);
        let json = serde_json::to_string(&e).unwrap();
        let restored: RiskEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(e, restored);
    }

    #[test]
    fn topology_change_accessors() {
        let id = EdgeId::new();
        let c = TopologyChange::ReweightEdge {
            edge_id: id.clone(),
            weight: 0.5,
            timestamp: 7,
        };
        assert_eq!(c.timestamp(), 7);
        assert_eq!(c.edge_id(), &id);
    }

    #[test]
    fn weights_serialize_in_dimension_order() {
        let e = RiskEvent::new(EntityId::new(), "outage", 1)
            .with_weight("z_dim", 0.1)
            .with_weight("a_dim", 0.2);
        let json = serde_json::to_string(&e.weights).unwrap();
        assert!(json.find("a_dim").unwrap() < json.find("z_dim").unwrap());
    }
}
