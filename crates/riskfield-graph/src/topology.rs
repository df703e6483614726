use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riskfield_types::{EdgeId, EntityId, TopologyChange};

use crate::error::GraphError;

/// A weighted relation between two entities with a propagation coefficient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub from: EntityId,
    pub to: EntityId,
    pub weight: f64,
}

/// The edge table, keyed by edge id.
///
/// Mutated only through `apply_change` with an already-ledgered
/// `TopologyChange`; the engine read-locks the table for the duration of a
/// propagation pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Topology {
    edges: BTreeMap<EdgeId, GraphEdge>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    pub fn apply_change(&mut self, change: &TopologyChange) -> Result<(), GraphError> {
        match change {
            TopologyChange::AddEdge {
                edge_id,
                from,
                to,
                weight,
                ..
            } => {
                if from == to {
                    return Err(GraphError::Validation("self-edges are not allowed".into()));
                }
                validate_weight(*weight)?;
                if self.edges.contains_key(edge_id) {
                    return Err(GraphError::Validation(format!(
                        "edge {} already exists",
                        edge_id
                    )));
                }
                self.edges.insert(
                    edge_id.clone(),
                    GraphEdge {
                        id: edge_id.clone(),
                        from: from.clone(),
                        to: to.clone(),
                        weight: *weight,
                    },
                );
            }
            TopologyChange::RemoveEdge { edge_id, .. } => {
                self.edges
                    .remove(edge_id)
                    .ok_or_else(|| GraphError::UnknownEdge(edge_id.clone()))?;
            }
            TopologyChange::ReweightEdge {
                edge_id, weight, ..
            } => {
                validate_weight(*weight)?;
                let edge = self
                    .edges
                    .get_mut(edge_id)
                    .ok_or_else(|| GraphError::UnknownEdge(edge_id.clone()))?;
                edge.weight = *weight;
            }
        }
        Ok(())
    }

    /// Sum of incident edge weights per entity. The largest of these bounds
    /// the diffusion operator's spectral radius (Gershgorin).
    pub fn weighted_degrees(&self) -> BTreeMap<EntityId, f64> {
        let mut degrees: BTreeMap<EntityId, f64> = BTreeMap::new();
        for edge in self.edges.values() {
            *degrees.entry(edge.from.clone()).or_insert(0.0) += edge.weight;
            *degrees.entry(edge.to.clone()).or_insert(0.0) += edge.weight;
        }
        degrees
    }

    pub fn max_weighted_degree(&self) -> f64 {
        self.weighted_degrees()
            .values()
            .fold(0.0f64, |acc, d| acc.max(*d))
    }
}

fn validate_weight(weight: f64) -> Result<(), GraphError> {
    if !(weight >= 0.0 && weight.is_finite()) {
        return Err(GraphError::Validation(format!(
            "edge weight must be non-negative and finite, got {}",
            weight
        )));
    }
    Ok(())
}
