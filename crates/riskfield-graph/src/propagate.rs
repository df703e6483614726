use std::collections::BTreeMap;

use tracing::warn;

use riskfield_types::EntityId;

use crate::error::GraphError;
use crate::topology::Topology;

/// Snapshot-based diffusion operator.
///
/// Every pass reads exclusively from the pressure snapshot it was handed —
/// no entity ever observes a neighbor's mid-pass value, and disconnected
/// components propagate independently by construction.
pub struct Propagator {
    alpha: f64,
}

impl Propagator {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Startup-time (and topology-change-time) convergence check:
    /// `α · max_i Σ_j w_ij < 1` keeps the diffusion operator's spectral
    /// radius below 1, which guarantees a fixed point under iteration.
    pub fn validate(&self, topology: &Topology) -> Result<(), GraphError> {
        let degree = topology.max_weighted_degree();
        if self.alpha * degree >= 1.0 {
            return Err(GraphError::NonConvergence(format!(
                "damping {} times max weighted degree {} reaches {:.3}; must stay below 1",
                self.alpha,
                degree,
                self.alpha * degree
            )));
        }
        Ok(())
    }

    /// One diffusion pass: `p'_i = p_i + α·Σ_j w_ij (p_j − p_i)`, all
    /// entities computed from the same snapshot.
    ///
    /// A magnitude guard backs up the startup validation: a pass may never
    /// push any pressure outside the snapshot's own range. A violation means
    /// the operator is diverging and is fatal.
    pub fn pass(
        &self,
        pressures: &BTreeMap<EntityId, f64>,
        topology: &Topology,
    ) -> Result<BTreeMap<EntityId, f64>, GraphError> {
        let mut next = pressures.clone();
        for edge in topology.edges() {
            let (Some(&p_from), Some(&p_to)) =
                (pressures.get(&edge.from), pressures.get(&edge.to))
            else {
                return Err(GraphError::Validation(format!(
                    "edge {} references an entity missing from the snapshot",
                    edge.id
                )));
            };
            let flow = self.alpha * edge.weight * (p_to - p_from);
            if let Some(p) = next.get_mut(&edge.from) {
                *p += flow;
            }
            if let Some(p) = next.get_mut(&edge.to) {
                *p -= flow;
            }
        }

        let bound = pressures
            .values()
            .fold(0.0f64, |acc, p| acc.max(p.abs()));
        for (id, p) in &next {
            if p.abs() > bound + 1e-9 {
                warn!(entity_id = %id, pressure = p, bound, "Diffusion pass exceeded snapshot bound");
                return Err(GraphError::NonConvergence(format!(
                    "pressure for {} grew to {} past snapshot bound {}",
                    id, p, bound
                )));
            }
        }
        Ok(next)
    }
}
