use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use riskfield_config::DomainConfig;
use riskfield_types::RiskEvent;

use crate::error::StateError;

/// Per-entity mapping of dimension name to a value in `[0, 1]`.
///
/// Invariant: every value is clamped to `[0, 1]` after every mutation, and
/// the dimension set is exactly the configured one for the vector's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    values: BTreeMap<String, f64>,
}

impl StateVector {
    /// A fresh vector starts fully healthy: 1.0 in every configured
    /// dimension (risk 0).
    pub fn new(config: &DomainConfig) -> Self {
        Self {
            values: config
                .dimension_names()
                .map(|name| (name.to_string(), 1.0))
                .collect(),
        }
    }

    pub fn value(&self, dimension: &str) -> Option<f64> {
        self.values.get(dimension).copied()
    }

    /// Per-dimension risk, `1 - value`.
    pub fn risks(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(name, v)| (name.clone(), 1.0 - v))
            .collect()
    }

    /// Pressure scalar fed to the graph propagator: `1 - mean(values)`.
    pub fn pressure(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.values.values().sum::<f64>() / self.values.len() as f64;
        1.0 - mean
    }

    /// Advance the vector by `dt` ticks of half-life recovery.
    ///
    /// Per dimension: `λ = ln2 / half_life`, `recovery = (1 - v)(1 - e^(-λ·dt))`.
    /// Idempotent at `dt = 0`; negative `dt` is a validation failure.
    pub fn advance(&mut self, config: &DomainConfig, dt: f64) -> Result<(), StateError> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(StateError::Validation(format!(
                "dt must be non-negative and finite, got {}",
                dt
            )));
        }
        if dt == 0.0 {
            return Ok(());
        }
        for dim in &config.dimensions {
            if let Some(v) = self.values.get_mut(&dim.name) {
                let lambda = std::f64::consts::LN_2 / dim.half_life;
                let recovery = (1.0 - *v) * (1.0 - (-lambda * dt).exp());
                *v = (*v + recovery).clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    /// Apply one event across every dimension its category touches.
    ///
    /// Application is all-or-nothing: the full delta set is computed and
    /// validated before any dimension mutates, so a malformed event leaves
    /// the vector byte-identical.
    pub fn apply_event(
        &mut self,
        config: &DomainConfig,
        event: &RiskEvent,
    ) -> Result<(), StateError> {
        let deltas = self.compute_deltas(config, event)?;
        for (dimension, delta) in deltas {
            let v = self
                .values
                .get_mut(&dimension)
                .ok_or_else(|| StateError::Validation(format!("unknown dimension '{}'", dimension)))?;
            *v = (*v + delta).clamp(0.0, 1.0);
        }
        Ok(())
    }

    /// Validate the event against its category schema and compute the
    /// effective per-dimension deltas without mutating anything.
    fn compute_deltas(
        &self,
        config: &DomainConfig,
        event: &RiskEvent,
    ) -> Result<Vec<(String, f64)>, StateError> {
        if !(event.magnitude >= 0.0 && event.magnitude.is_finite()) {
            return Err(StateError::Validation(format!(
                "magnitude must be non-negative and finite, got {}",
                event.magnitude
            )));
        }
        if !(0.0..=1.0).contains(&event.confidence) {
            return Err(StateError::Validation(format!(
                "confidence must be in [0, 1], got {}",
                event.confidence
            )));
        }
        let schema = config.category(&event.category).ok_or_else(|| {
            StateError::Validation(format!("unknown event category '{}'", event.category))
        })?;
        for dimension in event.weights.keys() {
            if !schema.weights.contains_key(dimension) {
                return Err(StateError::Validation(format!(
                    "weight override for '{}' is outside category '{}' schema",
                    dimension, event.category
                )));
            }
        }

        let friction = 1.0 - event.confidence;
        let impact =
            1.0 + event.magnitude.max(1.0).log10() * config.impact_coefficient;

        let mut deltas = Vec::with_capacity(schema.weights.len());
        for (dimension, schema_weight) in &schema.weights {
            let weight = event.weights.get(dimension).copied().unwrap_or(*schema_weight);
            if !weight.is_finite() {
                return Err(StateError::Validation(format!(
                    "weight for '{}' must be finite",
                    dimension
                )));
            }
            let inertia = config
                .dimension(dimension)
                .map(|d| d.inertia)
                .ok_or_else(|| {
                    StateError::Validation(format!("unknown dimension '{}'", dimension))
                })?;
            let delta =
                schema.base_delta * weight * (1.0 - friction * 0.5) * (1.0 - inertia) * impact;
            deltas.push((dimension.clone(), delta));
        }
        Ok(deltas)
    }
}
