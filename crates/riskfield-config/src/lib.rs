//! Versioned domain configuration.
//!
//! Every domain-specific constant lives here (dimension names, half-lives,
//! inertia, category schemas, gate thresholds, diffusion damping, velocity
//! smoothing) so the same engine serves multiple risk domains without code
//! changes. Configuration is loaded once, validated eagerly, and treated as
//! immutable afterwards.

pub mod error;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use riskfield_types::GateState;

pub use error::ConfigError;

/// Immutable metadata for one dimension of the state vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    /// Ticks for the dimension to recover half the distance to 1.0.
    pub half_life: f64,
    /// Resistance to event impact, in `[0, 1)`. 0 means fully responsive.
    pub inertia: f64,
}

/// Closed schema for one event category: its base delta and the dimensions
/// it is required to touch. Events may override individual weights but a
/// category with no schema is rejected outright.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySchema {
    pub base_delta: f64,
    /// Required per-dimension weights, keyed by dimension name.
    pub weights: BTreeMap<String, f64>,
}

/// Classification thresholds. Scores below `warning` are SAFE; at or above
/// `irreversible` the gate crosses the point of no return.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub warning: f64,
    pub critical: f64,
    pub irreversible: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            warning: 0.4,
            critical: 0.7,
            irreversible: 1.0,
        }
    }
}

/// Weights for combining mean dimension risk with propagated pressure into
/// the aggregate score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub risk: f64,
    pub pressure: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            risk: 0.7,
            pressure: 0.3,
        }
    }
}

fn default_impact_coefficient() -> f64 {
    0.1
}

fn default_velocity_smoothing() -> f64 {
    0.5
}

/// The complete, versioned configuration for one risk domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Version label surfaced in every snapshot so replays can assert they
    /// ran under the same configuration.
    pub version: String,
    pub dimensions: Vec<DimensionSpec>,
    pub categories: BTreeMap<String, CategorySchema>,
    /// `k` in `impact_multiplier = 1 + log10(max(1, magnitude)) * k`.
    #[serde(default = "default_impact_coefficient")]
    pub impact_coefficient: f64,
    #[serde(default)]
    pub thresholds: GateThresholds,
    /// Diffusion damping α, in `(0, 1)`. Validated against the live topology
    /// before any propagation pass runs.
    pub damping: f64,
    #[serde(default)]
    pub score_weights: ScoreWeights,
    /// EMA factor β for the point-of-no-return velocity estimate, in `(0, 1]`.
    #[serde(default = "default_velocity_smoothing")]
    pub velocity_smoothing: f64,
    /// Optional per-gate-state operator hints surfaced to the lowest access
    /// tier. Missing states fall back to built-in wording.
    #[serde(default)]
    pub hints: BTreeMap<String, String>,
}

impl DomainConfig {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: DomainConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        info!(version = %config.version, dimensions = config.dimensions.len(), "Loaded domain configuration");
        Ok(config)
    }

    /// Parse and validate a configuration from a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&raw)
    }

    /// Eager structural validation. Failures here are configuration bugs and
    /// abort startup before any entity state exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid("version must be non-empty".into()));
        }
        if self.dimensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one dimension is required".into(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for dim in &self.dimensions {
            if !seen.insert(dim.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
            if !(dim.half_life > 0.0 && dim.half_life.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "dimension '{}': half_life must be positive and finite",
                    dim.name
                )));
            }
            if !(0.0..1.0).contains(&dim.inertia) {
                return Err(ConfigError::Invalid(format!(
                    "dimension '{}': inertia must be in [0, 1)",
                    dim.name
                )));
            }
        }
        for (category, schema) in &self.categories {
            if schema.weights.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "category '{}': weight schema must not be empty",
                    category
                )));
            }
            if !schema.base_delta.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "category '{}': base_delta must be finite",
                    category
                )));
            }
            for dim in schema.weights.keys() {
                if !seen.contains(dim.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "category '{}' references unknown dimension '{}'",
                        category, dim
                    )));
                }
            }
        }
        if !(self.impact_coefficient >= 0.0 && self.impact_coefficient.is_finite()) {
            return Err(ConfigError::Invalid(
                "impact_coefficient must be non-negative and finite".into(),
            ));
        }
        let t = &self.thresholds;
        if !(t.warning < t.critical && t.critical < t.irreversible) {
            return Err(ConfigError::Invalid(
                "thresholds must be strictly increasing: warning < critical < irreversible".into(),
            ));
        }
        if !(0.0 < self.damping && self.damping < 1.0) {
            return Err(ConfigError::Invalid("damping must be in (0, 1)".into()));
        }
        let w = &self.score_weights;
        if w.risk < 0.0 || w.pressure < 0.0 || w.risk + w.pressure <= 0.0 {
            return Err(ConfigError::Invalid(
                "score_weights must be non-negative with a positive sum".into(),
            ));
        }
        if !(0.0 < self.velocity_smoothing && self.velocity_smoothing <= 1.0) {
            return Err(ConfigError::Invalid(
                "velocity_smoothing must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn dimension(&self, name: &str) -> Option<&DimensionSpec> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(|d| d.name.as_str())
    }

    pub fn category(&self, name: &str) -> Option<&CategorySchema> {
        self.categories.get(name)
    }

    /// Operator guidance for the lowest access tier.
    pub fn next_action_hint(&self, state: GateState) -> &str {
        if let Some(hint) = self.hints.get(state.as_str()) {
            return hint;
        }
        match state {
            GateState::Safe => "no action required",
            GateState::Warning => "review recent events for this entity",
            GateState::Critical => "escalate: intervention window is closing",
            GateState::Irreversible => "audit only: the crossing is terminal",
        }
    }
}
