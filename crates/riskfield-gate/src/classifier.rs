use riskfield_config::{GateThresholds, ScoreWeights};
use riskfield_types::GateState;

/// Weighted combination of mean per-dimension risk and propagated pressure.
/// The score is unbounded above; crossing the irreversible threshold is what
/// matters, not saturation.
pub fn aggregate_score(mean_risk: f64, pressure: f64, weights: &ScoreWeights) -> f64 {
    weights.risk * mean_risk + weights.pressure * pressure
}

/// Map an aggregate score onto the ordered gate states.
pub fn classify(score: f64, thresholds: &GateThresholds) -> GateState {
    if score < thresholds.warning {
        GateState::Safe
    } else if score < thresholds.critical {
        GateState::Warning
    } else if score < thresholds.irreversible {
        GateState::Critical
    } else {
        GateState::Irreversible
    }
}
