use serde::{Deserialize, Serialize};

/// Point-of-no-return predictor.
///
/// Tracks an exponentially smoothed velocity of the aggregate score and
/// extrapolates the time remaining until the irreversible threshold. The
/// ETA is derived fresh from the current snapshot on every call and is
/// defined only while the score is rising; a flat or recovering entity has
/// no countdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PnrPredictor {
    beta: f64,
    velocity: f64,
    last_score: Option<f64>,
}

impl PnrPredictor {
    pub fn new(beta: f64) -> Self {
        Self {
            beta,
            velocity: 0.0,
            last_score: None,
        }
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Fold a new aggregate score into the velocity estimate.
    /// `dt` must be positive; a zero-dt observation is ignored.
    pub fn observe(&mut self, score: f64, dt: f64) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        if let Some(last) = self.last_score {
            let raw = (score - last) / dt;
            self.velocity = self.beta * raw + (1.0 - self.beta) * self.velocity;
        }
        self.last_score = Some(score);
    }

    /// Ticks until `score` reaches `irreversible_threshold` at the current
    /// velocity. `None` whenever velocity is non-positive.
    pub fn eta(&self, score: f64, irreversible_threshold: f64) -> Option<f64> {
        if self.velocity <= 0.0 {
            return None;
        }
        Some(((irreversible_threshold - score) / self.velocity).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_eta_before_any_observation() {
        let p = PnrPredictor::new(0.5);
        assert_eq!(p.eta(0.5, 1.0), None);
    }

    #[test]
    fn rising_score_yields_finite_eta() {
        let mut p = PnrPredictor::new(1.0);
        p.observe(0.4, 1.0);
        p.observe(0.5, 1.0);
        // velocity = 0.1 per tick; 0.5 ticks of headroom / 0.1 = 5 ticks.
        let eta = p.eta(0.5, 1.0).unwrap();
        assert!((eta - 5.0).abs() < 1e-9, "eta {}", eta);
    }

    #[test]
    fn recovering_score_has_no_countdown() {
        let mut p = PnrPredictor::new(1.0);
        p.observe(0.8, 1.0);
        p.observe(0.6, 1.0);
        assert!(p.velocity() < 0.0);
        assert_eq!(p.eta(0.6, 1.0), None);
    }

    #[test]
    fn smoothing_dampens_a_spike() {
        let mut smooth = PnrPredictor::new(0.2);
        let mut raw = PnrPredictor::new(1.0);
        for p in [&mut smooth, &mut raw] {
            p.observe(0.1, 1.0);
            p.observe(0.6, 1.0);
        }
        assert!(smooth.velocity() < raw.velocity());
        assert!(smooth.velocity() > 0.0);
    }

    #[test]
    fn zero_dt_observation_is_ignored() {
        let mut p = PnrPredictor::new(0.5);
        p.observe(0.4, 1.0);
        let before = p.clone();
        p.observe(0.9, 0.0);
        assert_eq!(p, before);
    }

    #[test]
    fn eta_already_past_threshold_is_zero() {
        let mut p = PnrPredictor::new(1.0);
        p.observe(0.9, 1.0);
        p.observe(1.1, 1.0);
        assert_eq!(p.eta(1.1, 1.0), Some(0.0));
    }
}
