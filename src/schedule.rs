use serde::{Deserialize, Serialize};

/// Exponentially decaying exploration probability.
///
/// `ε(t) = ε_final + (ε_start − ε_final) · exp(−t / ε_decay)`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f64,
    pub end: f64,
    pub decay: f64,
}

impl EpsilonSchedule {
    pub fn new(start: f64, end: f64, decay: f64) -> Self {
        EpsilonSchedule { start, end, decay }
    }

    /// Exploration probability after `step` learner updates.
    pub fn value(&self, step: usize) -> f64 {
        let value = self.end + (self.start - self.end) * (-(step as f64) / self.decay).exp();
        // exp() rounding can overshoot the bounds by an ulp
        value.clamp(self.end.min(self.start), self.start.max(self.end))
    }
}
