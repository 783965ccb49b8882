//! Adaptive capacity limits for a workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::FallbackConfig;
use crate::constants::clamp_unit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveThresholds {
    pub workspace_id: String,
    pub max_pending_tasks: u32,
    pub priority_boost_factor: f64,
    pub skip_prevention_threshold: f64,
    pub phase_transition_threshold: u32,
    pub urgency_multiplier: f64,
    pub quality_gate_threshold: f64,
    pub calculated_at: DateTime<Utc>,
    pub confidence_score: f64,
    /// Whether these are the conservative defaults rather than adaptive values
    pub is_fallback: bool,
}

impl AdaptiveThresholds {
    /// Conservative defaults used when adaptive computation is impossible
    pub fn fallback(workspace_id: impl Into<String>, defaults: &FallbackConfig) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            max_pending_tasks: defaults.max_pending_tasks,
            priority_boost_factor: defaults.priority_boost_factor,
            skip_prevention_threshold: defaults.skip_prevention_threshold,
            phase_transition_threshold: defaults.phase_transition_threshold,
            urgency_multiplier: defaults.urgency_multiplier,
            quality_gate_threshold: defaults.quality_gate_threshold,
            calculated_at: Utc::now(),
            confidence_score: defaults.confidence_score,
            is_fallback: true,
        }
        .normalized()
    }

    /// Enforce the structural invariants.
    ///
    /// `max_pending_tasks >= 1`, `phase_transition_threshold >= max_pending_tasks`,
    /// multipliers `>= 1.0` and every rate/score within `[0, 1]`.
    pub fn normalized(mut self) -> Self {
        self.max_pending_tasks = self.max_pending_tasks.max(1);
        self.phase_transition_threshold = self
            .phase_transition_threshold
            .max(self.max_pending_tasks);
        self.priority_boost_factor = at_least_one(self.priority_boost_factor);
        self.urgency_multiplier = at_least_one(self.urgency_multiplier);
        self.skip_prevention_threshold = clamp_unit(self.skip_prevention_threshold);
        self.quality_gate_threshold = clamp_unit(self.quality_gate_threshold);
        self.confidence_score = clamp_unit(self.confidence_score);
        self
    }

    /// Pending-queue utilization against the adaptive limit
    pub fn queue_ratio(&self, current_pending: u32) -> f64 {
        current_pending as f64 / self.max_pending_tasks.max(1) as f64
    }
}

fn at_least_one(value: f64) -> f64 {
    if value.is_finite() {
        value.max(1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_matches_defaults() {
        let thresholds = AdaptiveThresholds::fallback("ws", &FallbackConfig::default());
        assert_eq!(thresholds.max_pending_tasks, 15);
        assert_eq!(thresholds.priority_boost_factor, 1.2);
        assert_eq!(thresholds.skip_prevention_threshold, 0.5);
        assert_eq!(thresholds.phase_transition_threshold, 20);
        assert_eq!(thresholds.urgency_multiplier, 1.0);
        assert_eq!(thresholds.quality_gate_threshold, 0.8);
        assert_eq!(thresholds.confidence_score, 0.5);
        assert!(thresholds.is_fallback);
    }

    #[test]
    fn test_normalized_enforces_invariants() {
        let mut thresholds = AdaptiveThresholds::fallback("ws", &FallbackConfig::default());
        thresholds.max_pending_tasks = 0;
        thresholds.phase_transition_threshold = 0;
        thresholds.priority_boost_factor = 0.4;
        thresholds.urgency_multiplier = f64::INFINITY;
        thresholds.quality_gate_threshold = 1.3;
        thresholds.confidence_score = -1.0;

        let normalized = thresholds.normalized();
        assert_eq!(normalized.max_pending_tasks, 1);
        assert_eq!(normalized.phase_transition_threshold, 1);
        assert_eq!(normalized.priority_boost_factor, 1.0);
        assert_eq!(normalized.urgency_multiplier, 1.0);
        assert_eq!(normalized.quality_gate_threshold, 1.0);
        assert_eq!(normalized.confidence_score, 0.0);
    }

    #[test]
    fn test_queue_ratio() {
        let thresholds = AdaptiveThresholds::fallback("ws", &FallbackConfig::default());
        assert!((thresholds.queue_ratio(3) - 0.2).abs() < 1e-9);
    }
}
