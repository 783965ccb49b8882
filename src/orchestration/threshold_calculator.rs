//! # Threshold Calculator
//!
//! Turns a metrics snapshot and phase into [`AdaptiveThresholds`].
//!
//! ## Capacity formula
//!
//! ```text
//! max_pending = floor(base * phase_multiplier * (0.5 + 1.5 * performance_score))
//! ```
//!
//! The performance multiplier ranges over `[0.5, 2.0]`, so healthy workspaces
//! in implementation-heavy phases can hold up to four times the base queue.
//! Workspaces without enough task history, and any non-finite input, get the
//! conservative fallback thresholds instead.

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::{AdmissionConfig, FallbackConfig, ThresholdConfig};
use crate::constants::{clamp_unit, Bottleneck, Phase};
use crate::error::{AdmissionError, Result};
use crate::logging::log_threshold_calculation;
use crate::models::{AdaptiveThresholds, WorkspaceMetrics};

#[derive(Debug, Clone)]
pub struct ThresholdCalculator {
    config: ThresholdConfig,
    fallback: FallbackConfig,
}

impl ThresholdCalculator {
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            config: config.thresholds.clone(),
            fallback: config.fallback.clone(),
        }
    }

    /// Adaptive thresholds, or the fallback thresholds when they can't be computed
    pub fn calculate(&self, metrics: &WorkspaceMetrics, phase: Phase) -> AdaptiveThresholds {
        match self.try_calculate(metrics, phase) {
            Ok(thresholds) => {
                log_threshold_calculation(&thresholds, false);
                thresholds
            }
            Err(error @ AdmissionError::InsufficientData { .. }) => {
                debug!(
                    workspace_id = %metrics.workspace_id,
                    reason = %error,
                    "🎯 THRESHOLDS: Using fallback thresholds"
                );
                let thresholds = self.fallback(&metrics.workspace_id);
                log_threshold_calculation(&thresholds, true);
                thresholds
            }
            Err(error) => {
                warn!(
                    workspace_id = %metrics.workspace_id,
                    error = %error,
                    error_kind = error.kind(),
                    "🎯 THRESHOLDS: Calculation failed, using fallback thresholds"
                );
                let thresholds = self.fallback(&metrics.workspace_id);
                log_threshold_calculation(&thresholds, true);
                thresholds
            }
        }
    }

    pub fn try_calculate(
        &self,
        metrics: &WorkspaceMetrics,
        phase: Phase,
    ) -> Result<AdaptiveThresholds> {
        if metrics.total_tasks == 0 || metrics.total_tasks < self.config.min_sample_size {
            return Err(AdmissionError::InsufficientData {
                total_tasks: metrics.total_tasks,
                minimum: self.config.min_sample_size,
            });
        }

        for (name, value) in [
            ("skip_rate", metrics.skip_rate),
            ("goal_completion_rate", metrics.goal_completion_rate),
            ("performance_score", metrics.performance_score),
        ] {
            if !value.is_finite() {
                return Err(AdmissionError::ComputationError(format!(
                    "{name} is not finite for workspace {}",
                    metrics.workspace_id
                )));
            }
        }

        let skip_rate = clamp_unit(metrics.skip_rate);
        let goal_rate = clamp_unit(metrics.goal_completion_rate);

        let max_pending_tasks = self.max_pending_tasks(phase, metrics.performance_score)?;

        let priority_boost_factor = if skip_rate > 0.6 {
            2.0
        } else if skip_rate > 0.3 {
            1.5
        } else {
            1.0
        };

        let mut urgency_multiplier = 1.0;
        if metrics.has_bottleneck(Bottleneck::HighSkipRate) {
            urgency_multiplier += 0.5;
        }
        if metrics.has_bottleneck(Bottleneck::StuckTasks) {
            urgency_multiplier += 0.3;
        }

        Ok(AdaptiveThresholds {
            workspace_id: metrics.workspace_id.clone(),
            max_pending_tasks,
            priority_boost_factor,
            skip_prevention_threshold: 0.7 - 0.2 * goal_rate,
            phase_transition_threshold: max_pending_tasks
                .saturating_add(self.config.phase_transition_margin),
            urgency_multiplier,
            quality_gate_threshold: 0.8 - 0.2 * skip_rate,
            calculated_at: Utc::now(),
            confidence_score: self.confidence(metrics),
            is_fallback: false,
        }
        .normalized())
    }

    /// Capacity limit for a phase at a given performance score
    pub fn max_pending_tasks(&self, phase: Phase, performance_score: f64) -> Result<u32> {
        let performance_multiplier = 0.5 + 1.5 * clamp_unit(performance_score);
        let raw = self.config.base_max_pending as f64
            * self.config.phase_multipliers.for_phase(phase)
            * performance_multiplier;

        if !raw.is_finite() || raw < 0.0 {
            return Err(AdmissionError::ComputationError(format!(
                "max pending tasks evaluated to {raw}"
            )));
        }
        Ok((raw.floor().min(u32::MAX as f64) as u32).max(1))
    }

    /// How much the data behind `metrics` can be trusted.
    ///
    /// Starts at 0.5 and rises with sample size and with the presence of
    /// skip and goal signals.
    pub fn confidence(&self, metrics: &WorkspaceMetrics) -> f64 {
        let mut confidence: f64 = 0.5;
        if metrics.total_tasks >= 20 {
            confidence += 0.2;
        } else if metrics.total_tasks >= self.config.min_sample_size {
            confidence += 0.1;
        }
        if metrics.skip_count > 0 || metrics.skip_rate > 0.0 {
            confidence += 0.15;
        }
        if metrics.goal_completion_rate > 0.0 {
            confidence += 0.15;
        }
        confidence.min(1.0)
    }

    pub fn fallback(&self, workspace_id: &str) -> AdaptiveThresholds {
        AdaptiveThresholds::fallback(workspace_id, &self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;

    fn calculator() -> ThresholdCalculator {
        ThresholdCalculator::new(&AdmissionConfig::default())
    }

    fn scenario_metrics() -> WorkspaceMetrics {
        WorkspaceMetrics {
            total_tasks: 30,
            pending: 25,
            skip_count: 20,
            skip_rate: 0.667,
            goal_completion_rate: 0.1,
            agent_utilization: 0.2,
            phase: Phase::Implementation,
            ..WorkspaceMetrics::empty("ws-scenario")
        }
        .with_derived_fields(&CollectorConfig::default())
    }

    #[test]
    fn test_zero_tasks_yield_exact_fallback() {
        let thresholds = calculator().calculate(&WorkspaceMetrics::empty("ws"), Phase::Testing);
        let expected = AdaptiveThresholds::fallback("ws", &FallbackConfig::default());

        assert!(thresholds.is_fallback);
        assert_eq!(thresholds.max_pending_tasks, expected.max_pending_tasks);
        assert_eq!(thresholds.priority_boost_factor, 1.2);
        assert_eq!(thresholds.skip_prevention_threshold, 0.5);
        assert_eq!(thresholds.phase_transition_threshold, 20);
        assert_eq!(thresholds.urgency_multiplier, 1.0);
        assert_eq!(thresholds.quality_gate_threshold, 0.8);
        assert_eq!(thresholds.confidence_score, 0.5);
    }

    #[test]
    fn test_below_min_sample_is_insufficient() {
        let metrics = WorkspaceMetrics {
            total_tasks: 4,
            ..WorkspaceMetrics::empty("ws")
        };
        let error = calculator()
            .try_calculate(&metrics, Phase::Planning)
            .unwrap_err();
        assert_eq!(
            error,
            AdmissionError::InsufficientData {
                total_tasks: 4,
                minimum: 5
            }
        );
    }

    #[test]
    fn test_non_finite_input_falls_back() {
        let metrics = WorkspaceMetrics {
            total_tasks: 10,
            performance_score: f64::NAN,
            ..WorkspaceMetrics::empty("ws")
        };
        assert!(matches!(
            calculator().try_calculate(&metrics, Phase::Planning),
            Err(AdmissionError::ComputationError(_))
        ));
        assert!(calculator().calculate(&metrics, Phase::Planning).is_fallback);
    }

    #[test]
    fn test_scenario_boost_and_urgency() {
        let thresholds = calculator()
            .try_calculate(&scenario_metrics(), Phase::Implementation)
            .unwrap();

        assert_eq!(thresholds.priority_boost_factor, 2.0);
        // high_skip_rate only; nothing is in progress
        assert_eq!(thresholds.urgency_multiplier, 1.5);
        assert_eq!(
            thresholds.phase_transition_threshold,
            thresholds.max_pending_tasks + 5
        );
        assert!((thresholds.quality_gate_threshold - (0.8 - 0.2 * 0.667)).abs() < 1e-9);
        assert!((thresholds.skip_prevention_threshold - 0.68).abs() < 1e-9);
        assert!(!thresholds.is_fallback);
    }

    #[test]
    fn test_max_pending_formula() {
        let calculator = calculator();
        // 8 * 2.0 * (0.5 + 1.5 * 0.4) = 17.6
        assert_eq!(calculator.max_pending_tasks(Phase::Implementation, 0.4).unwrap(), 17);
        // 8 * 0.8 * 0.5 = 3.2
        assert_eq!(calculator.max_pending_tasks(Phase::Maintenance, 0.0).unwrap(), 3);
        // 8 * 1.2 * 2.0 = 19.2
        assert_eq!(calculator.max_pending_tasks(Phase::Planning, 1.0).unwrap(), 19);
        // clamped score
        assert_eq!(calculator.max_pending_tasks(Phase::Planning, 7.0).unwrap(), 19);
    }

    #[test]
    fn test_boost_factor_steps() {
        let calculator = calculator();
        let with_skip = |skip_rate: f64| WorkspaceMetrics {
            total_tasks: 10,
            skip_rate,
            ..WorkspaceMetrics::empty("ws")
        };

        let boost = |skip_rate| {
            calculator
                .try_calculate(&with_skip(skip_rate), Phase::Testing)
                .unwrap()
                .priority_boost_factor
        };
        assert_eq!(boost(0.61), 2.0);
        assert_eq!(boost(0.6), 1.5);
        assert_eq!(boost(0.31), 1.5);
        assert_eq!(boost(0.3), 1.0);
    }

    #[test]
    fn test_confidence_signals() {
        let calculator = calculator();
        let sparse = WorkspaceMetrics {
            total_tasks: 6,
            ..WorkspaceMetrics::empty("ws")
        };
        assert!((calculator.confidence(&sparse) - 0.6).abs() < 1e-9);

        let rich = WorkspaceMetrics {
            total_tasks: 40,
            skip_count: 3,
            skip_rate: 0.1,
            goal_completion_rate: 0.4,
            ..WorkspaceMetrics::empty("ws")
        };
        assert!((calculator.confidence(&rich) - 1.0).abs() < 1e-9);
    }
}
