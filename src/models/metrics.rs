//! # Workspace Metrics
//!
//! Point-in-time snapshot of a workspace's queue, throughput and goal signals.
//! Snapshots are recomputed per request or per balancing sweep and are only
//! retained by the published-metrics registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::CollectorConfig;
use crate::constants::{clamp_unit, Bottleneck, Phase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMetrics {
    pub workspace_id: String,
    pub total_tasks: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
    pub skip_count: u64,
    pub skip_rate: f64,
    pub avg_completion_hours: f64,
    pub goal_completion_rate: f64,
    pub agent_utilization: f64,
    pub phase: Phase,
    pub bottlenecks: BTreeSet<Bottleneck>,
    pub performance_score: f64,
    pub collected_at: DateTime<Utc>,
}

impl WorkspaceMetrics {
    /// Zero-valued metrics; what the collector returns when stores are unreadable
    pub fn empty(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            total_tasks: 0,
            pending: 0,
            in_progress: 0,
            completed: 0,
            failed: 0,
            skip_count: 0,
            skip_rate: 0.0,
            avg_completion_hours: 0.0,
            goal_completion_rate: 0.0,
            agent_utilization: 0.0,
            phase: Phase::Planning,
            bottlenecks: BTreeSet::new(),
            performance_score: 0.0,
            collected_at: Utc::now(),
        }
    }

    /// Share of all tasks that completed
    pub fn completion_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        clamp_unit(self.completed as f64 / self.total_tasks as f64)
    }

    pub fn has_bottleneck(&self, bottleneck: Bottleneck) -> bool {
        self.bottlenecks.contains(&bottleneck)
    }

    /// Whether any real task data backs this snapshot
    pub fn has_data(&self) -> bool {
        self.total_tasks > 0
    }

    /// Weighted blend of completion, goal progress, skip avoidance and utilization
    pub fn compute_performance_score(&self) -> f64 {
        let skip_component = (1.0 - 2.0 * self.skip_rate).max(0.0);
        clamp_unit(
            0.3 * self.completion_rate()
                + 0.3 * self.goal_completion_rate
                + 0.2 * skip_component
                + 0.2 * self.agent_utilization,
        )
    }

    /// Bottleneck tags implied by the fixed numeric triggers
    pub fn detect_bottlenecks(&self, triggers: &CollectorConfig) -> BTreeSet<Bottleneck> {
        let mut bottlenecks = BTreeSet::new();
        if self.skip_rate > triggers.skip_rate_trigger {
            bottlenecks.insert(Bottleneck::HighSkipRate);
        }
        if self.pending > triggers.queue_overflow_trigger {
            bottlenecks.insert(Bottleneck::TaskQueueOverflow);
        }
        if self.agent_utilization < triggers.low_utilization_trigger {
            bottlenecks.insert(Bottleneck::LowAgentUtilization);
        }
        if self.in_progress > triggers.stuck_tasks_trigger {
            bottlenecks.insert(Bottleneck::StuckTasks);
        }
        bottlenecks
    }

    /// Clamp every rate/score into `[0, 1]` and fix inconsistent counts.
    ///
    /// Non-finite values become zero. `total_tasks` is raised to at least the
    /// sum of the status counts.
    pub fn sanitized(mut self) -> Self {
        self.skip_rate = clamp_unit(self.skip_rate);
        self.goal_completion_rate = clamp_unit(self.goal_completion_rate);
        self.agent_utilization = clamp_unit(self.agent_utilization);
        self.performance_score = clamp_unit(self.performance_score);
        self.avg_completion_hours = if self.avg_completion_hours.is_finite() {
            self.avg_completion_hours.max(0.0)
        } else {
            0.0
        };

        let counted = self
            .pending
            .saturating_add(self.in_progress)
            .saturating_add(self.completed)
            .saturating_add(self.failed);
        if self.total_tasks < counted {
            self.total_tasks = counted;
        }
        self
    }

    /// Recompute bottlenecks and performance score from the raw signals
    pub fn with_derived_fields(mut self, triggers: &CollectorConfig) -> Self {
        self = self.sanitized();
        self.bottlenecks = self.detect_bottlenecks(triggers);
        self.performance_score = self.compute_performance_score();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_workspace() -> WorkspaceMetrics {
        WorkspaceMetrics {
            total_tasks: 30,
            pending: 25,
            in_progress: 6,
            completed: 3,
            failed: 2,
            skip_count: 20,
            skip_rate: 0.667,
            goal_completion_rate: 0.1,
            agent_utilization: 0.2,
            phase: Phase::Implementation,
            ..WorkspaceMetrics::empty("ws-busy")
        }
    }

    #[test]
    fn test_empty_metrics_are_zero_valued() {
        let metrics = WorkspaceMetrics::empty("ws");
        assert!(!metrics.has_data());
        assert_eq!(metrics.completion_rate(), 0.0);
        assert_eq!(metrics.phase, Phase::Planning);
        assert!(metrics.bottlenecks.is_empty());
    }

    #[test]
    fn test_performance_score_blend() {
        let metrics = WorkspaceMetrics {
            total_tasks: 10,
            completed: 5,
            goal_completion_rate: 0.5,
            skip_rate: 0.1,
            agent_utilization: 0.5,
            ..WorkspaceMetrics::empty("ws")
        };
        // 0.3*0.5 + 0.3*0.5 + 0.2*0.8 + 0.2*0.5
        assert!((metrics.compute_performance_score() - 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_skip_component_is_floored() {
        let metrics = WorkspaceMetrics {
            skip_rate: 0.9,
            ..WorkspaceMetrics::empty("ws")
        };
        assert_eq!(metrics.compute_performance_score(), 0.0);
    }

    #[test]
    fn test_bottleneck_triggers() {
        let bottlenecks = busy_workspace().detect_bottlenecks(&CollectorConfig::default());
        assert!(bottlenecks.contains(&Bottleneck::HighSkipRate));
        assert!(bottlenecks.contains(&Bottleneck::TaskQueueOverflow));
        assert!(bottlenecks.contains(&Bottleneck::LowAgentUtilization));
        assert!(bottlenecks.contains(&Bottleneck::StuckTasks));

        let calm = WorkspaceMetrics {
            total_tasks: 10,
            pending: 20,
            in_progress: 5,
            skip_rate: 0.5,
            agent_utilization: 0.3,
            ..WorkspaceMetrics::empty("ws")
        };
        assert!(calm.detect_bottlenecks(&CollectorConfig::default()).is_empty());
    }

    #[test]
    fn test_sanitized_clamps_and_reconciles() {
        let metrics = WorkspaceMetrics {
            total_tasks: 1,
            pending: 4,
            completed: 2,
            skip_rate: 1.4,
            agent_utilization: -0.3,
            goal_completion_rate: f64::NAN,
            avg_completion_hours: -2.0,
            ..WorkspaceMetrics::empty("ws")
        }
        .sanitized();

        assert_eq!(metrics.total_tasks, 6);
        assert_eq!(metrics.skip_rate, 1.0);
        assert_eq!(metrics.agent_utilization, 0.0);
        assert_eq!(metrics.goal_completion_rate, 0.0);
        assert_eq!(metrics.avg_completion_hours, 0.0);
    }

    #[test]
    fn test_sanitized_saturates_huge_counts() {
        let metrics = WorkspaceMetrics {
            pending: u64::MAX,
            in_progress: 1,
            completed: 7,
            ..WorkspaceMetrics::empty("ws")
        }
        .sanitized();

        assert_eq!(metrics.total_tasks, u64::MAX);
        assert_eq!(metrics.pending, u64::MAX);
    }

    #[test]
    fn test_with_derived_fields() {
        let metrics = busy_workspace().with_derived_fields(&CollectorConfig::default());
        assert_eq!(metrics.bottlenecks.len(), 4);
        assert!(metrics.performance_score > 0.0 && metrics.performance_score < 0.2);
    }
}
