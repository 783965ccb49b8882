//! # Admission Constants
//!
//! Core enums and fixed values shared by the metrics, threshold and
//! prioritization components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status as reported by the task store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Whether the task no longer occupies queue capacity
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Task priority levels, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }

    /// Normalized likelihood of being passed over in favour of other work
    pub fn skip_exposure(&self) -> f64 {
        match self {
            TaskPriority::Critical => 0.0,
            TaskPriority::High => 0.2,
            TaskPriority::Medium => 0.5,
            TaskPriority::Low => 0.8,
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent availability as reported by the agent store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Busy,
    Offline,
}

/// Coarse lifecycle phase inferred from task content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Planning,
    Analysis,
    Implementation,
    Testing,
    Deployment,
    Maintenance,
}

impl Phase {
    /// All phases in tie-break order; planning wins ties
    pub const ALL: [Phase; 6] = [
        Phase::Planning,
        Phase::Analysis,
        Phase::Implementation,
        Phase::Testing,
        Phase::Deployment,
        Phase::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planning => "planning",
            Phase::Analysis => "analysis",
            Phase::Implementation => "implementation",
            Phase::Testing => "testing",
            Phase::Deployment => "deployment",
            Phase::Maintenance => "maintenance",
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Planning
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bottleneck tags derived from fixed numeric triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bottleneck {
    HighSkipRate,
    TaskQueueOverflow,
    LowAgentUtilization,
    StuckTasks,
}

impl Bottleneck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bottleneck::HighSkipRate => "high_skip_rate",
            Bottleneck::TaskQueueOverflow => "task_queue_overflow",
            Bottleneck::LowAgentUtilization => "low_agent_utilization",
            Bottleneck::StuckTasks => "stuck_tasks",
        }
    }
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conservative values used whenever adaptive computation is not possible
pub mod fallback {
    pub const MAX_PENDING_TASKS: u32 = 15;
    pub const PRIORITY_BOOST_FACTOR: f64 = 1.2;
    pub const SKIP_PREVENTION_THRESHOLD: f64 = 0.5;
    pub const PHASE_TRANSITION_THRESHOLD: u32 = 20;
    pub const URGENCY_MULTIPLIER: f64 = 1.0;
    pub const QUALITY_GATE_THRESHOLD: f64 = 0.8;
    pub const CONFIDENCE_SCORE: f64 = 0.5;

    /// Hard-coded pending limit when the admission controller itself fails
    pub const ADMISSION_LIMIT: u32 = 8;
}

/// Clamp a rate or score into `[0, 1]`, mapping non-finite values to zero
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering_and_exposure() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::Medium > TaskPriority::Low);
        assert_eq!(TaskPriority::Critical.skip_exposure(), 0.0);
        assert_eq!(TaskPriority::Low.skip_exposure(), 0.8);
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&Phase::Implementation).unwrap(),
            "\"implementation\""
        );
        assert_eq!(
            serde_json::to_string(&Bottleneck::StuckTasks).unwrap(),
            "\"stuck_tasks\""
        );
        assert_eq!(Bottleneck::TaskQueueOverflow.to_string(), "task_queue_overflow");
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
    }
}
