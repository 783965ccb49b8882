//! Decision outputs: admission recommendations, risk assessments and
//! throughput/skip-prevention reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::TaskPriority;
use crate::models::{AdaptiveThresholds, ContextEntry};

/// Whether a task may proceed now, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationRecommendation {
    pub should_proceed: bool,
    pub recommended_limit: u32,
    pub reasoning: String,
    pub confidence: f64,
    pub optimization_suggestions: Vec<String>,
}

/// Skip-risk estimate for a single pending task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRiskAssessment {
    pub task_uuid: Uuid,
    pub risk_score: f64,
    /// Contributing factors, in evaluation order
    pub risk_factors: Vec<String>,
}

/// Proposed priority boost for a high-risk task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAdjustment {
    pub task_uuid: Uuid,
    pub current_priority: TaskPriority,
    pub recommended_priority: TaskPriority,
    pub boost_factor: f64,
    pub risk_score: f64,
    pub reason: String,
}

/// Result of an adaptive skip-prevention pass over a workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipPreventionReport {
    pub workspace_id: String,
    pub current_skip_rate: f64,
    pub high_risk_tasks: Vec<TaskRiskAssessment>,
    pub priority_adjustments: Vec<PriorityAdjustment>,
    /// Approximate skip-rate reduction if every adjustment is applied
    pub expected_improvement: f64,
    pub projected_skip_rate: f64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationCategory {
    Capacity,
    Prioritization,
    AgentAllocation,
    GoalAlignment,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

/// A single actionable throughput improvement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub category: OptimizationCategory,
    pub priority: RecommendationPriority,
    pub description: String,
    pub expected_impact: String,
}

/// Thresholds plus recommendations for one workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputOptimization {
    pub workspace_id: String,
    pub thresholds: AdaptiveThresholds,
    pub recommendations: Vec<OptimizationRecommendation>,
    /// Notes from the optional context provider; empty when unavailable
    pub context_notes: Vec<ContextEntry>,
}
