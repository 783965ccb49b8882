//! # Data Model
//!
//! Strongly-typed records for everything the admission engine reads from the
//! workspace stores and everything it returns to callers.

pub mod load_balancing;
pub mod metrics;
pub mod recommendations;
pub mod task;
pub mod thresholds;
pub mod workspace;

pub use load_balancing::{
    LoadBalancingReport, RebalanceAction, WorkspaceLoadSnapshot, WorkspaceRebalanceRecommendation,
};
pub use metrics::WorkspaceMetrics;
pub use recommendations::{
    OptimizationCategory, OptimizationRecommendation, OrchestrationRecommendation,
    PriorityAdjustment, RecommendationPriority, SkipPreventionReport, TaskRiskAssessment,
    ThroughputOptimization,
};
pub use task::{Task, TaskMetadata};
pub use thresholds::AdaptiveThresholds;
pub use workspace::{Agent, ContextEntry, ExecutionEvent, ExecutionEventKind, Goal};
