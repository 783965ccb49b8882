//! # Throughput Optimizer
//!
//! Turns a workspace's metrics and thresholds into categorised, actionable
//! recommendations. Context notes from the optional [`ContextProvider`] are
//! attached when available; a missing, failing or slow provider just yields no
//! notes.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::{Bottleneck, Phase};
use crate::models::{
    AdaptiveThresholds, ContextEntry, OptimizationCategory, OptimizationRecommendation,
    RecommendationPriority, ThroughputOptimization, WorkspaceMetrics,
};
use crate::stores::ContextProvider;

/// Goal progress below which goal alignment is recommended
const LOW_GOAL_PROGRESS: f64 = 0.3;
/// Skip rate that warrants prioritization advice even below the bottleneck trigger
const ELEVATED_SKIP_RATE: f64 = 0.3;

pub struct ThroughputOptimizer {
    context: Option<Arc<dyn ContextProvider>>,
    context_timeout: Duration,
}

impl std::fmt::Debug for ThroughputOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThroughputOptimizer")
            .field("context_provider", &self.context.is_some())
            .field("context_timeout", &self.context_timeout)
            .finish()
    }
}

impl ThroughputOptimizer {
    pub fn new(context: Option<Arc<dyn ContextProvider>>, context_timeout: Duration) -> Self {
        Self {
            context,
            context_timeout,
        }
    }

    pub async fn optimize(
        &self,
        metrics: &WorkspaceMetrics,
        thresholds: AdaptiveThresholds,
    ) -> ThroughputOptimization {
        let recommendations = self.recommendations(metrics, &thresholds);
        let context_notes = self.context_notes(&metrics.workspace_id, metrics.phase).await;

        debug!(
            workspace_id = %metrics.workspace_id,
            recommendations = recommendations.len(),
            context_notes = context_notes.len(),
            "⚙️ THROUGHPUT: Optimization computed"
        );

        ThroughputOptimization {
            workspace_id: metrics.workspace_id.clone(),
            thresholds,
            recommendations,
            context_notes,
        }
    }

    /// Recommendations ordered from most to least urgent
    pub fn recommendations(
        &self,
        metrics: &WorkspaceMetrics,
        thresholds: &AdaptiveThresholds,
    ) -> Vec<OptimizationRecommendation> {
        let mut recommendations = Vec::new();

        if metrics.has_bottleneck(Bottleneck::TaskQueueOverflow) {
            recommendations.push(recommendation(
                OptimizationCategory::Capacity,
                RecommendationPriority::High,
                format!(
                    "Pending queue of {} exceeds the adaptive limit of {}; add agent capacity or split the backlog",
                    metrics.pending, thresholds.max_pending_tasks
                ),
                "Shorter queue wait times",
            ));
        }

        if metrics.has_bottleneck(Bottleneck::HighSkipRate) {
            recommendations.push(recommendation(
                OptimizationCategory::Prioritization,
                RecommendationPriority::High,
                format!(
                    "Skip rate at {:.0}%; boost high-risk tasks by {:.1}x",
                    metrics.skip_rate * 100.0,
                    thresholds.priority_boost_factor
                ),
                "Fewer repeatedly skipped tasks",
            ));
        } else if metrics.skip_rate > ELEVATED_SKIP_RATE {
            recommendations.push(recommendation(
                OptimizationCategory::Prioritization,
                RecommendationPriority::Medium,
                format!(
                    "Skip rate at {:.0}%; review ordering of long-waiting tasks",
                    metrics.skip_rate * 100.0
                ),
                "Skip rate kept below the bottleneck trigger",
            ));
        }

        if metrics.has_bottleneck(Bottleneck::StuckTasks) {
            recommendations.push(recommendation(
                OptimizationCategory::Quality,
                RecommendationPriority::High,
                format!(
                    "{} tasks in progress; review blocked or abandoned work",
                    metrics.in_progress
                ),
                "Freed agent capacity",
            ));
        }

        if metrics.has_bottleneck(Bottleneck::LowAgentUtilization) && metrics.pending > 0 {
            recommendations.push(recommendation(
                OptimizationCategory::AgentAllocation,
                RecommendationPriority::Medium,
                format!(
                    "Agent utilization at {:.0}% with {} tasks pending; assign idle agents",
                    metrics.agent_utilization * 100.0,
                    metrics.pending
                ),
                "Higher throughput without new agents",
            ));
        }

        if metrics.has_data() && metrics.goal_completion_rate < LOW_GOAL_PROGRESS {
            recommendations.push(recommendation(
                OptimizationCategory::GoalAlignment,
                RecommendationPriority::Medium,
                format!(
                    "Goal progress at {:.0}%; link pending tasks to active goals",
                    metrics.goal_completion_rate * 100.0
                ),
                "Work concentrated on goal-relevant tasks",
            ));
        }

        if let Some(phase_advice) = phase_recommendation(metrics.phase, thresholds) {
            recommendations.push(phase_advice);
        }

        if thresholds.is_fallback {
            recommendations.push(recommendation(
                OptimizationCategory::Capacity,
                RecommendationPriority::Low,
                "Conservative default limits in use; more task history enables adaptive limits"
                    .to_string(),
                "Limits matched to observed throughput",
            ));
        }

        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
        recommendations
    }

    /// Best-effort context lookup keyed by the workspace's phase
    pub async fn context_notes(&self, workspace_id: &str, phase: Phase) -> Vec<ContextEntry> {
        let Some(provider) = &self.context else {
            return Vec::new();
        };

        match tokio::time::timeout(
            self.context_timeout,
            provider.relevant_context(workspace_id, phase.as_str()),
        )
        .await
        {
            Ok(Ok(entries)) => entries,
            Ok(Err(error)) => {
                warn!(
                    workspace_id = %workspace_id,
                    error = %error,
                    "⚙️ THROUGHPUT: Context provider failed, continuing without notes"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    workspace_id = %workspace_id,
                    timeout_ms = self.context_timeout.as_millis() as u64,
                    "⚙️ THROUGHPUT: Context provider timed out, continuing without notes"
                );
                Vec::new()
            }
        }
    }
}

fn recommendation(
    category: OptimizationCategory,
    priority: RecommendationPriority,
    description: String,
    expected_impact: &str,
) -> OptimizationRecommendation {
    OptimizationRecommendation {
        category,
        priority,
        description,
        expected_impact: expected_impact.to_string(),
    }
}

fn phase_recommendation(
    phase: Phase,
    thresholds: &AdaptiveThresholds,
) -> Option<OptimizationRecommendation> {
    let description = match phase {
        Phase::Implementation => format!(
            "Implementation phase supports up to {} pending tasks; batch related work",
            thresholds.max_pending_tasks
        ),
        Phase::Testing => format!(
            "Testing phase: hold results to a quality gate of {:.2}",
            thresholds.quality_gate_threshold
        ),
        Phase::Deployment | Phase::Maintenance => {
            format!("{phase} phase: keep concurrency low and sequence risky changes")
        }
        Phase::Planning | Phase::Analysis => return None,
    };
    let category = match phase {
        Phase::Testing => OptimizationCategory::Quality,
        _ => OptimizationCategory::Capacity,
    };
    Some(recommendation(
        category,
        RecommendationPriority::Low,
        description,
        "Queue depth matched to the current phase",
    ))
}
