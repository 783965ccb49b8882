//! # Risk Scorer
//!
//! Estimates how likely each pending task is to keep being skipped and
//! proposes priority boosts for the riskiest ones.
//!
//! ```text
//! risk = age_weight      * min(age_hours / 24, 1)
//!      + priority_weight * exposure(priority)       critical 0 .. low 0.8
//!      + load_weight     * min(pending / 20, 1)
//!      + goal_weight     * (0.5 if unlinked else 0)
//! ```

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::RiskConfig;
use crate::constants::{clamp_unit, TaskPriority};
use crate::models::{
    PriorityAdjustment, SkipPreventionReport, Task, TaskRiskAssessment, WorkspaceMetrics,
};

#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn score_task(&self, task: &Task, metrics: &WorkspaceMetrics) -> TaskRiskAssessment {
        self.score_task_at(task, metrics, Utc::now())
    }

    /// Score against an explicit clock; factors are listed in evaluation order
    pub fn score_task_at(
        &self,
        task: &Task,
        metrics: &WorkspaceMetrics,
        now: DateTime<Utc>,
    ) -> TaskRiskAssessment {
        let mut risk_factors = Vec::new();

        let age_hours = task.age_hours(now);
        let age_factor = clamp_unit(age_hours / self.config.age_saturation_hours);
        if age_factor > 0.0 {
            risk_factors.push(format!("queued for {age_hours:.1}h"));
        }

        let priority_factor = task.priority.skip_exposure();
        if priority_factor > 0.0 {
            risk_factors.push(format!("{} priority", task.priority));
        }

        let load_factor =
            clamp_unit(metrics.pending as f64 / self.config.pending_saturation as f64);
        if load_factor > 0.0 {
            risk_factors.push(format!("workspace backlog of {} pending tasks", metrics.pending));
        }

        let goal_factor = if task.has_goal_linkage() {
            0.0
        } else {
            risk_factors.push("not linked to a goal".to_string());
            self.config.unlinked_goal_penalty
        };

        let risk_score = clamp_unit(
            self.config.age_weight * age_factor
                + self.config.priority_weight * priority_factor
                + self.config.load_weight * load_factor
                + self.config.goal_linkage_weight * goal_factor,
        );

        TaskRiskAssessment {
            task_uuid: task.task_uuid,
            risk_score,
            risk_factors,
        }
    }

    pub fn is_high_risk(&self, assessment: &TaskRiskAssessment) -> bool {
        assessment.risk_score > self.config.high_risk_threshold
    }

    /// Priority tier and boost factor for a risk score
    pub fn recommended_boost(risk_score: f64) -> (TaskPriority, f64) {
        if risk_score > 0.8 {
            (TaskPriority::Critical, 2.0)
        } else if risk_score > 0.7 {
            (TaskPriority::High, 1.5)
        } else {
            (TaskPriority::Medium, 1.2)
        }
    }

    /// Boost proposal for a high-risk task; never lowers the current priority
    pub fn priority_adjustment(
        &self,
        task: &Task,
        assessment: &TaskRiskAssessment,
    ) -> PriorityAdjustment {
        let (tier, boost_factor) = Self::recommended_boost(assessment.risk_score);
        PriorityAdjustment {
            task_uuid: task.task_uuid,
            current_priority: task.priority,
            recommended_priority: tier.max(task.priority),
            boost_factor,
            risk_score: assessment.risk_score,
            reason: format!(
                "skip risk {:.2}: {}",
                assessment.risk_score,
                assessment.risk_factors.join(", ")
            ),
        }
    }

    /// Approximate skip-rate reduction from applying `adjustments` boosts.
    ///
    /// Grows linearly with the number of adjustments and never exceeds the
    /// current skip rate.
    pub fn expected_improvement(&self, current_skip_rate: f64, adjustments: usize) -> f64 {
        let current = clamp_unit(current_skip_rate);
        (self.config.skip_reduction_per_adjustment * adjustments as f64).clamp(0.0, current)
    }

    /// Score every pending task and build the skip-prevention report
    pub fn prevention_report(
        &self,
        metrics: &WorkspaceMetrics,
        pending_tasks: &[Task],
        now: DateTime<Utc>,
    ) -> SkipPreventionReport {
        let mut high_risk: Vec<(&Task, TaskRiskAssessment)> = pending_tasks
            .iter()
            .map(|task| (task, self.score_task_at(task, metrics, now)))
            .filter(|(_, assessment)| self.is_high_risk(assessment))
            .collect();
        high_risk.sort_by(|(_, a), (_, b)| b.risk_score.total_cmp(&a.risk_score));

        let priority_adjustments: Vec<PriorityAdjustment> = high_risk
            .iter()
            .map(|(task, assessment)| self.priority_adjustment(task, assessment))
            .collect();

        let current_skip_rate = clamp_unit(metrics.skip_rate);
        let expected_improvement =
            self.expected_improvement(current_skip_rate, priority_adjustments.len());

        info!(
            workspace_id = %metrics.workspace_id,
            scored = pending_tasks.len(),
            high_risk = high_risk.len(),
            current_skip_rate = current_skip_rate,
            expected_improvement = expected_improvement,
            "🛟 SKIP_PREVENTION: Scored pending tasks"
        );

        SkipPreventionReport {
            workspace_id: metrics.workspace_id.clone(),
            current_skip_rate,
            high_risk_tasks: high_risk.into_iter().map(|(_, assessment)| assessment).collect(),
            priority_adjustments,
            expected_improvement,
            projected_skip_rate: current_skip_rate - expected_improvement,
            generated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn scorer() -> RiskScorer {
        RiskScorer::new(RiskConfig::default())
    }

    fn metrics_with_pending(pending: u64) -> WorkspaceMetrics {
        WorkspaceMetrics {
            total_tasks: pending,
            pending,
            skip_rate: 0.4,
            ..WorkspaceMetrics::empty("ws")
        }
    }

    #[test]
    fn test_factor_weights() {
        let now = Utc::now();
        let task = Task::new("ws", "old low task")
            .with_priority(TaskPriority::Low)
            .created_at(now - Duration::hours(12));

        let assessment = scorer().score_task_at(&task, &metrics_with_pending(10), now);
        // 0.3*0.5 + 0.2*0.8 + 0.3*0.5 + 0.2*0.5
        assert!((assessment.risk_score - 0.56).abs() < 1e-6);
        assert_eq!(assessment.risk_factors.len(), 4);
        assert!(assessment.risk_factors[0].starts_with("queued for 12.0h"));
        assert_eq!(assessment.risk_factors[3], "not linked to a goal");
    }

    #[test]
    fn test_fresh_linked_critical_task_has_no_risk() {
        let now = Utc::now();
        let task = Task::new("ws", "hotfix")
            .with_priority(TaskPriority::Critical)
            .with_goal(Uuid::new_v4())
            .created_at(now);

        let assessment = scorer().score_task_at(&task, &metrics_with_pending(0), now);
        assert_eq!(assessment.risk_score, 0.0);
        assert!(assessment.risk_factors.is_empty());
    }

    #[test]
    fn test_factors_saturate() {
        let now = Utc::now();
        let task = Task::new("ws", "ancient")
            .with_priority(TaskPriority::Low)
            .created_at(now - Duration::days(10));

        let assessment = scorer().score_task_at(&task, &metrics_with_pending(500), now);
        // 0.3 + 0.16 + 0.3 + 0.1
        assert!((assessment.risk_score - 0.86).abs() < 1e-6);
        assert!(scorer().is_high_risk(&assessment));
    }

    #[test]
    fn test_recommended_boost_tiers() {
        assert_eq!(RiskScorer::recommended_boost(0.85), (TaskPriority::Critical, 2.0));
        assert_eq!(RiskScorer::recommended_boost(0.8), (TaskPriority::High, 1.5));
        assert_eq!(RiskScorer::recommended_boost(0.75), (TaskPriority::High, 1.5));
        assert_eq!(RiskScorer::recommended_boost(0.65), (TaskPriority::Medium, 1.2));
    }

    #[test]
    fn test_adjustment_never_lowers_priority() {
        let task = Task::new("ws", "t").with_priority(TaskPriority::High);
        let assessment = TaskRiskAssessment {
            task_uuid: task.task_uuid,
            risk_score: 0.65,
            risk_factors: vec!["workspace backlog of 30 pending tasks".to_string()],
        };
        let adjustment = scorer().priority_adjustment(&task, &assessment);
        assert_eq!(adjustment.recommended_priority, TaskPriority::High);
        assert_eq!(adjustment.boost_factor, 1.2);
        assert!(adjustment.reason.contains("0.65"));
    }

    #[test]
    fn test_expected_improvement_is_bounded() {
        let scorer = scorer();
        assert!((scorer.expected_improvement(0.5, 2) - 0.2).abs() < 1e-9);
        assert_eq!(scorer.expected_improvement(0.25, 10), 0.25);
        assert_eq!(scorer.expected_improvement(0.4, 0), 0.0);
        assert_eq!(scorer.expected_improvement(0.0, 3), 0.0);
    }

    #[test]
    fn test_prevention_report_sorted_by_risk() {
        let now = Utc::now();
        let tasks = vec![
            Task::new("ws", "aging").created_at(now - Duration::hours(20)),
            Task::new("ws", "ancient")
                .with_priority(TaskPriority::Low)
                .created_at(now - Duration::days(3)),
            Task::new("ws", "linked")
                .with_goal(Uuid::new_v4())
                .with_priority(TaskPriority::Critical)
                .created_at(now),
        ];

        let report = scorer().prevention_report(&metrics_with_pending(25), &tasks, now);
        assert_eq!(report.high_risk_tasks.len(), 2);
        assert_eq!(report.high_risk_tasks[0].task_uuid, tasks[1].task_uuid);
        assert!(report.high_risk_tasks[0].risk_score >= report.high_risk_tasks[1].risk_score);
        assert_eq!(report.priority_adjustments.len(), 2);
        assert_eq!(
            report.priority_adjustments[0].recommended_priority,
            TaskPriority::Critical
        );
        assert!((report.expected_improvement - 0.2).abs() < 1e-9);
        assert!((report.projected_skip_rate - 0.2).abs() < 1e-9);
    }
}
