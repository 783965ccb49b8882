//! # Cross-Workspace Load Balancer
//!
//! Ranks workspaces by congestion and recommends where to shed load and where
//! spare capacity sits. Works purely on metrics snapshots handed to it, so a
//! sweep never holds anything the admission path needs.
//!
//! ```text
//! load_score = 0.4 * min(pending / 20, 1) + 0.4 * skip_rate + 0.2 * (1 - utilization)
//! ```

use chrono::Utc;
use tracing::{debug, info};

use crate::config::LoadBalancerConfig;
use crate::constants::clamp_unit;
use crate::models::{
    LoadBalancingReport, RebalanceAction, WorkspaceLoadSnapshot, WorkspaceMetrics,
    WorkspaceRebalanceRecommendation,
};

#[derive(Debug, Clone)]
pub struct LoadBalancer {
    config: LoadBalancerConfig,
}

impl LoadBalancer {
    pub fn new(config: LoadBalancerConfig) -> Self {
        info!(
            "⚖️ BALANCER: Creating load balancer (overload: {:.1}x, underload: {:.1}x of average)",
            config.overload_factor, config.underload_factor
        );
        Self { config }
    }

    pub fn load_score(&self, metrics: &WorkspaceMetrics) -> f64 {
        let pending_factor =
            clamp_unit(metrics.pending as f64 / self.config.pending_saturation as f64);
        clamp_unit(
            self.config.pending_weight * pending_factor
                + self.config.skip_weight * clamp_unit(metrics.skip_rate)
                + self.config.idle_weight * (1.0 - clamp_unit(metrics.agent_utilization)),
        )
    }

    pub fn snapshot(&self, metrics: &WorkspaceMetrics) -> WorkspaceLoadSnapshot {
        WorkspaceLoadSnapshot {
            workspace_id: metrics.workspace_id.clone(),
            load_score: self.load_score(metrics),
            pending: metrics.pending,
            skip_rate: clamp_unit(metrics.skip_rate),
            agent_utilization: clamp_unit(metrics.agent_utilization),
        }
    }

    /// Rank every workspace and emit rebalancing recommendations
    pub fn rebalance(&self, all_metrics: &[WorkspaceMetrics]) -> LoadBalancingReport {
        if all_metrics.is_empty() {
            debug!("BALANCER: No workspaces to balance");
            return LoadBalancingReport::empty();
        }

        let mut rankings: Vec<WorkspaceLoadSnapshot> =
            all_metrics.iter().map(|metrics| self.snapshot(metrics)).collect();
        rankings.sort_by(|a, b| {
            b.load_score
                .total_cmp(&a.load_score)
                .then_with(|| a.workspace_id.cmp(&b.workspace_id))
        });

        let count = rankings.len();
        let average_load_score =
            rankings.iter().map(|snapshot| snapshot.load_score).sum::<f64>() / count as f64;
        let overload_line = self.config.overload_factor * average_load_score;
        let underload_line = self.config.underload_factor * average_load_score;

        let mut recommendations = Vec::new();
        for snapshot in &rankings {
            if snapshot.load_score > overload_line {
                info!(
                    workspace_id = %snapshot.workspace_id,
                    load_score = snapshot.load_score,
                    average = average_load_score,
                    "BALANCER: Workspace overloaded, recommending load reduction"
                );
                recommendations.push(WorkspaceRebalanceRecommendation {
                    workspace_id: snapshot.workspace_id.clone(),
                    action: RebalanceAction::ReduceLoad,
                    load_score: snapshot.load_score,
                    average_load_score,
                    suggested_actions: reduce_load_actions(snapshot),
                });
            } else if snapshot.load_score < underload_line {
                debug!(
                    workspace_id = %snapshot.workspace_id,
                    load_score = snapshot.load_score,
                    average = average_load_score,
                    "BALANCER: Workspace underutilized"
                );
                recommendations.push(WorkspaceRebalanceRecommendation {
                    workspace_id: snapshot.workspace_id.clone(),
                    action: RebalanceAction::IncreaseUtilization,
                    load_score: snapshot.load_score,
                    average_load_score,
                    suggested_actions: increase_utilization_actions(snapshot),
                });
            }
        }

        let global_opportunities = self.global_opportunities(&rankings, &recommendations);

        info!(
            workspaces = count,
            average_load_score = average_load_score,
            recommendations = recommendations.len(),
            global_opportunities = global_opportunities.len(),
            "⚖️ BALANCER: Load balancing sweep complete"
        );

        LoadBalancingReport {
            generated_at: Utc::now(),
            workspace_count: count,
            average_load_score,
            rankings,
            recommendations,
            global_opportunities,
        }
    }

    fn global_opportunities(
        &self,
        rankings: &[WorkspaceLoadSnapshot],
        recommendations: &[WorkspaceRebalanceRecommendation],
    ) -> Vec<String> {
        let mut opportunities = Vec::new();
        let count = rankings.len() as f64;

        let overloaded: Vec<&str> = recommendations
            .iter()
            .filter(|r| r.action == RebalanceAction::ReduceLoad)
            .map(|r| r.workspace_id.as_str())
            .collect();
        let underloaded: Vec<&str> = recommendations
            .iter()
            .filter(|r| r.action == RebalanceAction::IncreaseUtilization)
            .map(|r| r.workspace_id.as_str())
            .collect();

        let overloaded_share = overloaded.len() as f64 / count;
        if overloaded_share > self.config.overloaded_share_alert {
            opportunities.push(format!(
                "{:.0}% of workspaces are overloaded; expand the shared agent pool",
                overloaded_share * 100.0
            ));
        }

        let mean_skip_rate = rankings.iter().map(|s| s.skip_rate).sum::<f64>() / count;
        if mean_skip_rate > self.config.skip_rate_alert {
            opportunities.push(format!(
                "Mean skip rate is {:.0}%; review prioritization policy across workspaces",
                mean_skip_rate * 100.0
            ));
        }

        if !overloaded.is_empty() && !underloaded.is_empty() {
            opportunities.push(format!(
                "Shift agents from {} to {}",
                underloaded.join(", "),
                overloaded.join(", ")
            ));
        }

        opportunities
    }
}

fn reduce_load_actions(snapshot: &WorkspaceLoadSnapshot) -> Vec<String> {
    let mut actions = vec![
        format!(
            "Raise the adaptive pending limit or pause intake ({} pending)",
            snapshot.pending
        ),
        "Add agents to this workspace".to_string(),
        "Redistribute low-priority tasks to less loaded workspaces".to_string(),
    ];
    if snapshot.skip_rate > 0.0 {
        actions.push(format!(
            "Run skip prevention (skip rate {:.0}%)",
            snapshot.skip_rate * 100.0
        ));
    }
    actions
}

fn increase_utilization_actions(snapshot: &WorkspaceLoadSnapshot) -> Vec<String> {
    vec![
        "Accept redistributed tasks from overloaded workspaces".to_string(),
        format!(
            "Lend idle agents (utilization {:.0}%)",
            snapshot.agent_utilization * 100.0
        ),
    ]
}
