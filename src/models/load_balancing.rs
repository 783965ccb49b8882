//! Cross-workspace load balancing outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Congestion score of one workspace within a single sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceLoadSnapshot {
    pub workspace_id: String,
    pub load_score: f64,
    pub pending: u64,
    pub skip_rate: f64,
    pub agent_utilization: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceAction {
    ReduceLoad,
    IncreaseUtilization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRebalanceRecommendation {
    pub workspace_id: String,
    pub action: RebalanceAction,
    pub load_score: f64,
    pub average_load_score: f64,
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancingReport {
    pub generated_at: DateTime<Utc>,
    pub workspace_count: usize,
    pub average_load_score: f64,
    /// Snapshots ranked by descending load score
    pub rankings: Vec<WorkspaceLoadSnapshot>,
    pub recommendations: Vec<WorkspaceRebalanceRecommendation>,
    pub global_opportunities: Vec<String>,
}

impl LoadBalancingReport {
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            workspace_count: 0,
            average_load_score: 0.0,
            rankings: Vec::new(),
            recommendations: Vec::new(),
            global_opportunities: Vec::new(),
        }
    }

    /// Recommendations of one kind, in ranking order
    pub fn recommendations_for(
        &self,
        action: RebalanceAction,
    ) -> impl Iterator<Item = &WorkspaceRebalanceRecommendation> {
        self.recommendations
            .iter()
            .filter(move |recommendation| recommendation.action == action)
    }

    pub fn recommendation_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Option<&WorkspaceRebalanceRecommendation> {
        self.recommendations
            .iter()
            .find(|recommendation| recommendation.workspace_id == workspace_id)
    }
}
