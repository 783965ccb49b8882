//! Goal, agent, execution-log and context records read from the workspace stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::AgentStatus;

/// A measurable workspace objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_uuid: Uuid,
    pub workspace_id: String,
    pub name: String,
    pub current_value: f64,
    pub target_value: f64,
}

impl Goal {
    pub fn new(
        workspace_id: impl Into<String>,
        name: impl Into<String>,
        current_value: f64,
        target_value: f64,
    ) -> Self {
        Self {
            goal_uuid: Uuid::new_v4(),
            workspace_id: workspace_id.into(),
            name: name.into(),
            current_value,
            target_value,
        }
    }

    /// Progress towards the target capped at 1.0.
    ///
    /// `None` for goals without a positive, finite target; those carry no
    /// progress signal and are excluded from averages.
    pub fn progress(&self) -> Option<f64> {
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return None;
        }
        if !self.current_value.is_finite() {
            return None;
        }
        Some((self.current_value / self.target_value).clamp(0.0, 1.0))
    }
}

/// An executor attached to a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub workspace_id: String,
    pub status: AgentStatus,
}

impl Agent {
    pub fn new(
        agent_id: impl Into<String>,
        workspace_id: impl Into<String>,
        status: AgentStatus,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            workspace_id: workspace_id.into(),
            status,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.status == AgentStatus::Busy
    }
}

/// What happened to a task in one scheduling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEventKind {
    Executed,
    Skipped,
    Failed,
}

/// One attempt recorded in the execution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub task_uuid: Option<Uuid>,
    pub workspace_id: String,
    pub kind: ExecutionEventKind,
    pub occurred_at: DateTime<Utc>,
}

impl ExecutionEvent {
    pub fn new(workspace_id: impl Into<String>, kind: ExecutionEventKind) -> Self {
        Self {
            task_uuid: None,
            workspace_id: workspace_id.into(),
            kind,
            occurred_at: Utc::now(),
        }
    }

    pub fn for_task(mut self, task_uuid: Uuid) -> Self {
        self.task_uuid = Some(task_uuid);
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn is_skip(&self) -> bool {
        self.kind == ExecutionEventKind::Skipped
    }
}

/// Auxiliary context returned by an optional context provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub topic: String,
    pub content: String,
    pub relevance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_progress() {
        assert_eq!(Goal::new("ws", "g", 5.0, 10.0).progress(), Some(0.5));
        assert_eq!(Goal::new("ws", "g", 15.0, 10.0).progress(), Some(1.0));
        assert_eq!(Goal::new("ws", "g", -3.0, 10.0).progress(), Some(0.0));
        assert_eq!(Goal::new("ws", "g", 3.0, 0.0).progress(), None);
        assert_eq!(Goal::new("ws", "g", f64::NAN, 10.0).progress(), None);
    }

    #[test]
    fn test_event_helpers() {
        let event = ExecutionEvent::new("ws", ExecutionEventKind::Skipped).for_task(Uuid::new_v4());
        assert!(event.is_skip());
        assert!(event.task_uuid.is_some());
        assert!(Agent::new("a1", "ws", AgentStatus::Busy).is_busy());
    }
}
