//! Task records and the metadata callers attach to an admission request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{TaskPriority, TaskStatus};

/// A unit of work as seen by the task store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_uuid: Uuid,
    pub workspace_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub goal_uuid: Option<Uuid>,
}

impl Task {
    /// New pending, medium-priority task created now
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_uuid: Uuid::new_v4(),
            workspace_id: workspace_id.into(),
            name: name.into(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            created_at: now,
            updated_at: now,
            goal_uuid: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_goal(mut self, goal_uuid: Uuid) -> Self {
        self.goal_uuid = Some(goal_uuid);
        self
    }

    /// Set creation time; `updated_at` is moved forward if it would precede it
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        if self.updated_at < created_at {
            self.updated_at = created_at;
        }
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Hours spent since creation, never negative
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let age = now.signed_duration_since(self.created_at);
        (age.num_milliseconds() as f64 / 3_600_000.0).max(0.0)
    }

    /// Hours between creation and last update; the completion time for finished tasks
    pub fn elapsed_hours(&self) -> f64 {
        let elapsed = self.updated_at.signed_duration_since(self.created_at);
        (elapsed.num_milliseconds() as f64 / 3_600_000.0).max(0.0)
    }

    pub fn has_goal_linkage(&self) -> bool {
        self.goal_uuid.is_some()
    }

    /// Name and description joined for keyword classification
    pub fn searchable_text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.name, description),
            None => self.name.clone(),
        }
    }
}

/// Caller-supplied facts about the task requesting admission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub is_critical: bool,
    pub priority: TaskPriority,
}

impl TaskMetadata {
    pub fn critical() -> Self {
        Self {
            is_critical: true,
            priority: TaskPriority::Critical,
        }
    }

    pub fn with_priority(priority: TaskPriority) -> Self {
        Self {
            is_critical: false,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_task_builder_and_ages() {
        let now = Utc::now();
        let task = Task::new("ws-1", "Implement parser")
            .with_description("build the tokenizer")
            .with_priority(TaskPriority::High)
            .created_at(now - Duration::hours(6));

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(!task.has_goal_linkage());
        assert!((task.age_hours(now) - 6.0).abs() < 0.01);
        assert_eq!(task.searchable_text(), "Implement parser build the tokenizer");
    }

    #[test]
    fn test_elapsed_hours_for_completed_task() {
        let start = Utc::now() - Duration::hours(10);
        let task = Task::new("ws-1", "Deploy")
            .created_at(start)
            .updated_at(start + Duration::hours(3))
            .with_status(TaskStatus::Completed);
        assert!((task.elapsed_hours() - 3.0).abs() < 0.01);
    }

    #[test]
    fn test_age_is_never_negative() {
        let now = Utc::now();
        let task = Task::new("ws-1", "Future").created_at(now + Duration::hours(1));
        assert_eq!(task.age_hours(now), 0.0);
    }
}
