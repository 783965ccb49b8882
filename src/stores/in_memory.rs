//! # In-Memory Workspace Store
//!
//! Thread-safe implementation of every store trait for embedding and tests.
//!
//! ## Features
//!
//! - **Failure Injection**: `set_unavailable(true)` makes every read fail
//! - **Latency Injection**: `set_read_delay` slows every read down
//! - **Read Accounting**: `read_count` exposes how many reads were served

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::constants::TaskStatus;
use crate::error::{AdmissionError, Result};
use crate::models::{Agent, ContextEntry, ExecutionEvent, Goal, Task};
use crate::stores::traits::{
    AgentStore, ContextProvider, ExecutionLog, GoalStore, TaskStore, WorkspaceDirectory,
};

#[derive(Debug, Default)]
struct WorkspaceData {
    tasks: Vec<Task>,
    events: Vec<ExecutionEvent>,
    goals: Vec<Goal>,
    agents: Vec<Agent>,
    context: Vec<ContextEntry>,
}

/// In-memory workspace store
///
/// # Example
///
/// ```rust
/// use tasker_admission::models::Task;
/// use tasker_admission::stores::{InMemoryWorkspaceStore, TaskStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryWorkspaceStore::new();
/// store.add_task(Task::new("ws-1", "Write docs")).await;
///
/// let tasks = store.list_tasks("ws-1", None).await?;
/// assert_eq!(tasks.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryWorkspaceStore {
    workspaces: RwLock<HashMap<String, WorkspaceData>>,
    unavailable: AtomicBool,
    read_delay_ms: AtomicU64,
    reads: AtomicU64,
}

impl InMemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_task(&self, task: Task) {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(task.workspace_id.clone())
            .or_default()
            .tasks
            .push(task);
    }

    pub async fn add_tasks(&self, tasks: impl IntoIterator<Item = Task>) {
        let mut workspaces = self.workspaces.write().await;
        for task in tasks {
            workspaces
                .entry(task.workspace_id.clone())
                .or_default()
                .tasks
                .push(task);
        }
    }

    pub async fn record_event(&self, event: ExecutionEvent) {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(event.workspace_id.clone())
            .or_default()
            .events
            .push(event);
    }

    pub async fn add_goal(&self, goal: Goal) {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(goal.workspace_id.clone())
            .or_default()
            .goals
            .push(goal);
    }

    pub async fn add_agent(&self, agent: Agent) {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(agent.workspace_id.clone())
            .or_default()
            .agents
            .push(agent);
    }

    pub async fn add_context(&self, workspace_id: &str, entry: ContextEntry) {
        let mut workspaces = self.workspaces.write().await;
        workspaces
            .entry(workspace_id.to_string())
            .or_default()
            .context
            .push(entry);
    }

    /// Update a task's status, returning whether it existed
    pub async fn set_task_status(&self, workspace_id: &str, task: &Task, status: TaskStatus) -> bool {
        let mut workspaces = self.workspaces.write().await;
        let Some(data) = workspaces.get_mut(workspace_id) else {
            return false;
        };
        match data.tasks.iter_mut().find(|t| t.task_uuid == task.task_uuid) {
            Some(existing) => {
                existing.status = status;
                existing.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn remove_workspace(&self, workspace_id: &str) {
        self.workspaces.write().await.remove(workspace_id);
    }

    /// Make every subsequent read fail with a store error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent read
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Total reads served or attempted since creation
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    async fn before_read(&self, operation: &str) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.read_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AdmissionError::StoreError(format!(
                "in-memory store unavailable during {operation}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryWorkspaceStore {
    async fn list_tasks(
        &self,
        workspace_id: &str,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        self.before_read("list_tasks").await?;
        let workspaces = self.workspaces.read().await;
        Ok(workspaces
            .get(workspace_id)
            .map(|data| {
                data.tasks
                    .iter()
                    .filter(|task| status.map_or(true, |wanted| task.status == wanted))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ExecutionLog for InMemoryWorkspaceStore {
    async fn recent_events(
        &self,
        workspace_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExecutionEvent>> {
        self.before_read("recent_events").await?;
        let workspaces = self.workspaces.read().await;
        Ok(workspaces
            .get(workspace_id)
            .map(|data| {
                data.events
                    .iter()
                    .filter(|event| event.occurred_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl GoalStore for InMemoryWorkspaceStore {
    async fn list_goals(&self, workspace_id: &str) -> Result<Vec<Goal>> {
        self.before_read("list_goals").await?;
        let workspaces = self.workspaces.read().await;
        Ok(workspaces
            .get(workspace_id)
            .map(|data| data.goals.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl AgentStore for InMemoryWorkspaceStore {
    async fn list_agents(&self, workspace_id: &str) -> Result<Vec<Agent>> {
        self.before_read("list_agents").await?;
        let workspaces = self.workspaces.read().await;
        Ok(workspaces
            .get(workspace_id)
            .map(|data| data.agents.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl WorkspaceDirectory for InMemoryWorkspaceStore {
    async fn list_active_workspaces(&self) -> Result<Vec<String>> {
        self.before_read("list_active_workspaces").await?;
        let workspaces = self.workspaces.read().await;
        let mut ids: Vec<String> = workspaces
            .iter()
            .filter(|(_, data)| !data.tasks.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl ContextProvider for InMemoryWorkspaceStore {
    async fn relevant_context(&self, workspace_id: &str, topic: &str) -> Result<Vec<ContextEntry>> {
        self.before_read("relevant_context").await?;
        let workspaces = self.workspaces.read().await;
        let topic = topic.to_lowercase();
        Ok(workspaces
            .get(workspace_id)
            .map(|data| {
                data.context
                    .iter()
                    .filter(|entry| entry.topic.to_lowercase() == topic)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
