//! # Workspace Store Traits
//!
//! Read contracts the engine needs from the persistence layer. The engine never
//! writes through these; implementations may be backed by a database, a remote
//! service or the in-memory store used in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::constants::TaskStatus;
use crate::error::Result;
use crate::models::{Agent, ContextEntry, ExecutionEvent, Goal, Task};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks in a workspace, optionally restricted to one status
    async fn list_tasks(&self, workspace_id: &str, status: Option<TaskStatus>)
        -> Result<Vec<Task>>;
}

#[async_trait]
pub trait ExecutionLog: Send + Sync {
    /// Attempt and skip events recorded at or after `since`
    async fn recent_events(
        &self,
        workspace_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ExecutionEvent>>;
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn list_goals(&self, workspace_id: &str) -> Result<Vec<Goal>>;
}

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn list_agents(&self, workspace_id: &str) -> Result<Vec<Agent>>;
}

/// Enumerates the workspaces a balancing sweep should cover
#[async_trait]
pub trait WorkspaceDirectory: Send + Sync {
    async fn list_active_workspaces(&self) -> Result<Vec<String>>;
}

/// Optional auxiliary context source.
///
/// The engine treats this as best-effort: absence, errors and timeouts are all
/// equivalent to an empty result.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn relevant_context(&self, workspace_id: &str, topic: &str)
        -> Result<Vec<ContextEntry>>;
}

/// The full set of stores the engine reads from
#[derive(Clone)]
pub struct WorkspaceStores {
    pub tasks: Arc<dyn TaskStore>,
    pub execution_log: Arc<dyn ExecutionLog>,
    pub goals: Arc<dyn GoalStore>,
    pub agents: Arc<dyn AgentStore>,
    pub directory: Arc<dyn WorkspaceDirectory>,
    pub context: Option<Arc<dyn ContextProvider>>,
}

impl WorkspaceStores {
    /// Use one backend for every store
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TaskStore + ExecutionLog + GoalStore + AgentStore + WorkspaceDirectory + 'static,
    {
        Self {
            tasks: backend.clone(),
            execution_log: backend.clone(),
            goals: backend.clone(),
            agents: backend.clone(),
            directory: backend,
            context: None,
        }
    }

    pub fn with_context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context = Some(provider);
        self
    }
}

impl std::fmt::Debug for WorkspaceStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceStores")
            .field("context_provider", &self.context.is_some())
            .finish_non_exhaustive()
    }
}
