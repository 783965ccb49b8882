use std::sync::Arc;

use chrono::{Duration, Utc};
use tasker_admission::constants::{AgentStatus, TaskPriority, TaskStatus};
use tasker_admission::models::{Agent, ExecutionEvent, ExecutionEventKind, Goal, Task};
use tasker_admission::stores::{InMemoryWorkspaceStore, WorkspaceStores};
use tasker_admission::{AdaptiveOrchestrationEngine, AdmissionConfig};

/// Builder for seeding one workspace into an in-memory store
#[derive(Debug, Clone)]
pub struct WorkspaceFixture {
    workspace_id: String,
    tasks: Vec<Task>,
    events: Vec<ExecutionEvent>,
    goals: Vec<Goal>,
    agents: Vec<Agent>,
}

impl WorkspaceFixture {
    pub fn new(workspace_id: &str) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            tasks: Vec::new(),
            events: Vec::new(),
            goals: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// Pending tasks named `"{name} {i}"`
    pub fn pending(mut self, count: usize, name: &str) -> Self {
        for i in 0..count {
            self.tasks.push(Task::new(&self.workspace_id, format!("{name} {i}")));
        }
        self
    }

    pub fn pending_aged(mut self, count: usize, name: &str, age_hours: i64, priority: TaskPriority) -> Self {
        let created = Utc::now() - Duration::hours(age_hours);
        for i in 0..count {
            self.tasks.push(
                Task::new(&self.workspace_id, format!("{name} {i}"))
                    .with_priority(priority)
                    .created_at(created),
            );
        }
        self
    }

    pub fn with_status(mut self, count: usize, name: &str, status: TaskStatus) -> Self {
        for i in 0..count {
            self.tasks.push(
                Task::new(&self.workspace_id, format!("{name} {i}")).with_status(status),
            );
        }
        self
    }

    /// `skipped` skip events plus `executed` successful executions in the last hour
    pub fn events(mut self, skipped: usize, executed: usize) -> Self {
        let at = Utc::now() - Duration::minutes(30);
        for _ in 0..skipped {
            self.events
                .push(ExecutionEvent::new(&self.workspace_id, ExecutionEventKind::Skipped).at(at));
        }
        for _ in 0..executed {
            self.events
                .push(ExecutionEvent::new(&self.workspace_id, ExecutionEventKind::Executed).at(at));
        }
        self
    }

    pub fn goal(mut self, current: f64, target: f64) -> Self {
        let name = format!("goal-{}", self.goals.len());
        self.goals
            .push(Goal::new(&self.workspace_id, name, current, target));
        self
    }

    pub fn agents(mut self, busy: usize, idle: usize) -> Self {
        let offset = self.agents.len();
        for i in 0..busy + idle {
            let status = if i < busy {
                AgentStatus::Busy
            } else {
                AgentStatus::Idle
            };
            self.agents.push(Agent::new(
                format!("{}-agent-{}", self.workspace_id, offset + i),
                &self.workspace_id,
                status,
            ));
        }
        self
    }

    pub async fn seed(self, store: &InMemoryWorkspaceStore) {
        store.add_tasks(self.tasks).await;
        for event in self.events {
            store.record_event(event).await;
        }
        for goal in self.goals {
            store.add_goal(goal).await;
        }
        for agent in self.agents {
            store.add_agent(agent).await;
        }
    }
}

pub fn engine_with(store: Arc<InMemoryWorkspaceStore>) -> AdaptiveOrchestrationEngine {
    engine_with_config(store, AdmissionConfig::for_test())
}

pub fn engine_with_config(
    store: Arc<InMemoryWorkspaceStore>,
    config: AdmissionConfig,
) -> AdaptiveOrchestrationEngine {
    tasker_admission::logging::init_structured_logging();
    AdaptiveOrchestrationEngine::new(WorkspaceStores::from_backend(store), config)
        .expect("test configuration is valid")
}
