//! # Metrics Collector
//!
//! Reads raw workspace state from the stores and condenses it into a
//! [`WorkspaceMetrics`] snapshot.
//!
//! The four store reads run concurrently, each under the fetch timeout and
//! behind its own circuit breaker. A read that times out counts as a breaker
//! failure. [`MetricsCollector::collect`] never fails:
//! any read failure yields zero-valued metrics so downstream components fall
//! back to conservative thresholds.

use chrono::{DateTime, Utc};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::{AdmissionConfig, CollectorConfig};
use crate::constants::TaskStatus;
use crate::error::{AdmissionError, Result};
use crate::models::{Agent, ExecutionEvent, Goal, Task, WorkspaceMetrics};
use crate::orchestration::phase_classifier::PhaseClassifier;
use crate::resilience::{CircuitBreakerSnapshot, StoreCircuitBreaker};
use crate::stores::WorkspaceStores;

/// Raw store contents for one workspace
#[derive(Debug, Clone, Default)]
pub struct WorkspaceState {
    pub tasks: Vec<Task>,
    pub events: Vec<ExecutionEvent>,
    pub goals: Vec<Goal>,
    pub agents: Vec<Agent>,
}

#[derive(Debug)]
struct StoreBreakers {
    tasks: StoreCircuitBreaker,
    execution_log: StoreCircuitBreaker,
    goals: StoreCircuitBreaker,
    agents: StoreCircuitBreaker,
}

#[derive(Debug)]
pub struct MetricsCollector {
    stores: WorkspaceStores,
    classifier: PhaseClassifier,
    config: CollectorConfig,
    breakers: StoreBreakers,
}

impl MetricsCollector {
    pub fn new(stores: WorkspaceStores, config: &AdmissionConfig) -> Self {
        let breaker_config = config.circuit_breaker.clone();
        Self {
            stores,
            classifier: PhaseClassifier::new(),
            config: config.collector.clone(),
            breakers: StoreBreakers {
                tasks: StoreCircuitBreaker::new("task_store", breaker_config.clone()),
                execution_log: StoreCircuitBreaker::new("execution_log", breaker_config.clone()),
                goals: StoreCircuitBreaker::new("goal_store", breaker_config.clone()),
                agents: StoreCircuitBreaker::new("agent_store", breaker_config),
            },
        }
    }

    /// Collect metrics, degrading to zero-valued metrics on any failure
    pub async fn collect(&self, workspace_id: &str) -> WorkspaceMetrics {
        match self.try_collect(workspace_id).await {
            Ok(metrics) => metrics,
            Err(error) => {
                warn!(
                    workspace_id = %workspace_id,
                    error = %error,
                    error_kind = error.kind(),
                    "📉 METRICS: Collection failed, returning zero-valued metrics"
                );
                WorkspaceMetrics::empty(workspace_id)
            }
        }
    }

    /// Collect metrics, surfacing failures as `MetricsUnavailable`
    pub async fn try_collect(&self, workspace_id: &str) -> Result<WorkspaceMetrics> {
        let now = Utc::now();
        let since = now - self.config.event_window();

        let state = self
            .read_workspace(workspace_id, since)
            .await
            .map_err(|error| match error {
                AdmissionError::MetricsUnavailable(_) => error,
                other => AdmissionError::MetricsUnavailable(other.to_string()),
            })?;

        let metrics = self.build_metrics(workspace_id, &state, now);
        debug!(
            workspace_id = %workspace_id,
            total_tasks = metrics.total_tasks,
            pending = metrics.pending,
            skip_rate = metrics.skip_rate,
            phase = %metrics.phase,
            performance_score = metrics.performance_score,
            "📊 METRICS: Collected workspace metrics"
        );
        Ok(metrics)
    }

    /// Pending tasks, read under the same timeout and breaker as collection
    pub async fn try_pending_tasks(&self, workspace_id: &str) -> Result<Vec<Task>> {
        self.guarded_read(
            &self.breakers.tasks,
            workspace_id,
            self.stores.tasks.list_tasks(workspace_id, Some(TaskStatus::Pending)),
        )
        .await
        .map_err(|error| match error {
            AdmissionError::Timeout(message) => AdmissionError::MetricsUnavailable(message),
            other => other,
        })
    }

    /// Workspaces a balancing sweep should cover
    pub async fn try_active_workspaces(&self) -> Result<Vec<String>> {
        tokio::time::timeout(
            self.config.fetch_timeout(),
            self.stores.directory.list_active_workspaces(),
        )
        .await
        .map_err(|_| {
            AdmissionError::MetricsUnavailable(format!(
                "workspace directory exceeded {}ms",
                self.config.fetch_timeout_ms
            ))
        })?
    }

    pub fn stores(&self) -> &WorkspaceStores {
        &self.stores
    }

    async fn read_workspace(&self, workspace_id: &str, since: DateTime<Utc>) -> Result<WorkspaceState> {
        let stores = &self.stores;
        // join! rather than try_join!: every read settles so each breaker sees its outcome
        let (tasks, events, goals, agents) = tokio::join!(
            self.guarded_read(
                &self.breakers.tasks,
                workspace_id,
                stores.tasks.list_tasks(workspace_id, None),
            ),
            self.guarded_read(
                &self.breakers.execution_log,
                workspace_id,
                stores.execution_log.recent_events(workspace_id, since),
            ),
            self.guarded_read(
                &self.breakers.goals,
                workspace_id,
                stores.goals.list_goals(workspace_id),
            ),
            self.guarded_read(
                &self.breakers.agents,
                workspace_id,
                stores.agents.list_agents(workspace_id),
            ),
        );

        Ok(WorkspaceState {
            tasks: tasks?,
            events: events?,
            goals: goals?,
            agents: agents?,
        })
    }

    /// One store read under its breaker, bounded by the fetch timeout
    async fn guarded_read<T, Fut>(
        &self,
        breaker: &StoreCircuitBreaker,
        workspace_id: &str,
        read: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let fetch_timeout = self.config.fetch_timeout();
        let fetch_timeout_ms = self.config.fetch_timeout_ms;
        breaker
            .call(|| async move {
                tokio::time::timeout(fetch_timeout, read)
                    .await
                    .map_err(|_| {
                        AdmissionError::Timeout(format!(
                            "{} read for {workspace_id} exceeded {fetch_timeout_ms}ms",
                            breaker.name()
                        ))
                    })?
            })
            .await
    }

    /// Condense raw store contents into metrics. Pure; `now` bounds the recency window.
    pub fn build_metrics(
        &self,
        workspace_id: &str,
        state: &WorkspaceState,
        now: DateTime<Utc>,
    ) -> WorkspaceMetrics {
        let mut metrics = WorkspaceMetrics::empty(workspace_id);
        metrics.collected_at = now;
        metrics.total_tasks = state.tasks.len() as u64;

        let mut completion_hours = Vec::new();
        for task in &state.tasks {
            match task.status {
                TaskStatus::Pending => metrics.pending += 1,
                TaskStatus::InProgress => metrics.in_progress += 1,
                TaskStatus::Completed => {
                    metrics.completed += 1;
                    completion_hours.push(task.elapsed_hours());
                }
                TaskStatus::Failed => metrics.failed += 1,
            }
        }
        if !completion_hours.is_empty() {
            metrics.avg_completion_hours =
                completion_hours.iter().sum::<f64>() / completion_hours.len() as f64;
        }

        let window_start = now - self.config.event_window();
        let attempts: Vec<&ExecutionEvent> = state
            .events
            .iter()
            .filter(|event| event.occurred_at >= window_start)
            .collect();
        metrics.skip_count = attempts.iter().filter(|event| event.is_skip()).count() as u64;
        if !attempts.is_empty() {
            metrics.skip_rate = metrics.skip_count as f64 / attempts.len() as f64;
        }

        let progress: Vec<f64> = state.goals.iter().filter_map(Goal::progress).collect();
        if !progress.is_empty() {
            metrics.goal_completion_rate = progress.iter().sum::<f64>() / progress.len() as f64;
        }

        if !state.agents.is_empty() {
            let busy = state.agents.iter().filter(|agent| agent.is_busy()).count();
            metrics.agent_utilization = busy as f64 / state.agents.len() as f64;
        }

        let phase_inputs: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| !task.status.is_terminal() || task.updated_at >= window_start)
            .cloned()
            .collect();
        metrics.phase = self.classifier.classify(&phase_inputs);

        metrics.with_derived_fields(&self.config)
    }

    pub fn breaker_snapshots(&self) -> Vec<CircuitBreakerSnapshot> {
        vec![
            self.breakers.tasks.snapshot(),
            self.breakers.execution_log.snapshot(),
            self.breakers.goals.snapshot(),
            self.breakers.agents.snapshot(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AgentStatus, Bottleneck, Phase};
    use crate::models::ExecutionEventKind;
    use crate::stores::InMemoryWorkspaceStore;
    use chrono::Duration as ChronoDuration;
    use std::sync::Arc;
    use std::time::Duration;

    fn collector_for(store: Arc<InMemoryWorkspaceStore>) -> MetricsCollector {
        MetricsCollector::new(
            WorkspaceStores::from_backend(store),
            &AdmissionConfig::for_test(),
        )
    }

    async fn seed(store: &InMemoryWorkspaceStore) {
        let now = Utc::now();
        for i in 0..4 {
            store
                .add_task(Task::new("ws", format!("Implement module {i}")))
                .await;
        }
        store
            .add_task(
                Task::new("ws", "Build api")
                    .created_at(now - ChronoDuration::hours(4))
                    .updated_at(now - ChronoDuration::hours(2))
                    .with_status(TaskStatus::Completed),
            )
            .await;
        store
            .add_task(Task::new("ws", "Code review").with_status(TaskStatus::InProgress))
            .await;

        for kind in [
            ExecutionEventKind::Skipped,
            ExecutionEventKind::Executed,
            ExecutionEventKind::Executed,
            ExecutionEventKind::Failed,
        ] {
            store.record_event(ExecutionEvent::new("ws", kind)).await;
        }
        store
            .record_event(
                ExecutionEvent::new("ws", ExecutionEventKind::Skipped)
                    .at(now - ChronoDuration::hours(48)),
            )
            .await;

        store.add_goal(Goal::new("ws", "coverage", 5.0, 10.0)).await;
        store.add_goal(Goal::new("ws", "latency", 12.0, 10.0)).await;
        store.add_agent(Agent::new("a1", "ws", AgentStatus::Busy)).await;
        store.add_agent(Agent::new("a2", "ws", AgentStatus::Idle)).await;
    }

    #[tokio::test]
    async fn test_collect_computes_all_signals() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        seed(&store).await;
        let metrics = collector_for(store).collect("ws").await;

        assert_eq!(metrics.total_tasks, 6);
        assert_eq!(metrics.pending, 4);
        assert_eq!(metrics.in_progress, 1);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.skip_count, 1);
        assert!((metrics.skip_rate - 0.25).abs() < 1e-9);
        assert!((metrics.avg_completion_hours - 2.0).abs() < 0.01);
        assert!((metrics.goal_completion_rate - 0.75).abs() < 1e-9);
        assert!((metrics.agent_utilization - 0.5).abs() < 1e-9);
        assert_eq!(metrics.phase, Phase::Implementation);
        assert!(metrics.bottlenecks.is_empty());
        assert!(metrics.performance_score > 0.0);
    }

    #[tokio::test]
    async fn test_empty_workspace_has_zero_rates() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        let metrics = collector_for(store).collect("nothing").await;

        assert_eq!(metrics.total_tasks, 0);
        assert_eq!(metrics.skip_rate, 0.0);
        assert_eq!(metrics.goal_completion_rate, 0.0);
        assert_eq!(metrics.agent_utilization, 0.0);
        assert_eq!(metrics.phase, Phase::Planning);
        // no agents reads as zero utilization
        assert!(metrics.has_bottleneck(Bottleneck::LowAgentUtilization));
    }

    #[tokio::test]
    async fn test_store_failure_yields_zero_metrics() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        seed(&store).await;
        store.set_unavailable(true);
        let collector = collector_for(store);

        let error = collector.try_collect("ws").await.unwrap_err();
        assert!(matches!(error, AdmissionError::MetricsUnavailable(_)));

        let metrics = collector.collect("ws").await;
        assert_eq!(metrics.total_tasks, 0);
        assert_eq!(metrics.workspace_id, "ws");
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        seed(&store).await;
        store.set_read_delay(Duration::from_millis(400));
        let collector = collector_for(store);

        let error = collector.try_collect("ws").await.unwrap_err();
        assert!(matches!(error, AdmissionError::MetricsUnavailable(message) if message.contains("exceeded")));
    }

    #[tokio::test]
    async fn test_slow_reads_open_every_breaker() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        seed(&store).await;
        let mut config = AdmissionConfig::for_test();
        config.collector.fetch_timeout_ms = 20;
        store.set_read_delay(Duration::from_millis(100));
        let collector = MetricsCollector::new(WorkspaceStores::from_backend(store.clone()), &config);

        for _ in 0..config.circuit_breaker.failure_threshold {
            assert!(collector.try_collect("ws").await.is_err());
        }
        for snapshot in collector.breaker_snapshots() {
            assert_eq!(snapshot.state, crate::resilience::CircuitState::Open, "{}", snapshot.name);
            assert_eq!(snapshot.total_failures, config.circuit_breaker.failure_threshold as u64);
        }

        // open breakers reject without touching the store
        let reads_before = store.read_count();
        let started = std::time::Instant::now();
        let error = collector.try_collect("ws").await.unwrap_err();
        assert!(error.to_string().contains("Circuit breaker open"));
        assert!(started.elapsed() < Duration::from_millis(20));
        assert_eq!(store.read_count(), reads_before);
    }

    #[tokio::test]
    async fn test_slow_pending_read_counts_as_breaker_failure() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        seed(&store).await;
        let mut config = AdmissionConfig::for_test();
        config.collector.fetch_timeout_ms = 20;
        store.set_read_delay(Duration::from_millis(100));
        let collector = MetricsCollector::new(WorkspaceStores::from_backend(store), &config);

        let error = collector.try_pending_tasks("ws").await.unwrap_err();
        assert!(matches!(error, AdmissionError::MetricsUnavailable(message) if message.contains("exceeded")));
        assert_eq!(collector.breaker_snapshots()[0].total_failures, 1);
    }

    #[tokio::test]
    async fn test_repeated_failures_trip_breakers() {
        let store = Arc::new(InMemoryWorkspaceStore::new());
        store.set_unavailable(true);
        let collector = collector_for(store.clone());

        let attempts = 4 * AdmissionConfig::for_test().circuit_breaker.failure_threshold;
        for _ in 0..attempts {
            let error = collector.try_collect("ws").await.unwrap_err();
            assert!(matches!(error, AdmissionError::MetricsUnavailable(_)));
        }

        let open = collector
            .breaker_snapshots()
            .into_iter()
            .filter(|snapshot| snapshot.state == crate::resilience::CircuitState::Open)
            .count();
        assert!(open >= 1);
        assert!(store.read_count() > 0);
    }
}
