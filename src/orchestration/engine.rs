//! # Adaptive Orchestration Engine
//!
//! Public entry point of the crate. Owns every component and exposes the
//! operations callers use:
//!
//! - [`get_orchestration_recommendation`](AdaptiveOrchestrationEngine::get_orchestration_recommendation)
//! - [`optimize_workspace_throughput`](AdaptiveOrchestrationEngine::optimize_workspace_throughput)
//! - [`adaptive_skip_prevention`](AdaptiveOrchestrationEngine::adaptive_skip_prevention)
//! - [`cross_workspace_load_balancing`](AdaptiveOrchestrationEngine::cross_workspace_load_balancing)
//! - [`update_workspace_metrics`](AdaptiveOrchestrationEngine::update_workspace_metrics)
//!
//! None of these return errors. Store failures, timeouts and computation
//! faults all degrade to fallback values with lower confidence.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tasker_admission::config::AdmissionConfig;
//! use tasker_admission::models::{Task, TaskMetadata};
//! use tasker_admission::orchestration::AdaptiveOrchestrationEngine;
//! use tasker_admission::stores::{InMemoryWorkspaceStore, WorkspaceStores};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryWorkspaceStore::new());
//! store.add_task(Task::new("ws-1", "Implement search")).await;
//!
//! let engine = AdaptiveOrchestrationEngine::new(
//!     WorkspaceStores::from_backend(store),
//!     AdmissionConfig::for_test(),
//! )?;
//! let recommendation = engine
//!     .get_orchestration_recommendation("ws-1", 3, TaskMetadata::default())
//!     .await;
//! assert!(recommendation.should_proceed);
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AdmissionConfig, ConfigManager};
use crate::error::Result;
use crate::models::{
    AdaptiveThresholds, LoadBalancingReport, OrchestrationRecommendation, SkipPreventionReport,
    TaskMetadata, ThroughputOptimization, WorkspaceMetrics,
};
use crate::orchestration::admission_controller::AdmissionController;
use crate::orchestration::load_balancer::LoadBalancer;
use crate::orchestration::metrics_collector::MetricsCollector;
use crate::orchestration::optimization_cache::CacheStats;
use crate::orchestration::published_metrics::PublishedMetrics;
use crate::orchestration::risk_scorer::RiskScorer;
use crate::orchestration::threshold_provider::ThresholdProvider;
use crate::orchestration::throughput_optimizer::ThroughputOptimizer;
use crate::resilience::CircuitBreakerSnapshot;
use crate::stores::WorkspaceStores;

#[derive(Debug)]
pub struct AdaptiveOrchestrationEngine {
    config: AdmissionConfig,
    collector: Arc<MetricsCollector>,
    published: Arc<PublishedMetrics>,
    provider: Arc<ThresholdProvider>,
    controller: AdmissionController,
    risk_scorer: RiskScorer,
    optimizer: ThroughputOptimizer,
    balancer: LoadBalancer,
    /// Bounds concurrent workspace collections during a sweep
    worker_pool: Arc<Semaphore>,
    latest_report: RwLock<Option<LoadBalancingReport>>,
    shutdown_notify: Arc<Notify>,
    loop_running: AtomicBool,
}

impl AdaptiveOrchestrationEngine {
    pub fn new(stores: WorkspaceStores, config: AdmissionConfig) -> Result<Self> {
        config.validate()?;
        config.log_configuration();

        let context = stores.context.clone();
        let collector = Arc::new(MetricsCollector::new(stores, &config));
        let published = Arc::new(PublishedMetrics::new(config.cache.metrics_freshness()));
        let provider = Arc::new(ThresholdProvider::new(
            collector.clone(),
            published.clone(),
            &config,
        ));

        info!(
            worker_pool_size = config.engine.worker_pool_size,
            context_provider = context.is_some(),
            "🏗️ ENGINE: Creating adaptive orchestration engine"
        );

        Ok(Self {
            controller: AdmissionController::new(provider.clone(), &config),
            risk_scorer: RiskScorer::new(config.risk.clone()),
            optimizer: ThroughputOptimizer::new(context, config.collector.fetch_timeout()),
            balancer: LoadBalancer::new(config.load_balancer.clone()),
            worker_pool: Arc::new(Semaphore::new(config.engine.worker_pool_size)),
            latest_report: RwLock::new(None),
            shutdown_notify: Arc::new(Notify::new()),
            loop_running: AtomicBool::new(false),
            collector,
            published,
            provider,
            config,
        })
    }

    pub fn from_config_manager(stores: WorkspaceStores, manager: &ConfigManager) -> Result<Self> {
        Self::new(stores, manager.config().clone())
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Admission decision for a task about to enter `workspace_id`
    pub async fn get_orchestration_recommendation(
        &self,
        workspace_id: &str,
        current_pending: u32,
        metadata: TaskMetadata,
    ) -> OrchestrationRecommendation {
        self.controller
            .decide(workspace_id, current_pending, metadata)
            .await
    }

    /// Thresholds plus categorised recommendations for one workspace
    pub async fn optimize_workspace_throughput(&self, workspace_id: &str) -> ThroughputOptimization {
        let thresholds = self.provider.thresholds_for(workspace_id, false).await;
        let metrics = self.metrics_or_empty(workspace_id).await;
        self.optimizer.optimize(&metrics, thresholds).await
    }

    /// Score pending tasks and propose boosts for those at risk of being skipped
    pub async fn adaptive_skip_prevention(&self, workspace_id: &str) -> SkipPreventionReport {
        let metrics = self.metrics_or_empty(workspace_id).await;
        let pending = match self.collector.try_pending_tasks(workspace_id).await {
            Ok(tasks) => tasks,
            Err(error) => {
                warn!(
                    workspace_id = %workspace_id,
                    error = %error,
                    "🛟 SKIP_PREVENTION: Pending tasks unavailable, scoring nothing"
                );
                Vec::new()
            }
        };
        self.risk_scorer
            .prevention_report(&metrics, &pending, Utc::now())
    }

    /// One balancing sweep across every active workspace.
    ///
    /// Covers the directory's active workspaces plus any with published
    /// metrics. Published snapshots are used where fresh; missing ones are collected
    /// through the worker pool. The report is retained for
    /// [`latest_load_report`](Self::latest_load_report).
    pub async fn cross_workspace_load_balancing(&self) -> LoadBalancingReport {
        let mut workspace_ids = match self.collector.try_active_workspaces().await {
            Ok(ids) => ids,
            Err(error) => {
                warn!(
                    error = %error,
                    "⚖️ BALANCER: Workspace directory unavailable, using published workspaces only"
                );
                Vec::new()
            }
        };
        // workspaces that pushed metrics count as active too
        workspace_ids.extend(self.published.workspace_ids());
        workspace_ids.sort();
        workspace_ids.dedup();

        let sweeps = workspace_ids
            .iter()
            .map(|workspace_id| self.sweep_metrics(workspace_id));
        let all_metrics: Vec<WorkspaceMetrics> = futures::future::join_all(sweeps).await;

        let report = self.balancer.rebalance(&all_metrics);
        *self.latest_report.write() = Some(report.clone());
        report
    }

    /// Push externally observed metrics instead of waiting for a collect.
    ///
    /// Values are clamped, bottlenecks recomputed, and the performance score
    /// derived when the caller left it at zero. Cached thresholds for the
    /// workspace are dropped so the next decision uses these metrics.
    pub fn update_workspace_metrics(&self, workspace_id: &str, observed: WorkspaceMetrics) {
        let supplied_score = observed.performance_score;
        let mut metrics = WorkspaceMetrics {
            workspace_id: workspace_id.to_string(),
            collected_at: Utc::now(),
            ..observed
        }
        .sanitized();
        metrics.bottlenecks = metrics.detect_bottlenecks(&self.config.collector);
        if !(supplied_score.is_finite() && supplied_score > 0.0) {
            metrics.performance_score = metrics.compute_performance_score();
        }

        info!(
            workspace_id = %workspace_id,
            total_tasks = metrics.total_tasks,
            pending = metrics.pending,
            skip_rate = metrics.skip_rate,
            performance_score = metrics.performance_score,
            "📥 METRICS: Observed metrics published"
        );

        self.published.publish(metrics);
        self.provider.invalidate(workspace_id);
    }

    /// Recompute thresholds now, replacing any cached value
    pub async fn refresh_workspace_thresholds(&self, workspace_id: &str) -> AdaptiveThresholds {
        self.provider.thresholds_for(workspace_id, true).await
    }

    /// Drop cached thresholds and published metrics for a workspace
    pub fn invalidate_workspace(&self, workspace_id: &str) -> bool {
        let cached = self.provider.invalidate(workspace_id);
        let published = self.published.remove(workspace_id);
        cached || published
    }

    pub fn latest_load_report(&self) -> Option<LoadBalancingReport> {
        self.latest_report.read().clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.provider.cache_stats()
    }

    pub fn purge_expired(&self) -> usize {
        self.provider.purge_expired()
    }

    pub fn breaker_snapshots(&self) -> Vec<CircuitBreakerSnapshot> {
        self.collector.breaker_snapshots()
    }

    pub fn is_balancing_loop_running(&self) -> bool {
        self.loop_running.load(Ordering::Acquire)
    }

    /// Run a balancing sweep every `load_balancer.interval_seconds` until
    /// [`shutdown`](Self::shutdown). Returns `None` if a loop is already running.
    pub fn spawn_load_balancing_loop(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.loop_running.swap(true, Ordering::AcqRel) {
            warn!("⚖️ BALANCER: Load balancing loop already running");
            return None;
        }

        let engine = Arc::clone(self);
        let interval = self.config.load_balancer.interval();
        info!(
            interval_seconds = self.config.load_balancer.interval_seconds,
            "🔄 BALANCER: Starting load balancing loop"
        );

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let report = engine.cross_workspace_load_balancing().await;
                        let purged = engine.purge_expired();
                        debug!(
                            workspaces = report.workspace_count,
                            recommendations = report.recommendations.len(),
                            purged_cache_entries = purged,
                            "BALANCER: Periodic sweep finished"
                        );
                    }
                    _ = engine.shutdown_notify.notified() => {
                        info!("Load balancing loop shutting down");
                        break;
                    }
                }
            }
        }))
    }

    /// Stop the balancing loop; a no-op when none is running
    pub fn shutdown(&self) {
        if self.loop_running.swap(false, Ordering::AcqRel) {
            info!("🛑 ENGINE: Stopping load balancing loop");
            // stores a permit if the loop is mid-sweep
            self.shutdown_notify.notify_one();
        }
    }

    async fn metrics_or_empty(&self, workspace_id: &str) -> WorkspaceMetrics {
        match self.provider.current_metrics(workspace_id).await {
            Ok(metrics) => metrics,
            Err(error) => {
                warn!(
                    workspace_id = %workspace_id,
                    error = %error,
                    error_kind = error.kind(),
                    "📉 METRICS: Using zero-valued metrics"
                );
                WorkspaceMetrics::empty(workspace_id)
            }
        }
    }

    async fn sweep_metrics(&self, workspace_id: &str) -> WorkspaceMetrics {
        if let Some(metrics) = self.published.fresh(workspace_id) {
            return metrics;
        }

        let _permit = match self.worker_pool.acquire().await {
            Ok(permit) => permit,
            Err(_) => return WorkspaceMetrics::empty(workspace_id),
        };

        match self.collector.try_collect(workspace_id).await {
            Ok(metrics) => {
                self.published.publish(metrics.clone());
                metrics
            }
            Err(error) => {
                warn!(
                    workspace_id = %workspace_id,
                    error = %error,
                    "⚖️ BALANCER: Collection failed, ranking with zero-valued metrics"
                );
                WorkspaceMetrics::empty(workspace_id)
            }
        }
    }
}
