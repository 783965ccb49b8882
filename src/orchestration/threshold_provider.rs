//! # Threshold Provider
//!
//! Cache-or-compute access to a workspace's thresholds. A cached value is
//! returned unchanged (same `calculated_at`) until its TTL runs out or a
//! refresh is requested. Otherwise metrics come from the published registry
//! when fresh enough, or from a full collect.
//!
//! A computation that is cancelled mid-flight never touches the cache; the
//! only write is the final insert of a complete value.

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::AdmissionConfig;
use crate::error::{AdmissionError, Result};
use crate::models::{AdaptiveThresholds, WorkspaceMetrics};
use crate::orchestration::metrics_collector::MetricsCollector;
use crate::orchestration::optimization_cache::{CacheStats, OptimizationCache};
use crate::orchestration::published_metrics::PublishedMetrics;
use crate::orchestration::threshold_calculator::ThresholdCalculator;

#[derive(Debug)]
pub struct ThresholdProvider {
    collector: Arc<MetricsCollector>,
    calculator: ThresholdCalculator,
    cache: OptimizationCache<AdaptiveThresholds>,
    published: Arc<PublishedMetrics>,
}

impl ThresholdProvider {
    pub fn new(
        collector: Arc<MetricsCollector>,
        published: Arc<PublishedMetrics>,
        config: &AdmissionConfig,
    ) -> Self {
        Self {
            collector,
            calculator: ThresholdCalculator::new(config),
            cache: OptimizationCache::new(config.cache.ttl(), config.cache.max_entries),
            published,
        }
    }

    /// Thresholds for a workspace; never fails.
    ///
    /// When the stores are unreadable the fallback thresholds are returned and
    /// left uncached, so the next call retries collection.
    pub async fn thresholds_for(&self, workspace_id: &str, refresh: bool) -> AdaptiveThresholds {
        match self.try_thresholds_for(workspace_id, refresh).await {
            Ok(thresholds) => thresholds,
            Err(error) => {
                if error.is_metrics_failure() {
                    warn!(
                        workspace_id = %workspace_id,
                        error = %error,
                        error_kind = error.kind(),
                        "🎯 THRESHOLDS: Metrics unavailable, using uncached fallback thresholds"
                    );
                } else {
                    error!(
                        workspace_id = %workspace_id,
                        error = %error,
                        error_kind = error.kind(),
                        "🎯 THRESHOLDS: Threshold lookup failed, using uncached fallback thresholds"
                    );
                }
                self.calculator.fallback(workspace_id)
            }
        }
    }

    pub async fn try_thresholds_for(
        &self,
        workspace_id: &str,
        refresh: bool,
    ) -> Result<AdaptiveThresholds> {
        if !refresh {
            if let Some(cached) = self.cache.get(workspace_id) {
                match validate_cached(workspace_id, cached) {
                    Ok(cached) => {
                        debug!(workspace_id = %workspace_id, "🎯 THRESHOLDS: Cache hit");
                        return Ok(cached);
                    }
                    Err(error) => {
                        warn!(
                            workspace_id = %workspace_id,
                            error = %error,
                            "🎯 THRESHOLDS: Discarding cached thresholds"
                        );
                        self.cache.invalidate(workspace_id);
                    }
                }
            }
        }

        let metrics = self.current_metrics(workspace_id).await?;
        let thresholds = self.calculator.calculate(&metrics, metrics.phase);
        self.cache.set(workspace_id, thresholds.clone());
        Ok(thresholds)
    }

    /// Fresh published metrics, or a full collect that is then published
    pub async fn current_metrics(&self, workspace_id: &str) -> Result<WorkspaceMetrics> {
        if let Some(metrics) = self.published.fresh(workspace_id) {
            debug!(workspace_id = %workspace_id, "📊 METRICS: Using published snapshot");
            return Ok(metrics);
        }

        let metrics = self.collector.try_collect(workspace_id).await?;
        self.published.publish(metrics.clone());
        Ok(metrics)
    }

    /// Cached thresholds without computing anything
    pub fn cached(&self, workspace_id: &str) -> Option<AdaptiveThresholds> {
        self.cache.get(workspace_id)
    }

    pub fn invalidate(&self, workspace_id: &str) -> bool {
        self.cache.invalidate(workspace_id)
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn calculator(&self) -> &ThresholdCalculator {
        &self.calculator
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }
}

/// A cached entry must belong to the requested workspace and already satisfy
/// the threshold invariants
fn validate_cached(workspace_id: &str, cached: AdaptiveThresholds) -> Result<AdaptiveThresholds> {
    if cached.workspace_id != workspace_id {
        return Err(AdmissionError::CacheStale(format!(
            "entry for {workspace_id} holds thresholds of {}",
            cached.workspace_id
        )));
    }
    if cached.clone().normalized() != cached {
        return Err(AdmissionError::CacheStale(format!(
            "entry for {workspace_id} violates threshold invariants"
        )));
    }
    Ok(cached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::stores::{InMemoryWorkspaceStore, WorkspaceStores};

    async fn provider_with_tasks(count: usize) -> (ThresholdProvider, Arc<InMemoryWorkspaceStore>) {
        let config = AdmissionConfig::for_test();
        let store = Arc::new(InMemoryWorkspaceStore::new());
        for i in 0..count {
            store.add_task(Task::new("ws", format!("Implement part {i}"))).await;
        }
        let collector = Arc::new(MetricsCollector::new(
            WorkspaceStores::from_backend(store.clone()),
            &config,
        ));
        let published = Arc::new(PublishedMetrics::new(config.cache.metrics_freshness()));
        (ThresholdProvider::new(collector, published, &config), store)
    }

    #[tokio::test]
    async fn test_cached_thresholds_are_identical() {
        let (provider, store) = provider_with_tasks(8).await;

        let first = provider.thresholds_for("ws", false).await;
        let reads = store.read_count();
        let second = provider.thresholds_for("ws", false).await;

        assert_eq!(first, second);
        assert_eq!(first.calculated_at, second.calculated_at);
        assert_eq!(store.read_count(), reads);
        assert_eq!(provider.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_refresh_recomputes() {
        let (provider, _store) = provider_with_tasks(8).await;

        let first = provider.thresholds_for("ws", false).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let refreshed = provider.thresholds_for("ws", true).await;

        assert!(refreshed.calculated_at > first.calculated_at);
        assert_eq!(provider.cached("ws"), Some(refreshed));
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let (provider, store) = provider_with_tasks(8).await;
        store.set_unavailable(true);

        let thresholds = provider.thresholds_for("ws", false).await;
        assert!(thresholds.is_fallback);
        assert!(provider.cached("ws").is_none());

        store.set_unavailable(false);
        let recovered = provider.thresholds_for("ws", false).await;
        assert!(!recovered.is_fallback);
    }

    #[tokio::test]
    async fn test_published_metrics_short_circuit_collection() {
        let (provider, store) = provider_with_tasks(0).await;
        provider.published.publish(WorkspaceMetrics {
            total_tasks: 12,
            pending: 4,
            performance_score: 0.5,
            ..WorkspaceMetrics::empty("ws")
        });

        let thresholds = provider.thresholds_for("ws", false).await;
        assert!(!thresholds.is_fallback);
        assert_eq!(store.read_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_cache_entry_is_discarded() {
        let (provider, _store) = provider_with_tasks(8).await;
        provider.cache.set(
            "ws",
            AdaptiveThresholds::fallback("other", &AdmissionConfig::default().fallback),
        );

        let thresholds = provider.thresholds_for("ws", false).await;
        assert_eq!(thresholds.workspace_id, "ws");
        assert!(!thresholds.is_fallback);
        assert_eq!(provider.cached("ws"), Some(thresholds));
    }
}
