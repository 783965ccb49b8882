//! Latest metrics snapshot per workspace, as published by collection sweeps
//! and caller feedback. The load balancer reads from here instead of hitting
//! the stores, and the threshold path prefers a fresh entry over a collect.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::models::WorkspaceMetrics;

#[derive(Debug, Clone)]
pub struct PublishedSnapshot {
    pub metrics: WorkspaceMetrics,
    pub published_at: DateTime<Utc>,
    observed: Instant,
}

impl PublishedSnapshot {
    pub fn age(&self) -> Duration {
        self.observed.elapsed()
    }
}

#[derive(Debug)]
pub struct PublishedMetrics {
    snapshots: DashMap<String, PublishedSnapshot>,
    freshness: Duration,
}

impl PublishedMetrics {
    pub fn new(freshness: Duration) -> Self {
        Self {
            snapshots: DashMap::new(),
            freshness,
        }
    }

    pub fn publish(&self, metrics: WorkspaceMetrics) {
        self.snapshots.insert(
            metrics.workspace_id.clone(),
            PublishedSnapshot {
                metrics,
                published_at: Utc::now(),
                observed: Instant::now(),
            },
        );
    }

    /// Latest snapshot regardless of age
    pub fn latest(&self, workspace_id: &str) -> Option<PublishedSnapshot> {
        self.snapshots
            .get(workspace_id)
            .map(|snapshot| snapshot.value().clone())
    }

    /// Latest metrics if published within the freshness window
    pub fn fresh(&self, workspace_id: &str) -> Option<WorkspaceMetrics> {
        self.snapshots
            .get(workspace_id)
            .filter(|snapshot| snapshot.age() < self.freshness)
            .map(|snapshot| snapshot.metrics.clone())
    }

    pub fn remove(&self, workspace_id: &str) -> bool {
        self.snapshots.remove(workspace_id).is_some()
    }

    pub fn workspace_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .snapshots
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
