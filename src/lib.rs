#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Admission
//!
//! Adaptive admission control and prioritization for multi-tenant task
//! orchestration.
//!
//! ## Overview
//!
//! For every workspace the engine decides whether a pending task may proceed
//! now or should wait, which pending tasks risk being skipped indefinitely, and
//! how load is spread across workspaces. Capacity limits are recomputed from
//! observed throughput, skip and goal-completion signals rather than fixed.
//!
//! ## Key Features
//!
//! - **Adaptive limits**: queue capacity scales with lifecycle phase and workspace performance
//! - **Total public API**: store outages, timeouts and bad data degrade to conservative fallbacks
//! - **Skip prevention**: per-task risk scoring with priority boost proposals
//! - **Cross-workspace balancing**: periodic ranking with load-shedding recommendations
//! - **TTL caching**: thresholds are cached per workspace and refreshed on demand
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Metrics, thresholds, admission, risk and balancing components
//! - [`models`] - Inputs read from the stores and outputs returned to callers
//! - [`stores`] - Store traits and an in-memory implementation
//! - [`config`] - Configuration with environment presets and YAML loading
//! - [`resilience`] - Circuit breaking for store reads
//! - [`error`] - Error taxonomy
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tasker_admission::{
//!     AdaptiveOrchestrationEngine, AdmissionConfig, InMemoryWorkspaceStore, TaskMetadata,
//!     WorkspaceStores,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryWorkspaceStore::new());
//! let engine = AdaptiveOrchestrationEngine::new(
//!     WorkspaceStores::from_backend(store),
//!     AdmissionConfig::default(),
//! )?;
//!
//! let critical = engine
//!     .get_orchestration_recommendation("ws-1", 40, TaskMetadata::critical())
//!     .await;
//! assert!(critical.should_proceed);
//! assert_eq!(critical.recommended_limit, 45);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod resilience;
pub mod stores;

pub use config::{AdmissionConfig, ConfigManager};
pub use constants::{AgentStatus, Bottleneck, Phase, TaskPriority, TaskStatus};
pub use error::{AdmissionError, Result};
pub use models::{
    AdaptiveThresholds, LoadBalancingReport, OrchestrationRecommendation, SkipPreventionReport,
    TaskMetadata, TaskRiskAssessment, ThroughputOptimization, WorkspaceMetrics,
};
pub use orchestration::AdaptiveOrchestrationEngine;
pub use stores::{InMemoryWorkspaceStore, WorkspaceStores};
