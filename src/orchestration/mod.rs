//! # Orchestration
//!
//! The admission and prioritization control loop.
//!
//! ## Core Components
//!
//! - **MetricsCollector**: reads workspace state into a `WorkspaceMetrics` snapshot
//! - **PhaseClassifier**: infers the lifecycle phase from task wording
//! - **ThresholdCalculator**: metrics and phase to `AdaptiveThresholds`
//! - **ThresholdProvider**: cache-or-compute access to thresholds
//! - **OptimizationCache**: per-workspace TTL cache
//! - **PublishedMetrics**: latest snapshot per workspace, shared with the balancer
//! - **RiskScorer**: per-task skip risk and priority boosts
//! - **AdmissionController**: proceed/defer decisions
//! - **ThroughputOptimizer**: categorised workspace recommendations
//! - **LoadBalancer**: cross-workspace ranking and rebalancing
//! - **AdaptiveOrchestrationEngine**: wires the above together
//!
//! ## Data Flow
//!
//! ```text
//! stores -> MetricsCollector -> PublishedMetrics
//!                  |                  |
//!                  v                  v
//!          ThresholdCalculator    LoadBalancer (periodic sweep)
//!                  |
//!          OptimizationCache
//!                  |
//!          AdmissionController -> OrchestrationRecommendation
//! ```

pub mod admission_controller;
pub mod engine;
pub mod load_balancer;
pub mod metrics_collector;
pub mod optimization_cache;
pub mod phase_classifier;
pub mod published_metrics;
pub mod risk_scorer;
pub mod threshold_calculator;
pub mod threshold_provider;
pub mod throughput_optimizer;

pub use admission_controller::AdmissionController;
pub use engine::AdaptiveOrchestrationEngine;
pub use load_balancer::LoadBalancer;
pub use metrics_collector::{MetricsCollector, WorkspaceState};
pub use optimization_cache::{CacheStats, OptimizationCache};
pub use phase_classifier::PhaseClassifier;
pub use published_metrics::{PublishedMetrics, PublishedSnapshot};
pub use risk_scorer::RiskScorer;
pub use threshold_calculator::ThresholdCalculator;
pub use threshold_provider::ThresholdProvider;
pub use throughput_optimizer::ThroughputOptimizer;
