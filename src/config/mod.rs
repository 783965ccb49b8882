//! # Admission Engine Configuration
//!
//! Every constant the engine's heuristics depend on lives here so that it can
//! be tuned per environment without code changes. Load weights and the
//! skip-reduction estimate in particular are empirically chosen and expected
//! to be recalibrated from operational data.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasker_admission::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let ttl = manager.config().cache.ttl();
//! let base = manager.config().thresholds.base_max_pending;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants::{fallback, Phase};
use crate::error::{AdmissionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

pub use loader::ConfigManager;

/// Root configuration for the admission engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub thresholds: ThresholdConfig,
    pub fallback: FallbackConfig,
    pub risk: RiskConfig,
    pub load_balancer: LoadBalancerConfig,
    pub collector: CollectorConfig,
    pub cache: CacheConfig,
    pub admission: AdmissionDecisionConfig,
    pub engine: EngineConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Adaptive capacity limit calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub base_max_pending: u32,
    /// Workspaces with fewer tasks than this get fallback thresholds
    pub min_sample_size: u64,
    pub phase_transition_margin: u32,
    pub phase_multipliers: PhaseMultipliers,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            base_max_pending: 8,
            min_sample_size: 5,
            phase_transition_margin: 5,
            phase_multipliers: PhaseMultipliers::default(),
        }
    }
}

/// Capacity scaling per lifecycle phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseMultipliers {
    pub planning: f64,
    pub analysis: f64,
    pub implementation: f64,
    pub testing: f64,
    pub deployment: f64,
    pub maintenance: f64,
}

impl Default for PhaseMultipliers {
    fn default() -> Self {
        Self {
            planning: 1.2,
            analysis: 1.5,
            implementation: 2.0,
            testing: 1.8,
            deployment: 1.0,
            maintenance: 0.8,
        }
    }
}

impl PhaseMultipliers {
    pub fn for_phase(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Planning => self.planning,
            Phase::Analysis => self.analysis,
            Phase::Implementation => self.implementation,
            Phase::Testing => self.testing,
            Phase::Deployment => self.deployment,
            Phase::Maintenance => self.maintenance,
        }
    }
}

/// Conservative values applied when adaptive computation is impossible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub max_pending_tasks: u32,
    pub priority_boost_factor: f64,
    pub skip_prevention_threshold: f64,
    pub phase_transition_threshold: u32,
    pub urgency_multiplier: f64,
    pub quality_gate_threshold: f64,
    pub confidence_score: f64,
    /// Pending limit used when the admission decision itself fails
    pub admission_limit: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_pending_tasks: fallback::MAX_PENDING_TASKS,
            priority_boost_factor: fallback::PRIORITY_BOOST_FACTOR,
            skip_prevention_threshold: fallback::SKIP_PREVENTION_THRESHOLD,
            phase_transition_threshold: fallback::PHASE_TRANSITION_THRESHOLD,
            urgency_multiplier: fallback::URGENCY_MULTIPLIER,
            quality_gate_threshold: fallback::QUALITY_GATE_THRESHOLD,
            confidence_score: fallback::CONFIDENCE_SCORE,
            admission_limit: fallback::ADMISSION_LIMIT,
        }
    }
}

/// Per-task skip-risk scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub age_weight: f64,
    pub priority_weight: f64,
    pub load_weight: f64,
    pub goal_linkage_weight: f64,
    /// Queue age at which the age factor saturates
    pub age_saturation_hours: f64,
    /// Pending count at which the load factor saturates
    pub pending_saturation: u64,
    /// Factor value contributed by a task without goal linkage
    pub unlinked_goal_penalty: f64,
    pub high_risk_threshold: f64,
    /// Estimated skip-rate reduction per applied priority adjustment
    pub skip_reduction_per_adjustment: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            age_weight: 0.3,
            priority_weight: 0.2,
            load_weight: 0.3,
            goal_linkage_weight: 0.2,
            age_saturation_hours: 24.0,
            pending_saturation: 20,
            unlinked_goal_penalty: 0.5,
            high_risk_threshold: 0.6,
            skip_reduction_per_adjustment: 0.1,
        }
    }
}

/// Cross-workspace load balancing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub pending_weight: f64,
    pub skip_weight: f64,
    pub idle_weight: f64,
    pub pending_saturation: u64,
    /// Scores above `overload_factor * average` are overloaded
    pub overload_factor: f64,
    /// Scores below `underload_factor * average` are underutilized
    pub underload_factor: f64,
    /// Share of overloaded workspaces that triggers a global alert
    pub overloaded_share_alert: f64,
    pub skip_rate_alert: f64,
    pub interval_seconds: u64,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            pending_weight: 0.4,
            skip_weight: 0.4,
            idle_weight: 0.2,
            pending_saturation: 20,
            overload_factor: 1.5,
            underload_factor: 0.5,
            overloaded_share_alert: 0.3,
            skip_rate_alert: 0.4,
            interval_seconds: 300,
        }
    }
}

impl LoadBalancerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Workspace metrics collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub event_window_hours: i64,
    pub fetch_timeout_ms: u64,
    pub skip_rate_trigger: f64,
    pub queue_overflow_trigger: u64,
    pub low_utilization_trigger: f64,
    pub stuck_tasks_trigger: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            event_window_hours: 24,
            fetch_timeout_ms: 1500,
            skip_rate_trigger: 0.5,
            queue_overflow_trigger: 20,
            low_utilization_trigger: 0.3,
            stuck_tasks_trigger: 5,
        }
    }
}

impl CollectorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn event_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.event_window_hours)
    }
}

/// Threshold cache behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
    /// How long a published metrics snapshot may stand in for a full collect
    pub metrics_freshness_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 1800,
            max_entries: 10_000,
            metrics_freshness_seconds: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn metrics_freshness(&self) -> Duration {
        Duration::from_secs(self.metrics_freshness_seconds)
    }
}

/// Admission decision parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionDecisionConfig {
    pub decision_timeout_ms: u64,
    pub critical_headroom: u32,
    pub critical_confidence: f64,
    pub adaptive_confidence: f64,
    pub fallback_confidence: f64,
}

impl Default for AdmissionDecisionConfig {
    fn default() -> Self {
        Self {
            decision_timeout_ms: 2000,
            critical_headroom: 5,
            critical_confidence: 0.9,
            adaptive_confidence: 0.8,
            fallback_confidence: 0.5,
        }
    }
}

impl AdmissionDecisionConfig {
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_millis(self.decision_timeout_ms)
    }
}

/// Engine-level concurrency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum workspaces evaluated concurrently during a balancing sweep
    pub worker_pool_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 8,
        }
    }
}

/// Circuit breaker guarding store reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 30,
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl AdmissionConfig {
    /// Test-optimized configuration with short TTLs and timeouts
    pub fn for_test() -> Self {
        let mut config = Self::default();
        config.collector.fetch_timeout_ms = 200;
        config.admission.decision_timeout_ms = 500;
        config.cache.ttl_seconds = 5;
        config.cache.max_entries = 100;
        config.cache.metrics_freshness_seconds = 1;
        config.load_balancer.interval_seconds = 1;
        config.engine.worker_pool_size = 4;
        config.circuit_breaker.timeout_seconds = 1;
        config
    }

    /// Development configuration with faster feedback than production
    pub fn for_development() -> Self {
        let mut config = Self::default();
        config.cache.ttl_seconds = 300;
        config.cache.max_entries = 1000;
        config.cache.metrics_freshness_seconds = 60;
        config.load_balancer.interval_seconds = 60;
        config
    }

    /// Preset for a named environment
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "test" => Self::for_test(),
            "development" => Self::for_development(),
            _ => Self::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        fn invalid(message: impl Into<String>) -> AdmissionError {
            AdmissionError::ConfigurationError(message.into())
        }

        if self.thresholds.base_max_pending == 0 {
            return Err(invalid("thresholds.base_max_pending must be at least 1"));
        }

        let multipliers = &self.thresholds.phase_multipliers;
        for phase in Phase::ALL {
            let multiplier = multipliers.for_phase(phase);
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(invalid(format!(
                    "thresholds.phase_multipliers.{phase} must be positive"
                )));
            }
        }

        if self.fallback.max_pending_tasks == 0 || self.fallback.admission_limit == 0 {
            return Err(invalid("fallback limits must be at least 1"));
        }
        if self.fallback.phase_transition_threshold < self.fallback.max_pending_tasks {
            return Err(invalid(
                "fallback.phase_transition_threshold must be >= fallback.max_pending_tasks",
            ));
        }

        let risk_weights = self.risk.age_weight
            + self.risk.priority_weight
            + self.risk.load_weight
            + self.risk.goal_linkage_weight;
        if (risk_weights - 1.0).abs() > 1e-6 {
            return Err(invalid(format!(
                "risk weights must sum to 1.0 (got {risk_weights:.3})"
            )));
        }
        if self.risk.age_saturation_hours <= 0.0 || self.risk.pending_saturation == 0 {
            return Err(invalid("risk saturation points must be positive"));
        }
        if !(0.0..=1.0).contains(&self.risk.high_risk_threshold) {
            return Err(invalid("risk.high_risk_threshold must be between 0.0 and 1.0"));
        }
        if self.risk.skip_reduction_per_adjustment < 0.0 {
            return Err(invalid("risk.skip_reduction_per_adjustment must not be negative"));
        }

        let load_weights = self.load_balancer.pending_weight
            + self.load_balancer.skip_weight
            + self.load_balancer.idle_weight;
        if (load_weights - 1.0).abs() > 1e-6 {
            return Err(invalid(format!(
                "load_balancer weights must sum to 1.0 (got {load_weights:.3})"
            )));
        }
        if self.load_balancer.pending_saturation == 0 {
            return Err(invalid("load_balancer.pending_saturation must be positive"));
        }
        if self.load_balancer.overload_factor <= 1.0
            || self.load_balancer.underload_factor <= 0.0
            || self.load_balancer.underload_factor >= 1.0
        {
            return Err(invalid(
                "load_balancer requires overload_factor > 1.0 and 0.0 < underload_factor < 1.0",
            ));
        }
        if self.load_balancer.interval_seconds == 0 {
            return Err(invalid("load_balancer.interval_seconds must be greater than 0"));
        }

        if self.collector.fetch_timeout_ms == 0 || self.collector.event_window_hours <= 0 {
            return Err(invalid("collector timeout and event window must be positive"));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(invalid("cache.ttl_seconds must be greater than 0"));
        }
        if self.cache.max_entries == 0 {
            warn!("Threshold cache max_entries is 0 - caching effectively disabled");
        }

        if self.admission.decision_timeout_ms == 0 {
            return Err(invalid("admission.decision_timeout_ms must be greater than 0"));
        }
        if self.admission.decision_timeout_ms < self.collector.fetch_timeout_ms {
            warn!(
                decision_timeout_ms = self.admission.decision_timeout_ms,
                fetch_timeout_ms = self.collector.fetch_timeout_ms,
                "Decision timeout is shorter than the metrics fetch timeout"
            );
        }

        if self.engine.worker_pool_size == 0 {
            return Err(invalid("engine.worker_pool_size must be at least 1"));
        }

        if self.circuit_breaker.failure_threshold == 0
            || self.circuit_breaker.success_threshold == 0
        {
            return Err(invalid("circuit_breaker thresholds must be at least 1"));
        }

        Ok(())
    }

    /// Log current configuration for debugging
    pub fn log_configuration(&self) {
        info!("Admission Engine Configuration:");
        info!(
            "  Thresholds: base {} pending, min sample {} tasks",
            self.thresholds.base_max_pending, self.thresholds.min_sample_size
        );
        info!(
            "  Cache: {}s TTL, {} max entries, metrics fresh for {}s",
            self.cache.ttl_seconds, self.cache.max_entries, self.cache.metrics_freshness_seconds
        );
        info!(
            "  Admission: {}ms decision timeout, {}ms fetch timeout",
            self.admission.decision_timeout_ms, self.collector.fetch_timeout_ms
        );
        info!(
            "  Load balancer: every {}s, weights {:.2}/{:.2}/{:.2}",
            self.load_balancer.interval_seconds,
            self.load_balancer.pending_weight,
            self.load_balancer.skip_weight,
            self.load_balancer.idle_weight
        );
        info!("  Worker pool: {}", self.engine.worker_pool_size);
    }
}
