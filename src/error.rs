//! Error types for the admission engine.
//!
//! Every error here is recoverable from the caller's point of view: the public
//! engine functions convert them into fallback thresholds or a fallback
//! recommendation, so they only surface through the `try_*` component APIs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error("Metrics unavailable: {0}")]
    MetricsUnavailable(String),
    #[error("Insufficient data: {total_tasks} tasks (minimum {minimum})")]
    InsufficientData { total_tasks: u64, minimum: u64 },
    #[error("Computation error: {0}")]
    ComputationError(String),
    #[error("Cache stale or corrupt: {0}")]
    CacheStale(String),
    #[error("Timeout error: {0}")]
    Timeout(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AdmissionError {
    /// Stable label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionError::MetricsUnavailable(_) => "metrics_unavailable",
            AdmissionError::InsufficientData { .. } => "insufficient_data",
            AdmissionError::ComputationError(_) => "computation_error",
            AdmissionError::CacheStale(_) => "cache_stale",
            AdmissionError::Timeout(_) => "timeout",
            AdmissionError::StoreError(_) => "store_error",
            AdmissionError::CircuitOpen(_) => "circuit_open",
            AdmissionError::ConfigurationError(_) => "configuration_error",
            AdmissionError::InvalidParameter(_) => "invalid_parameter",
        }
    }

    /// Whether the decision path should degrade to fallback values.
    ///
    /// Configuration and parameter errors are programming mistakes and are
    /// reported as such; everything else is an expected runtime degradation.
    pub fn is_fallback_worthy(&self) -> bool {
        !matches!(
            self,
            AdmissionError::ConfigurationError(_) | AdmissionError::InvalidParameter(_)
        )
    }

    /// Whether this error means the underlying stores could not be read
    pub fn is_metrics_failure(&self) -> bool {
        matches!(
            self,
            AdmissionError::MetricsUnavailable(_)
                | AdmissionError::StoreError(_)
                | AdmissionError::Timeout(_)
                | AdmissionError::CircuitOpen(_)
        )
    }
}

impl From<config::ConfigError> for AdmissionError {
    fn from(error: config::ConfigError) -> Self {
        AdmissionError::ConfigurationError(error.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AdmissionError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        AdmissionError::Timeout(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdmissionError>;
