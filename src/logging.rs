//! # Structured Logging Module
//!
//! Environment-aware structured logging for the admission path. Console output
//! is human-readable by default; set `TASKER_LOG_FORMAT=json` for JSON lines.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::models::{AdaptiveThresholds, OrchestrationRecommendation};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| get_log_level(&environment));
        let json_output = std::env::var("TASKER_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let console_layer: Box<dyn Layer<Registry> + Send + Sync> = if json_output {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(EnvFilter::new(filter))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(filter))
                .boxed()
        };

        // A subscriber may already be installed by the embedding application
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json_output = json_output,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("TASKER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log an admission decision with its inputs
pub fn log_admission_decision(
    workspace_id: &str,
    current_pending: u32,
    recommendation: &OrchestrationRecommendation,
    source: &str,
) {
    tracing::info!(
        workspace_id = %workspace_id,
        current_pending = current_pending,
        should_proceed = recommendation.should_proceed,
        recommended_limit = recommendation.recommended_limit,
        confidence = recommendation.confidence,
        source = %source,
        timestamp = %Utc::now().to_rfc3339(),
        "🚦 ADMISSION_DECISION"
    );
}

/// Log a freshly calculated threshold set
pub fn log_threshold_calculation(thresholds: &AdaptiveThresholds, fallback: bool) {
    tracing::debug!(
        workspace_id = %thresholds.workspace_id,
        max_pending_tasks = thresholds.max_pending_tasks,
        priority_boost_factor = thresholds.priority_boost_factor,
        urgency_multiplier = thresholds.urgency_multiplier,
        confidence = thresholds.confidence_score,
        fallback = fallback,
        "📐 THRESHOLD_CALCULATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
