//! # Admission Controller
//!
//! Per-request decision of whether a task may proceed now.
//!
//! Three paths, tried in order:
//!
//! 1. **Critical bypass**: critical tasks always proceed, with a limit just
//!    above the current queue.
//! 2. **Adaptive**: proceed while the pending queue is below the workspace's
//!    adaptive limit. Bounded by the decision timeout.
//! 3. **Fallback**: any error or timeout on the adaptive path yields a fixed
//!    conservative limit. The caller always gets a recommendation.

use std::sync::Arc;
use tracing::warn;

use crate::config::{AdmissionConfig, AdmissionDecisionConfig};
use crate::error::{AdmissionError, Result};
use crate::logging::{log_admission_decision, log_error};
use crate::models::{AdaptiveThresholds, OrchestrationRecommendation, TaskMetadata};
use crate::orchestration::threshold_provider::ThresholdProvider;

/// Queue utilization above which a proceeding decision carries a warning
const NEAR_LIMIT_RATIO: f64 = 0.8;

#[derive(Debug)]
pub struct AdmissionController {
    provider: Arc<ThresholdProvider>,
    config: AdmissionDecisionConfig,
    fallback_limit: u32,
}

impl AdmissionController {
    pub fn new(provider: Arc<ThresholdProvider>, config: &AdmissionConfig) -> Self {
        Self {
            provider,
            config: config.admission.clone(),
            fallback_limit: config.fallback.admission_limit,
        }
    }

    pub async fn decide(
        &self,
        workspace_id: &str,
        current_pending: u32,
        metadata: TaskMetadata,
    ) -> OrchestrationRecommendation {
        match self.try_decide(workspace_id, current_pending, metadata).await {
            Ok(recommendation) => recommendation,
            Err(error) => {
                if error.is_fallback_worthy() {
                    warn!(
                        workspace_id = %workspace_id,
                        current_pending = current_pending,
                        error = %error,
                        error_kind = error.kind(),
                        "🚦 ADMISSION: Adaptive decision failed, using fallback recommendation"
                    );
                } else {
                    log_error(
                        "admission_controller",
                        "decide",
                        &error.to_string(),
                        Some(workspace_id),
                    );
                }
                let recommendation = self.fallback_recommendation(current_pending, &error);
                log_admission_decision(workspace_id, current_pending, &recommendation, "fallback");
                recommendation
            }
        }
    }

    pub async fn try_decide(
        &self,
        workspace_id: &str,
        current_pending: u32,
        metadata: TaskMetadata,
    ) -> Result<OrchestrationRecommendation> {
        if metadata.is_critical {
            let recommendation = self.critical_bypass(current_pending);
            log_admission_decision(workspace_id, current_pending, &recommendation, "critical");
            return Ok(recommendation);
        }

        if workspace_id.trim().is_empty() {
            return Err(AdmissionError::InvalidParameter(
                "workspace_id must not be empty".to_string(),
            ));
        }

        let thresholds = tokio::time::timeout(
            self.config.decision_timeout(),
            self.provider.thresholds_for(workspace_id, false),
        )
        .await
        .map_err(|_| {
            AdmissionError::Timeout(format!(
                "admission decision for {workspace_id} exceeded {}ms",
                self.config.decision_timeout_ms
            ))
        })?;

        let recommendation = self.adaptive_recommendation(current_pending, &thresholds);
        log_admission_decision(workspace_id, current_pending, &recommendation, "adaptive");
        Ok(recommendation)
    }

    pub fn critical_bypass(&self, current_pending: u32) -> OrchestrationRecommendation {
        OrchestrationRecommendation {
            should_proceed: true,
            recommended_limit: current_pending.saturating_add(self.config.critical_headroom),
            reasoning: format!(
                "Critical task bypasses adaptive limits ({current_pending} pending)"
            ),
            confidence: self.config.critical_confidence,
            optimization_suggestions: Vec::new(),
        }
    }

    pub fn adaptive_recommendation(
        &self,
        current_pending: u32,
        thresholds: &AdaptiveThresholds,
    ) -> OrchestrationRecommendation {
        let limit = thresholds.max_pending_tasks;
        let ratio = thresholds.queue_ratio(current_pending);
        let should_proceed = current_pending < limit;

        let reasoning = if should_proceed {
            format!(
                "Pending queue at {current_pending}/{limit} ({:.0}% of adaptive limit); capacity available",
                ratio * 100.0
            )
        } else {
            format!(
                "Pending queue at {current_pending}/{limit} ({:.0}% of adaptive limit); deferring until the queue drains",
                ratio * 100.0
            )
        };

        let mut suggestions = Vec::new();
        if !should_proceed {
            suggestions.push(format!("Defer until pending tasks drop below {limit}"));
        } else if ratio >= NEAR_LIMIT_RATIO {
            suggestions.push("Queue is nearing its adaptive limit; avoid bulk submissions".to_string());
        }
        if thresholds.priority_boost_factor > 1.0 {
            suggestions.push(format!(
                "Elevated skip rate: boost long-waiting tasks by {:.1}x",
                thresholds.priority_boost_factor
            ));
        }
        if thresholds.urgency_multiplier > 1.0 {
            suggestions.push("Bottlenecks detected: run skip prevention for this workspace".to_string());
        }
        if thresholds.is_fallback {
            suggestions.push(
                "Limit uses conservative defaults until enough task history is collected".to_string(),
            );
        }

        OrchestrationRecommendation {
            should_proceed,
            recommended_limit: limit,
            reasoning,
            confidence: self.config.adaptive_confidence,
            optimization_suggestions: suggestions,
        }
    }

    pub fn fallback_recommendation(
        &self,
        current_pending: u32,
        cause: &AdmissionError,
    ) -> OrchestrationRecommendation {
        let limit = self.fallback_limit;
        OrchestrationRecommendation {
            should_proceed: current_pending < limit,
            recommended_limit: limit,
            reasoning: format!(
                "Fallback limit applied ({current_pending}/{limit}) after {}",
                cause.kind()
            ),
            confidence: self.config.fallback_confidence,
            optimization_suggestions: vec![
                "Adaptive thresholds unavailable; check workspace store health".to_string(),
            ],
        }
    }
}
