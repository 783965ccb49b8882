//! # Store Circuit Breaker
//!
//! Fails store reads fast while a backing store is known to be down, so the
//! admission path degrades to fallback values immediately instead of waiting
//! out the fetch timeout on every request.
//!
//! States: Closed (normal), Open (failing fast), Half-Open (probing recovery).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;
use crate::error::{AdmissionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

#[derive(Debug, Default)]
struct BreakerCounters {
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
    total_calls: u64,
    total_failures: u64,
    rejected_calls: u64,
}

/// Point-in-time view of a breaker, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub rejected_calls: u64,
}

#[derive(Debug)]
pub struct StoreCircuitBreaker {
    name: String,
    state: AtomicU8,
    config: CircuitBreakerConfig,
    counters: Mutex<BreakerCounters>,
}

impl StoreCircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        debug!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout_seconds,
            "🛡️ Store circuit breaker initialized"
        );
        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            counters: Mutex::new(BreakerCounters::default()),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a store read under breaker protection.
    ///
    /// Rejected calls return `CircuitOpen` without running `operation`.
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.allow_call() {
            return Err(AdmissionError::CircuitOpen(self.name.clone()));
        }

        let result = operation().await;
        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }
        result
    }

    /// Whether a call may proceed; moves Open to Half-Open once the timeout elapsed
    pub fn allow_call(&self) -> bool {
        let mut counters = self.counters.lock();
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = counters
                    .opened_at
                    .map(|opened| opened.elapsed() >= self.config.timeout())
                    .unwrap_or(true);
                if elapsed {
                    counters.half_open_successes = 0;
                    self.state
                        .store(CircuitState::HalfOpen as u8, Ordering::Release);
                    info!(component = %self.name, "🟡 Store circuit half-open (probing recovery)");
                    true
                } else {
                    counters.rejected_calls += 1;
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut counters = self.counters.lock();
        counters.total_calls += 1;
        counters.consecutive_failures = 0;

        if self.state() == CircuitState::HalfOpen {
            counters.half_open_successes += 1;
            if counters.half_open_successes >= self.config.success_threshold {
                counters.opened_at = None;
                self.state.store(CircuitState::Closed as u8, Ordering::Release);
                info!(component = %self.name, "🟢 Store circuit closed (recovered)");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut counters = self.counters.lock();
        counters.total_calls += 1;
        counters.total_failures += 1;
        counters.consecutive_failures += 1;

        let should_open = match self.state() {
            CircuitState::Closed => counters.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };

        if should_open {
            counters.opened_at = Some(Instant::now());
            counters.half_open_successes = 0;
            self.state.store(CircuitState::Open as u8, Ordering::Release);
            warn!(
                component = %self.name,
                consecutive_failures = counters.consecutive_failures,
                timeout_seconds = self.config.timeout_seconds,
                "🔴 Store circuit opened (failing fast)"
            );
        }
    }

    pub fn force_open(&self) {
        let mut counters = self.counters.lock();
        counters.opened_at = Some(Instant::now());
        self.state.store(CircuitState::Open as u8, Ordering::Release);
        warn!(component = %self.name, "🚨 Store circuit forced open");
    }

    pub fn force_closed(&self) {
        let mut counters = self.counters.lock();
        counters.opened_at = None;
        counters.consecutive_failures = 0;
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        warn!(component = %self.name, "🚨 Store circuit forced closed");
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let counters = self.counters.lock();
        CircuitBreakerSnapshot {
            name: self.name.clone(),
            state: self.state(),
            consecutive_failures: counters.consecutive_failures,
            total_calls: counters.total_calls,
            total_failures: counters.total_failures,
            rejected_calls: counters.rejected_calls,
        }
    }
}
