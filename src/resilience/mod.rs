//! # Resilience Module
//!
//! Fault isolation for the store reads feeding the admission path. A tripped
//! breaker turns store outages into immediate `CircuitOpen` errors, which the
//! metrics collector degrades to zero-valued metrics.

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreakerSnapshot, CircuitState, StoreCircuitBreaker};
