//! Failure isolation for the outbound chat channel and process health.

pub mod circuit_breaker;
pub mod health;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerState, MAX_FAILURES, RESET_TIME};
pub use health::{HealthController, HealthStatus, SHUTDOWN_TIMEOUT, TransportHealth};
