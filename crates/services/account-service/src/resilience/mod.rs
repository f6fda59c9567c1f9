//! Fault tolerance for downstream calls.

mod circuit_breaker;

pub use circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitSnapshot, CircuitState};
