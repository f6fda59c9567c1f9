//! Outbound account events.

mod publisher;

pub use publisher::{EventEmitter, RedisEventEmitter};

#[cfg(any(test, feature = "test-utils"))]
pub use publisher::MockEventEmitter;
