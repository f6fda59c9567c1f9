//! Account service configuration.

use std::env;

use common::{CircuitBreakerConfig, DatabaseConfig, EventBusConfig, HttpClientConfig, ServiceConfig};

/// Account service configuration.
#[derive(Debug, Clone)]
pub struct AccountServiceConfig {
    /// Bind address and service name
    pub service: ServiceConfig,
    /// Account store
    pub database: DatabaseConfig,
    /// Redis channel account events are published to
    pub event_bus: EventBusConfig,
    /// Course service endpoint
    pub course_service: HttpClientConfig,
    /// Breaker guarding course service calls
    pub course_breaker: CircuitBreakerConfig,
}

impl AccountServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            service: ServiceConfig {
                service_name: defaults.service.service_name,
                host: env::var("ACCOUNT_SERVICE_HOST").unwrap_or(defaults.service.host),
                port: parse_env("ACCOUNT_SERVICE_PORT").unwrap_or(defaults.service.port),
            },
            database: DatabaseConfig {
                url: env::var("ACCOUNT_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                ..defaults.database
            },
            event_bus: EventBusConfig {
                url: env::var("EVENT_BUS_URL")
                    .or_else(|_| env::var("REDIS_URL"))
                    .unwrap_or(defaults.event_bus.url),
                channel: env::var("ACCOUNT_EVENT_CHANNEL").unwrap_or(defaults.event_bus.channel),
            },
            course_service: HttpClientConfig {
                endpoint: env::var("COURSE_SERVICE_URL")
                    .unwrap_or(defaults.course_service.endpoint),
                connect_timeout_ms: parse_env("COURSE_CONNECT_TIMEOUT_MS")
                    .unwrap_or(defaults.course_service.connect_timeout_ms),
                request_timeout_ms: parse_env("COURSE_REQUEST_TIMEOUT_MS")
                    .unwrap_or(defaults.course_service.request_timeout_ms),
            },
            course_breaker: CircuitBreakerConfig {
                failure_threshold: parse_env("CIRCUIT_FAILURE_THRESHOLD")
                    .unwrap_or(defaults.course_breaker.failure_threshold),
                cooldown_seconds: parse_env("CIRCUIT_COOLDOWN_SECONDS")
                    .unwrap_or(defaults.course_breaker.cooldown_seconds),
                call_timeout_ms: parse_env("CIRCUIT_CALL_TIMEOUT_MS"),
            },
        }
    }
}

impl Default for AccountServiceConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                service_name: "account-service".to_string(),
                host: "0.0.0.0".to_string(),
                port: 8087,
            },
            database: DatabaseConfig::default(),
            event_bus: EventBusConfig::default(),
            course_service: HttpClientConfig::default(),
            course_breaker: CircuitBreakerConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
