//! Event bus publisher.
//!
//! Events are JSON documents published to a single Redis channel. A publish
//! either succeeds or returns [`AppError::PublishFailure`]; retrying is left
//! to the caller, which also decides how to undo the local change.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, RedisError};
use tracing::{debug, info, warn};

use common::{AppError, AppResult, EventBusConfig};
use domain::AccountEvent;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Sends account events to downstream consumers.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Publish one event. Returns once the bus has accepted it.
    async fn publish(&self, event: &AccountEvent) -> AppResult<()>;
}

/// Redis PUBLISH based emitter.
pub struct RedisEventEmitter {
    conn: ConnectionManager,
    channel: String,
}

impl RedisEventEmitter {
    /// Connect to the bus described by `config`.
    pub async fn connect(config: &EventBusConfig) -> Result<Self, RedisError> {
        debug!("Connecting to event bus at {}", config.url);
        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            channel: config.channel.clone(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl EventEmitter for RedisEventEmitter {
    async fn publish(&self, event: &AccountEvent) -> AppResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::publish_failure(format!("Event serialization error: {}", e)))?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .await
            .map_err(|e| {
                warn!(
                    account_id = %event.account_id(),
                    action = %event.action_type(),
                    "Event publish failed: {}",
                    e
                );
                AppError::publish_failure(e.to_string())
            })?;

        info!(
            account_id = %event.account_id(),
            action = %event.action_type(),
            channel = %self.channel,
            receivers,
            "Account event published"
        );
        Ok(())
    }
}
