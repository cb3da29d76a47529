use anyhow::Result;
use async_trait::async_trait;

use crate::domain::event::PaymentEvent;

/// At-least-once, best-effort delivery onto the message bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &PaymentEvent) -> Result<()>;
}

/// Redis Stream transport. Streams have no partitions, so the subscription
/// id rides in the entry as an explicit key field for downstream consumers
/// that need per-subscription ordering.
#[derive(Clone)]
pub struct StreamPublisher {
    pub redis_client: redis::Client,
    pub stream_key: String,
}

#[async_trait]
impl EventPublisher for StreamPublisher {
    async fn publish(&self, event: &PaymentEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let _id: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("MAXLEN")
            .arg("~")
            .arg(1_000_000)
            .arg("*")
            .arg("key")
            .arg(&event.subscription_id)
            .arg("event")
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}
