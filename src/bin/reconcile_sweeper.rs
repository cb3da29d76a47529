use anyhow::Result;
use payments_service::config::AppConfig;
use payments_service::domain::payment::PaymentRecord;
use payments_service::error::PaymentError;
use payments_service::repo::payments_repo::PaymentsRepo;
use payments_service::service::event_publisher::StreamPublisher;
use payments_service::service::reconciler::PaymentReconciler;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Out-of-band reconciliation sweep: the "poll" half of the poll/push
// duality. Stale non-terminal payments are re-checked against the processor
// and fed through the same reconciliation entry point as webhook deliveries.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&cfg.database_url)
        .await?;

    let repo = PaymentsRepo { pool };
    let reconciler = PaymentReconciler {
        store: Arc::new(repo.clone()),
        gateway: payments_service::gateways::from_config(&cfg),
        publisher: Arc::new(StreamPublisher {
            redis_client: redis::Client::open(cfg.redis_url.clone())?,
            stream_key: cfg.stream_key.clone(),
        }),
    };

    loop {
        let cutoff = chrono::Utc::now() - chrono::Duration::seconds(cfg.sweep_stale_after_secs);
        match repo.list_stale_nonterminal(cutoff, 100).await {
            Ok(stale) => {
                for record in stale {
                    if let Err(err) = sweep_one(&reconciler, &record).await {
                        tracing::warn!(
                            "sweep anomaly for intent {}: {}",
                            record.external_intent_id,
                            err
                        );
                    }
                }
            }
            Err(err) => tracing::error!("sweep query failed: {}", err),
        }

        tokio::time::sleep(std::time::Duration::from_secs(cfg.sweep_interval_secs)).await;
    }
}

async fn sweep_one(
    reconciler: &PaymentReconciler,
    record: &PaymentRecord,
) -> Result<(), PaymentError> {
    let retrieved = reconciler
        .gateway
        .retrieve_intent(&record.external_intent_id)
        .await?;

    reconciler
        .apply_external_status(&record.external_intent_id, retrieved.status)
        .await?;
    Ok(())
}
