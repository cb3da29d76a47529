use axum::routing::{get, post};
use axum::Router;
use payments_service::config::AppConfig;
use payments_service::repo::payments_repo::PaymentsRepo;
use payments_service::service::event_publisher::StreamPublisher;
use payments_service::service::reconciler::PaymentReconciler;
use payments_service::webhook::verifier::WebhookVerifier;
use payments_service::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;

    let gateway = payments_service::gateways::from_config(&cfg);
    let payments_repo = PaymentsRepo { pool: pool.clone() };
    let publisher = StreamPublisher {
        redis_client: redis::Client::open(cfg.redis_url.clone())?,
        stream_key: cfg.stream_key.clone(),
    };

    let reconciler = PaymentReconciler {
        store: Arc::new(payments_repo),
        gateway,
        publisher: Arc::new(publisher),
    };

    let verifier = WebhookVerifier::new(cfg.stripe_webhook_secret.clone(), cfg.webhook_tolerance_secs);
    if !verifier.is_configured() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not configured, webhook deliveries will be accepted unverified");
    }

    let state = AppState {
        reconciler,
        verifier,
        pool,
        redis_client,
    };

    let app = Router::new()
        .route("/", get(payments_service::http::handlers::payments::root))
        .route("/health", get(payments_service::http::handlers::payments::health))
        .route("/payments", post(payments_service::http::handlers::payments::create_payment))
        .route(
            "/payments/:payment_id",
            get(payments_service::http::handlers::payments::get_payment),
        )
        .route(
            "/payments/:payment_id/confirm",
            post(payments_service::http::handlers::payments::confirm_payment),
        )
        .route(
            "/webhooks/processor",
            post(payments_service::http::handlers::webhooks::processor_webhook),
        )
        .route("/ops/readiness", get(payments_service::http::handlers::ops::readiness))
        .route("/ops/liveness", get(payments_service::http::handlers::ops::liveness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
