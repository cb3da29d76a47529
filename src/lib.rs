pub mod config;
pub mod error;
pub mod domain {
    pub mod event;
    pub mod payment;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod webhooks;
    }
}
pub mod repo {
    pub mod memory_store;
    pub mod payments_repo;
}
pub mod service {
    pub mod event_publisher;
    pub mod reconciler;
}
pub mod webhook {
    pub mod event;
    pub mod verifier;
}

#[derive(Clone)]
pub struct AppState {
    pub reconciler: service::reconciler::PaymentReconciler,
    pub verifier: webhook::verifier::WebhookVerifier,
    pub pool: sqlx::PgPool,
    pub redis_client: redis::Client,
}
