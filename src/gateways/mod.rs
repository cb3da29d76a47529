use async_trait::async_trait;

use crate::domain::payment::ExternalStatus;
use crate::error::PaymentError;

pub mod mock;
pub mod stripe;

#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub subscription_id: String,
    pub user_email: String,
}

#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: Option<String>,
    pub status: ExternalStatus,
}

#[derive(Debug, Clone)]
pub struct RetrievedIntent {
    pub intent_id: String,
    pub status: ExternalStatus,
}

pub fn from_config(cfg: &crate::config::AppConfig) -> std::sync::Arc<dyn IntentGateway> {
    if cfg.gateway_adapter == "MOCK" {
        return std::sync::Arc::new(mock::MockIntentGateway {
            behavior: cfg.mock_behavior.clone(),
        });
    }

    if cfg.stripe_api_key.is_empty() {
        tracing::warn!("STRIPE_API_KEY not configured, intent creation will be rejected upstream");
    }

    std::sync::Arc::new(stripe::StripeIntentGateway {
        base_url: cfg.stripe_base_url.clone(),
        api_key: cfg.stripe_api_key.clone(),
        timeout_ms: cfg.gateway_timeout_ms,
        client: reqwest::Client::new(),
    })
}

/// All payment state lives with the external processor; adapters hold no
/// local state beyond credentials and an HTTP client.
#[async_trait]
pub trait IntentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_intent(&self, request: &CreateIntentRequest)
        -> Result<CreatedIntent, PaymentError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<RetrievedIntent, PaymentError>;

    async fn confirm_intent(
        &self,
        intent_id: &str,
        payment_method: &str,
    ) -> Result<RetrievedIntent, PaymentError>;
}
