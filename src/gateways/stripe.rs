use crate::domain::payment::ExternalStatus;
use crate::error::PaymentError;
use crate::gateways::{CreateIntentRequest, CreatedIntent, IntentGateway, RetrievedIntent};

pub struct StripeIntentGateway {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl StripeIntentGateway {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    async fn read_intent(&self, resp: reqwest::Response) -> Result<serde_json::Value, PaymentError> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Processor(processor_message(status, &body)));
        }

        resp.json()
            .await
            .map_err(|e| PaymentError::Processor(format!("invalid intent response: {e}")))
    }
}

#[async_trait::async_trait]
impl IntentGateway for StripeIntentGateway {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_intent(
        &self,
        request: &CreateIntentRequest,
    ) -> Result<CreatedIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.base_url);
        let params = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.to_lowercase()),
            (
                "description",
                format!("Payment for subscription: {}", request.subscription_id),
            ),
            ("metadata[subscriptionId]", request.subscription_id.clone()),
            ("metadata[userEmail]", request.user_email.clone()),
            ("receipt_email", request.user_email.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let resp = self
            .client
            .post(url)
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PaymentError::Processor(network_message(e)))?;

        let v = self.read_intent(resp).await?;
        let intent_id = v
            .get("id")
            .and_then(|id| id.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| PaymentError::Processor("intent response missing id".to_string()))?;

        tracing::info!("created payment intent {}", intent_id);

        Ok(CreatedIntent {
            intent_id,
            client_secret: v
                .get("client_secret")
                .and_then(|s| s.as_str())
                .map(ToString::to_string),
            status: parse_intent_status(&v),
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<RetrievedIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents/{}", self.base_url, intent_id);
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Option::<&str>::None)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PaymentError::Processor(network_message(e)))?;

        let v = self.read_intent(resp).await?;
        Ok(RetrievedIntent {
            intent_id: intent_id.to_string(),
            status: parse_intent_status(&v),
        })
    }

    async fn confirm_intent(
        &self,
        intent_id: &str,
        payment_method: &str,
    ) -> Result<RetrievedIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents/{}/confirm", self.base_url, intent_id);
        let resp = self
            .client
            .post(url)
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&[("payment_method", payment_method)])
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| PaymentError::Processor(network_message(e)))?;

        let v = self.read_intent(resp).await?;
        Ok(RetrievedIntent {
            intent_id: intent_id.to_string(),
            status: parse_intent_status(&v),
        })
    }
}

fn parse_intent_status(v: &serde_json::Value) -> ExternalStatus {
    v.get("status")
        .and_then(|s| s.as_str())
        .map(ExternalStatus::parse)
        .unwrap_or_else(|| ExternalStatus::Other("missing_status".to_string()))
}

// Processor errors arrive as {"error": {"message": ...}}; fall back to the
// raw body, truncated, when the shape is unexpected.
fn processor_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    format!("HTTP_{}: {}", status.as_u16(), detail)
}

fn network_message(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "gateway timeout".to_string()
    } else {
        format!("network error: {e}")
    }
}
