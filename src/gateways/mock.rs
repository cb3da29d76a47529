use uuid::Uuid;

use crate::domain::payment::ExternalStatus;
use crate::error::PaymentError;
use crate::gateways::{CreateIntentRequest, CreatedIntent, IntentGateway, RetrievedIntent};

pub struct MockIntentGateway {
    pub behavior: String,
}

#[async_trait::async_trait]
impl IntentGateway for MockIntentGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_intent(
        &self,
        _request: &CreateIntentRequest,
    ) -> Result<CreatedIntent, PaymentError> {
        if self.behavior == "ALWAYS_REJECT" {
            return Err(PaymentError::Processor("mock processor rejection".to_string()));
        }

        let intent_id = format!("pi_mock_{}", Uuid::new_v4().simple());
        Ok(CreatedIntent {
            client_secret: Some(format!("{intent_id}_secret")),
            intent_id,
            status: ExternalStatus::RequiresPaymentMethod,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<RetrievedIntent, PaymentError> {
        Ok(RetrievedIntent {
            intent_id: intent_id.to_string(),
            status: self.reported_status(),
        })
    }

    async fn confirm_intent(
        &self,
        intent_id: &str,
        _payment_method: &str,
    ) -> Result<RetrievedIntent, PaymentError> {
        Ok(RetrievedIntent {
            intent_id: intent_id.to_string(),
            status: self.reported_status(),
        })
    }
}

impl MockIntentGateway {
    fn reported_status(&self) -> ExternalStatus {
        match self.behavior.as_str() {
            "ALWAYS_FAIL" => ExternalStatus::Other("failed".to_string()),
            "ALWAYS_PENDING" => ExternalStatus::RequiresPaymentMethod,
            _ => ExternalStatus::Succeeded,
        }
    }
}
