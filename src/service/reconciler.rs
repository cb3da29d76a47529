use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::event::PaymentEvent;
use crate::domain::payment::{
    plan_transition, ExternalStatus, PaymentRecord, PaymentRequest, PaymentStatus, TransitionPlan,
};
use crate::error::PaymentError;
use crate::gateways::{CreateIntentRequest, IntentGateway};
use crate::repo::payments_repo::{PaymentStore, TransitionUpdate};
use crate::service::event_publisher::EventPublisher;

const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Transitioned(PaymentStatus),
    Duplicate,
}

#[derive(Clone)]
pub struct PaymentReconciler {
    pub store: Arc<dyn PaymentStore>,
    pub gateway: Arc<dyn IntentGateway>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl PaymentReconciler {
    pub async fn initiate(&self, request: &PaymentRequest) -> Result<PaymentRecord, PaymentError> {
        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        // Nothing is persisted when the gateway rejects the request.
        let created = self
            .gateway
            .create_intent(&CreateIntentRequest {
                amount_minor: request.amount,
                currency: currency.clone(),
                subscription_id: request.subscription_id.clone(),
                user_email: request.user_email.clone(),
            })
            .await?;

        let now = Utc::now();
        let record = PaymentRecord {
            payment_id: Uuid::new_v4(),
            subscription_id: request.subscription_id.clone(),
            user_id: request.user_id.clone(),
            user_email: request.user_email.clone(),
            external_intent_id: created.intent_id,
            client_secret: created.client_secret,
            amount_minor: request.amount,
            currency,
            status: PaymentStatus::Initiated,
            payment_type: request.payment_type,
            attempt: 1,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.store.save(&record).await.map_err(PaymentError::Store)?;
        tracing::info!(
            "payment {} initiated for subscription {} with intent {}",
            record.payment_id,
            record.subscription_id,
            record.external_intent_id
        );

        Ok(record)
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentRecord, PaymentError> {
        self.store
            .find_by_id(payment_id)
            .await
            .map_err(PaymentError::Store)?
            .ok_or_else(|| PaymentError::RecordNotFound(payment_id.to_string()))
    }

    /// Server-side confirmation flow. The confirmed intent's reported status
    /// feeds the same reconciliation path as a webhook notification.
    pub async fn confirm(
        &self,
        payment_id: Uuid,
        payment_method: &str,
    ) -> Result<PaymentRecord, PaymentError> {
        let record = self.get_payment(payment_id).await?;
        let confirmed = self
            .gateway
            .confirm_intent(&record.external_intent_id, payment_method)
            .await?;

        self.apply_external_status(&record.external_intent_id, confirmed.status)
            .await?;
        self.get_payment(payment_id).await
    }

    /// Single reconciliation entry point shared by the webhook push path and
    /// the retrieve-intent sweep.
    ///
    /// A terminal record receiving its own status again is a duplicate
    /// delivery and a successful no-op; a terminal record receiving a
    /// different status is a conflict and the record is left untouched.
    pub async fn apply_external_status(
        &self,
        external_intent_id: &str,
        external: ExternalStatus,
    ) -> Result<Applied, PaymentError> {
        let (target, failure_reason) = external.target();

        // Re-read on every compare-and-set miss. Status only moves forward,
        // so a miss means another caller advanced the record and the loop
        // terminates.
        loop {
            let record = self
                .store
                .find_by_external_intent_id(external_intent_id)
                .await
                .map_err(PaymentError::Store)?
                .ok_or_else(|| PaymentError::RecordNotFound(external_intent_id.to_string()))?;

            match plan_transition(record.status, target) {
                TransitionPlan::Duplicate => {
                    tracing::info!(
                        "duplicate notification for intent {}, already {}",
                        external_intent_id,
                        record.status.as_str()
                    );
                    return Ok(Applied::Duplicate);
                }
                TransitionPlan::Conflict => {
                    return Err(PaymentError::ConflictingTransition {
                        external_intent_id: external_intent_id.to_string(),
                        current: record.status,
                        target,
                    });
                }
                TransitionPlan::Apply(next) => {
                    let update = TransitionUpdate {
                        next,
                        attempt: record.attempt + 1,
                        failure_reason: failure_reason.clone(),
                    };

                    let applied = self
                        .store
                        .apply_transition(record.payment_id, record.status, &update)
                        .await
                        .map_err(PaymentError::Store)?;
                    if !applied {
                        continue;
                    }

                    tracing::info!(
                        "payment {} moved {} -> {} for subscription {}",
                        record.payment_id,
                        record.status.as_str(),
                        next.as_str(),
                        record.subscription_id
                    );

                    if next.is_terminal() {
                        self.publish_terminal(&record, next, failure_reason).await;
                    }

                    return Ok(Applied::Transitioned(next));
                }
            }
        }
    }

    // Delivery is best-effort after the durable transition: failures are
    // logged with correlation ids and never roll the transition back.
    async fn publish_terminal(
        &self,
        record: &PaymentRecord,
        next: PaymentStatus,
        failure_reason: Option<String>,
    ) {
        let mut updated = record.clone();
        updated.status = next;
        if failure_reason.is_some() {
            updated.failure_reason = failure_reason;
        }

        let Some(event) = PaymentEvent::for_terminal(&updated, Utc::now()) else {
            return;
        };

        match self.publisher.publish(&event).await {
            Ok(()) => tracing::info!(
                "published {:?} for subscription {}",
                event.event_type,
                event.subscription_id
            ),
            Err(err) => tracing::error!(
                "failed to publish {:?} for subscription {} intent {}: {}",
                event.event_type,
                event.subscription_id,
                record.external_intent_id,
                err
            ),
        }
    }
}
