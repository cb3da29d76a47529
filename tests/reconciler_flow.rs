use std::sync::{Arc, Mutex};

use payments_service::domain::event::{EventType, PaymentEvent};
use payments_service::domain::payment::{
    ExternalStatus, PaymentRequest, PaymentStatus, PaymentType,
};
use payments_service::error::PaymentError;
use payments_service::gateways::mock::MockIntentGateway;
use payments_service::repo::memory_store::MemoryPaymentStore;
use payments_service::service::event_publisher::EventPublisher;
use payments_service::service::reconciler::{Applied, PaymentReconciler};

#[tokio::test]
async fn initiate_creates_initiated_record() {
    let (reconciler, _store, _publisher) = build(MockIntentGateway {
        behavior: "ALWAYS_SUCCEED".to_string(),
    });

    let record = reconciler.initiate(&request()).await.unwrap();

    assert_eq!(record.status, PaymentStatus::Initiated);
    assert_eq!(record.attempt, 1);
    assert_eq!(record.amount_minor, 9999);
    assert_eq!(record.currency, "INR");
    assert!(record.client_secret.is_some());
    assert!(record.external_intent_id.starts_with("pi_mock_"));

    let fetched = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(fetched.external_intent_id, record.external_intent_id);
}

#[tokio::test]
async fn initiate_persists_nothing_when_gateway_rejects() {
    let (reconciler, store, publisher) = build(MockIntentGateway {
        behavior: "ALWAYS_REJECT".to_string(),
    });

    let result = reconciler.initiate(&request()).await;

    assert!(matches!(result, Err(PaymentError::Processor(_))));
    assert!(store.is_empty());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn succeeded_notification_transitions_and_publishes_once() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    let applied = reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Succeeded)
        .await
        .unwrap();
    assert_eq!(applied, Applied::Transitioned(PaymentStatus::Success));

    let updated = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Success);
    assert_eq!(updated.attempt, 2);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::PaymentSuccess);
    assert_eq!(events[0].subscription_id, "sub1");
    assert_eq!(events[0].amount, 9999);
    assert_eq!(events[0].currency, "INR");
    assert!(events[0].reason.is_none());
}

#[tokio::test]
async fn duplicate_succeeded_notification_is_idempotent() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Succeeded)
        .await
        .unwrap();
    let second = reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Succeeded)
        .await
        .unwrap();

    assert_eq!(second, Applied::Duplicate);
    let updated = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Success);
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn failed_after_success_conflicts_without_regressing() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Succeeded)
        .await
        .unwrap();
    let result = reconciler
        .apply_external_status(
            &record.external_intent_id,
            ExternalStatus::Other("failed".to_string()),
        )
        .await;

    assert!(matches!(
        result,
        Err(PaymentError::ConflictingTransition {
            current: PaymentStatus::Success,
            target: PaymentStatus::Failed,
            ..
        })
    ));

    let updated = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Success);
    assert!(updated.failure_reason.is_none());
    assert_eq!(publisher.events().len(), 1);
    assert_eq!(publisher.events()[0].event_type, EventType::PaymentSuccess);
}

#[tokio::test]
async fn unknown_intent_is_an_anomaly_and_persists_nothing() {
    let (reconciler, store, publisher) = build(succeed_gateway());

    let result = reconciler
        .apply_external_status("pi_unknown", ExternalStatus::Succeeded)
        .await;

    assert!(matches!(result, Err(PaymentError::RecordNotFound(_))));
    assert!(store.is_empty());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn unrecognized_status_fails_with_literal_reason() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    let applied = reconciler
        .apply_external_status(
            &record.external_intent_id,
            ExternalStatus::Other("expired".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(applied, Applied::Transitioned(PaymentStatus::Failed));

    let updated = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Failed);
    assert!(updated.failure_reason.unwrap().contains("expired"));

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::PaymentFailed);
    assert!(events[0].reason.as_deref().unwrap().contains("expired"));
}

#[tokio::test]
async fn intermediate_statuses_move_without_publishing() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::RequiresAction)
        .await
        .unwrap();
    assert_eq!(
        reconciler.get_payment(record.payment_id).await.unwrap().status,
        PaymentStatus::Pending
    );

    reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Processing)
        .await
        .unwrap();
    assert_eq!(
        reconciler.get_payment(record.payment_id).await.unwrap().status,
        PaymentStatus::Processing
    );

    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn concurrent_processing_and_succeeded_end_at_success() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();
    let intent = record.external_intent_id.clone();

    let r1 = reconciler.clone();
    let i1 = intent.clone();
    let first = tokio::spawn(async move {
        r1.apply_external_status(&i1, ExternalStatus::Processing).await
    });

    let r2 = reconciler.clone();
    let i2 = intent.clone();
    let second = tokio::spawn(async move {
        r2.apply_external_status(&i2, ExternalStatus::Succeeded).await
    });

    // The processing notification may lose to the terminal one and surface
    // as a conflict; the succeeded notification always lands.
    let _ = first.await.unwrap();
    second.await.unwrap().unwrap();

    let updated = reconciler.get_payment(record.payment_id).await.unwrap();
    assert_eq!(updated.status, PaymentStatus::Success);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::PaymentSuccess);
}

#[tokio::test]
async fn confirm_reconciles_the_reported_status() {
    let (reconciler, _store, publisher) = build(succeed_gateway());
    let record = reconciler.initiate(&request()).await.unwrap();

    let confirmed = reconciler
        .confirm(record.payment_id, "pm_card_visa")
        .await
        .unwrap();

    assert_eq!(confirmed.status, PaymentStatus::Success);
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn publish_failure_does_not_roll_back_the_transition() {
    let store = Arc::new(MemoryPaymentStore::default());
    let reconciler = PaymentReconciler {
        store: store.clone(),
        gateway: Arc::new(succeed_gateway()),
        publisher: Arc::new(FailingPublisher),
    };

    let record = reconciler.initiate(&request()).await.unwrap();
    let applied = reconciler
        .apply_external_status(&record.external_intent_id, ExternalStatus::Succeeded)
        .await
        .unwrap();

    assert_eq!(applied, Applied::Transitioned(PaymentStatus::Success));
    assert_eq!(
        reconciler.get_payment(record.payment_id).await.unwrap().status,
        PaymentStatus::Success
    );
}

fn build(
    gateway: MockIntentGateway,
) -> (PaymentReconciler, Arc<MemoryPaymentStore>, Arc<RecordingPublisher>) {
    let store = Arc::new(MemoryPaymentStore::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let reconciler = PaymentReconciler {
        store: store.clone(),
        gateway: Arc::new(gateway),
        publisher: publisher.clone(),
    };
    (reconciler, store, publisher)
}

fn succeed_gateway() -> MockIntentGateway {
    MockIntentGateway {
        behavior: "ALWAYS_SUCCEED".to_string(),
    }
}

fn request() -> PaymentRequest {
    PaymentRequest {
        subscription_id: "sub1".to_string(),
        user_id: "user1".to_string(),
        user_email: "user1@example.com".to_string(),
        amount: 9999,
        currency: Some("INR".to_string()),
        payment_type: PaymentType::Subscription,
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<PaymentEvent>>,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<PaymentEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &PaymentEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct FailingPublisher;

#[async_trait::async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &PaymentEvent) -> anyhow::Result<()> {
        anyhow::bail!("bus unavailable")
    }
}
