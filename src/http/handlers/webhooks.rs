use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::error::PaymentError;
use crate::http::handlers::payments::err;
use crate::service::reconciler::Applied;
use crate::webhook::event::ProcessorEvent;
use crate::webhook::verifier::Verification;
use crate::AppState;

const SIGNATURE_HEADER: &str = "Stripe-Signature";

// The processor redelivers on any non-2xx, so only authentication and
// malformed-payload failures return 4xx. Business-level anomalies the
// processor can never fix by resending are acknowledged and logged.
pub async fn processor_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());

    match state.verifier.verify(&body, signature, Utc::now()) {
        Ok(Verification::Verified) => {}
        Ok(Verification::Skipped) => {
            tracing::warn!("webhook secret not configured, accepting delivery unverified");
        }
        Err(e) => {
            tracing::warn!("rejected webhook delivery: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(err("INVALID_SIGNATURE", &e.to_string())),
            )
                .into_response();
        }
    }

    let event = match ProcessorEvent::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("rejected webhook delivery: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(err("MALFORMED_PAYLOAD", &e.to_string())),
            )
                .into_response();
        }
    };

    let Some(external) = event.external_status() else {
        tracing::debug!("ignoring event type {}", event.event_type);
        return acknowledge();
    };

    let Some(intent_id) = event.intent_id() else {
        tracing::warn!(
            "no intent id in {} event {}, acknowledging",
            event.event_type,
            event.id
        );
        return acknowledge();
    };

    match state
        .reconciler
        .apply_external_status(&intent_id, external)
        .await
    {
        Ok(Applied::Transitioned(_)) | Ok(Applied::Duplicate) => acknowledge(),
        Err(e @ PaymentError::RecordNotFound(_)) => {
            tracing::error!("webhook anomaly: {}", e);
            acknowledge()
        }
        Err(e @ PaymentError::ConflictingTransition { .. }) => {
            tracing::warn!("webhook anomaly: {}", e);
            acknowledge()
        }
        Err(e) => {
            // Transient store trouble; non-2xx lets the processor redeliver.
            tracing::error!("webhook processing failed for intent {}: {}", intent_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(err("INTERNAL_ERROR", "webhook processing failed")),
            )
                .into_response()
        }
    }
}

fn acknowledge() -> Response {
    (StatusCode::OK, "Webhook received").into_response()
}
