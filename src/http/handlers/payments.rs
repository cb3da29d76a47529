use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::payment::{ErrorEnvelope, ErrorPayload, PaymentRequest, PaymentResponse};
use crate::error::PaymentError;
use crate::AppState;

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentRequest>,
) -> impl IntoResponse {
    if let Err((status, body)) = validate_request(&req) {
        return (status, Json(body)).into_response();
    }

    match state.reconciler.initiate(&req).await {
        Ok(record) => (StatusCode::CREATED, Json(PaymentResponse::from(record))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.reconciler.get_payment(payment_id).await {
        Ok(record) => (StatusCode::OK, Json(PaymentResponse::from(record))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub payment_method: String,
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<ConfirmRequest>,
) -> impl IntoResponse {
    match state.reconciler.confirm(payment_id, &req.payment_method).await {
        Ok(record) => (StatusCode::OK, Json(PaymentResponse::from(record))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "payments-service",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "UP", "service": "payments-service"})),
    )
}

fn validate_request(req: &PaymentRequest) -> Result<(), (StatusCode, ErrorEnvelope)> {
    if req.amount <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            err("INVALID_AMOUNT", "amount must be > 0"),
        ));
    }
    if let Some(currency) = &req.currency {
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err((
                StatusCode::BAD_REQUEST,
                err("INVALID_CURRENCY", "currency must be a 3-letter ISO code"),
            ));
        }
    }
    if req.subscription_id.is_empty() || req.user_id.is_empty() || req.user_email.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            err("MISSING_FIELD", "subscriptionId, userId and userEmail are required"),
        ));
    }
    Ok(())
}

pub(crate) fn error_response(e: PaymentError) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code) = match &e {
        PaymentError::Processor(_) => (StatusCode::BAD_GATEWAY, "PROCESSOR_ERROR"),
        PaymentError::Auth(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
        PaymentError::Malformed(_) => (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD"),
        PaymentError::RecordNotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
        PaymentError::ConflictingTransition { .. } => {
            (StatusCode::CONFLICT, "CONFLICTING_TRANSITION")
        }
        PaymentError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    (status, Json(err(code, &e.to_string())))
}

pub(crate) fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
