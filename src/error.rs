use thiserror::Error;

use crate::domain::payment::PaymentStatus;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment processor rejected the request: {0}")]
    Processor(String),

    #[error("webhook authentication failed: {0}")]
    Auth(String),

    #[error("malformed webhook payload: {0}")]
    Malformed(String),

    #[error("no payment record found for {0}")]
    RecordNotFound(String),

    #[error("terminal status {current:?} contradicts reported {target:?} for intent {external_intent_id}")]
    ConflictingTransition {
        external_intent_id: String,
        current: PaymentStatus,
        target: PaymentStatus,
    },

    #[error("payment store unavailable")]
    Store(#[source] anyhow::Error),
}
