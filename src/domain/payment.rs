use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initiated,
    Processing,
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed | PaymentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Initiated => "INITIATED",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INITIATED" => Some(PaymentStatus::Initiated),
            "PROCESSING" => Some(PaymentStatus::Processing),
            "PENDING" => Some(PaymentStatus::Pending),
            "SUCCESS" => Some(PaymentStatus::Success),
            "FAILED" => Some(PaymentStatus::Failed),
            "CANCELLED" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    Subscription,
    Renewal,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentType::Subscription => "SUBSCRIPTION",
            PaymentType::Renewal => "RENEWAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUBSCRIPTION" => Some(PaymentType::Subscription),
            "RENEWAL" => Some(PaymentType::Renewal),
            _ => None,
        }
    }
}

/// Status vocabulary reported by the processor, either as the mapped suffix
/// of a webhook event type or as the `status` field of a retrieved intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    Other(String),
}

impl ExternalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "succeeded" => ExternalStatus::Succeeded,
            "processing" => ExternalStatus::Processing,
            "requires_action" => ExternalStatus::RequiresAction,
            "requires_payment_method" => ExternalStatus::RequiresPaymentMethod,
            other => ExternalStatus::Other(other.to_string()),
        }
    }

    /// Target local state plus the failure reason for the catch-all case.
    pub fn target(&self) -> (PaymentStatus, Option<String>) {
        match self {
            ExternalStatus::Succeeded => (PaymentStatus::Success, None),
            ExternalStatus::Processing => (PaymentStatus::Processing, None),
            ExternalStatus::RequiresAction | ExternalStatus::RequiresPaymentMethod => {
                (PaymentStatus::Pending, None)
            }
            ExternalStatus::Other(raw) => (
                PaymentStatus::Failed,
                Some(format!("payment failed with processor status: {raw}")),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    Apply(PaymentStatus),
    Duplicate,
    Conflict,
}

// Terminal states never move. A target equal to the current state is a
// duplicate delivery and stays a no-op whether or not the state is terminal.
pub fn plan_transition(current: PaymentStatus, target: PaymentStatus) -> TransitionPlan {
    if target == current {
        TransitionPlan::Duplicate
    } else if current.is_terminal() {
        TransitionPlan::Conflict
    } else {
        TransitionPlan::Apply(target)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub subscription_id: String,
    pub user_id: String,
    pub user_email: String,
    pub external_intent_id: String,
    pub client_secret: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_type: PaymentType,
    pub attempt: i32,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub subscription_id: String,
    pub user_id: String,
    pub user_email: String,
    pub amount: i64,
    pub currency: Option<String>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub subscription_id: String,
    pub user_id: String,
    pub user_email: String,
    pub external_intent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub attempt: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(record: PaymentRecord) -> Self {
        PaymentResponse {
            id: record.payment_id,
            subscription_id: record.subscription_id,
            user_id: record.user_id,
            user_email: record.user_email,
            external_intent_id: record.external_intent_id,
            client_secret: record.client_secret,
            amount: record.amount_minor,
            currency: record.currency,
            status: record.status,
            payment_type: record.payment_type,
            attempt: record.attempt,
            failure_reason: record.failure_reason,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
