use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::payment::{PaymentRecord, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PaymentSuccess,
    PaymentFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub event_type: EventType,
    pub subscription_id: String,
    pub user_id: String,
    pub user_email: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PaymentEvent {
    // Only SUCCESS and FAILED notify downstream consumers.
    pub fn for_terminal(record: &PaymentRecord, now: DateTime<Utc>) -> Option<Self> {
        let event_type = match record.status {
            PaymentStatus::Success => EventType::PaymentSuccess,
            PaymentStatus::Failed => EventType::PaymentFailed,
            _ => return None,
        };

        Some(PaymentEvent {
            event_type,
            subscription_id: record.subscription_id.clone(),
            user_id: record.user_id.clone(),
            user_email: record.user_email.clone(),
            amount: record.amount_minor,
            currency: record.currency.clone(),
            reason: match event_type {
                EventType::PaymentFailed => record.failure_reason.clone(),
                EventType::PaymentSuccess => None,
            },
            timestamp: now,
        })
    }
}
