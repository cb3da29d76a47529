use serde::Deserialize;

use crate::domain::payment::ExternalStatus;
use crate::error::PaymentError;

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub object: serde_json::Value,
}

impl ProcessorEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(payload)
            .map_err(|e| PaymentError::Malformed(format!("invalid event JSON: {e}")))
    }

    /// External status carried by the event type, for the event families the
    /// reconciler consumes. Anything else is acknowledged and ignored.
    pub fn external_status(&self) -> Option<ExternalStatus> {
        let raw = match self.event_type.as_str() {
            "payment_intent.succeeded" | "charge.succeeded" => "succeeded",
            "payment_intent.payment_failed" | "charge.failed" => "failed",
            "payment_intent.processing" => "processing",
            "payment_intent.requires_action" => "requires_action",
            _ => return None,
        };

        Some(ExternalStatus::parse(raw))
    }

    /// Intent id at the object root (intent-level events) or nested under
    /// `payment_intent` (charge-level events, as a string or an expanded
    /// object). Absent on events the reconciler cannot correlate.
    pub fn intent_id(&self) -> Option<String> {
        let object = &self.data.object;

        if let Some(id) = object.get("id").and_then(|v| v.as_str()) {
            if id.starts_with("pi_") {
                return Some(id.to_string());
            }
        }

        match object.get("payment_intent") {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            Some(serde_json::Value::Object(nested)) => nested
                .get("id")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            _ => None,
        }
    }
}
