//! Inbound webhook authentication: HMAC-SHA256 over `timestamp || payload`
//! with a signed-timestamp freshness window for replay protection.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window for the signed timestamp (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

// Clock skew allowance for timestamps from the future.
const FUTURE_TOLERANCE_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    /// No secret is configured; the event was accepted without
    /// authentication. Callers must surface this mode and never conflate it
    /// with a successful verification.
    Skipped,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            tolerance_secs,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Verification, PaymentError> {
        let Some(secret) = &self.secret else {
            return Ok(Verification::Skipped);
        };

        let header = signature_header
            .ok_or_else(|| PaymentError::Auth("missing signature header".to_string()))?;
        let parsed = SignatureHeader::parse(header)?;

        let age = now.timestamp() - parsed.timestamp;
        if age > self.tolerance_secs {
            return Err(PaymentError::Auth(format!(
                "signed timestamp too old ({age}s)"
            )));
        }
        if age < -FUTURE_TOLERANCE_SECS {
            return Err(PaymentError::Auth("signed timestamp in the future".to_string()));
        }

        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        // verify_slice compares in constant time; accept any v1 candidate.
        let verified = parsed
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok());

        if verified {
            Ok(Verification::Verified)
        } else {
            Err(PaymentError::Auth("signature mismatch".to_string()))
        }
    }
}

/// Produce a signature header over the payload. Counterpart of `verify`,
/// used by tests and local tooling to forge deliveries.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    // Header shape: "t=<unix seconds>,v1=<hex digest>[,v1=...]".
    fn parse(header: &str) -> Result<Self, PaymentError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => {
                    if let Ok(bytes) = hex::decode(value) {
                        signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| PaymentError::Auth("signature header missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(PaymentError::Auth(
                "signature header missing v1 digest".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            signatures,
        })
    }
}
