//! Verification of inbound webhook deliveries
//!
//! Polar signs deliveries with the Standard Webhooks scheme: the
//! `webhook-signature` header carries one or more space separated
//! `v1,<base64 HMAC-SHA256>` entries computed over `{id}.{timestamp}.{body}`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use polar_sdk::types::WebhookSecret;
//! use polar_sdk::webhooks::Webhook;
//!
//! let webhook = Webhook::new(&WebhookSecret::new("polar_whs_...")?)?;
//! let payload = webhook.verify(&headers, &body)?;
//! match payload.event_type.as_str() {
//!     "order.paid" => { /* fulfil */ }
//!     _ => {}
//! }
//! ```

use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::error::{PolarError, PolarResult};
use crate::types::WebhookSecret;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "webhook-id";
pub const HEADER_TIMESTAMP: &str = "webhook-timestamp";
pub const HEADER_SIGNATURE: &str = "webhook-signature";

/// Accepted clock skew between the delivery timestamp and now.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// A verified delivery.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// e.g. `order.paid`, `subscription.canceled`
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl WebhookPayload {
    /// Deserialize `data` into a resource type such as
    /// [`Order`](crate::api::orders::Order).
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> PolarResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Webhook signature verifier.
#[derive(Clone)]
pub struct Webhook {
    key: Vec<u8>,
    tolerance: Duration,
}

impl Webhook {
    /// The key is the secret's UTF-8 bytes, or the base64 decoded remainder
    /// for a `whsec_` secret.
    pub fn new(secret: &WebhookSecret) -> PolarResult<Self> {
        let secret = secret.as_str();
        let key = match secret.strip_prefix(SECRET_PREFIX) {
            Some(encoded) => BASE64
                .decode(encoded)
                .map_err(|e| PolarError::Config(format!("Invalid webhook secret: {e}")))?,
            None => secret.as_bytes().to_vec(),
        };
        Ok(Self {
            key,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify a delivery from its request headers and raw body.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> PolarResult<WebhookPayload> {
        let id = header(headers, HEADER_ID)?;
        let timestamp = header(headers, HEADER_TIMESTAMP)?;
        let signature = header(headers, HEADER_SIGNATURE)?;
        self.verify_parts(id, timestamp, signature, body)
    }

    pub fn verify_parts(
        &self,
        id: &str,
        timestamp: &str,
        signature: &str,
        body: &[u8],
    ) -> PolarResult<WebhookPayload> {
        self.verify_at(id, timestamp, signature, body, Utc::now())
    }

    /// Verify against an explicit clock.
    pub fn verify_at(
        &self,
        id: &str,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> PolarResult<WebhookPayload> {
        let timestamp = timestamp.trim();
        let sent_at: i64 = timestamp.parse().map_err(|_| {
            warn!("[Polar] webhook {id}: invalid timestamp {timestamp:?}");
            PolarError::Signature("Invalid webhook-timestamp header".to_string())
        })?;

        let skew = now.timestamp().abs_diff(sent_at);
        if skew > self.tolerance.as_secs() {
            warn!(
                "[Polar] webhook {id}: timestamp {sent_at} outside tolerance ({skew}s skew)"
            );
            return Err(PolarError::Signature(format!(
                "Timestamp {sent_at} is outside the {}s tolerance",
                self.tolerance.as_secs()
            )));
        }

        let candidates: Vec<Vec<u8>> = signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| BASE64.decode(sig).ok())
            .collect();
        if candidates.is_empty() {
            return Err(PolarError::Signature(
                "No v1 signature in webhook-signature header".to_string(),
            ));
        }

        let mac = self.mac(id, timestamp, body)?;
        if !candidates
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok())
        {
            warn!("[Polar] webhook {id}: signature mismatch");
            return Err(PolarError::Signature(
                "Signature verification failed".to_string(),
            ));
        }

        debug!("[Polar] webhook {id}: signature verified");
        serde_json::from_slice(body).map_err(|e| {
            PolarError::Signature(format!("Verified body is not a webhook payload: {e}"))
        })
    }

    /// `v1,<base64>` signature for a delivery. Useful for forwarding and
    /// tests.
    pub fn sign(&self, id: &str, timestamp: i64, body: &[u8]) -> PolarResult<String> {
        let digest = self
            .mac(id, &timestamp.to_string(), body)?
            .finalize()
            .into_bytes();
        Ok(format!("{SIGNATURE_VERSION},{}", BASE64.encode(digest)))
    }

    /// MAC over `{id}.{timestamp}.{body}`, with the timestamp exactly as sent.
    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> PolarResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| PolarError::Config(format!("Invalid webhook key: {e}")))?;
        mac.update(format!("{id}.{timestamp}.").as_bytes());
        mac.update(body);
        Ok(mac)
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Webhook")
            .field("key", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> PolarResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| PolarError::Signature(format!("Missing {name} header")))
}
