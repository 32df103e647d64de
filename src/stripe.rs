// src/stripe.rs
//
// Payment provider seam. The orchestrator only sees the CheckoutProvider
// trait; main picks StripeCheckout when STRIPE_API_KEY/STRIPE_WEBHOOK_SECRET
// are configured and MockCheckout otherwise.

use std::fmt;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug)]
pub enum ProviderError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
    BadSignature(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http(e) => write!(f, "http error: {e}"),
            ProviderError::Api { status, body } => {
                write!(f, "stripe api error status={status} body={body}")
            }
            ProviderError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
            ProviderError::BadSignature(e) => write!(f, "bad webhook signature: {e}"),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    /// Minor units (cents) as the provider expects.
    pub amount_minor: i64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutStatus {
    pub status: String,
    pub payment_status: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_type: String,
    pub session_id: Option<String>,
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<CheckoutSession, ProviderError>;

    async fn query_status(&self, session_id: &str) -> Result<CheckoutStatus, ProviderError>;

    fn verify_webhook(&self, body: &[u8], signature: &str) -> Result<WebhookEvent, ProviderError>;
}

/// HMAC-SHA256 in hex, the primitive behind Stripe's `v1` webhook scheme.
pub fn sign_hmac_sha256_hex(secret: &str, data: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    let result = mac.finalize().into_bytes();
    hex::encode(result)
}

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

fn decode_event(body: &[u8]) -> Result<WebhookEvent, ProviderError> {
    let event: StripeEvent = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("event decode: {e}")))?;
    let session_id = event
        .data
        .object
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    Ok(WebhookEvent {
        event_type: event.event_type,
        session_id,
    })
}

pub struct StripeCheckout {
    api_key: String,
    webhook_secret: String,
    api_base: String,
    client: reqwest::Client,
}

impl StripeCheckout {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        let api_base = std::env::var("STRIPE_API_BASE_URL")
            .unwrap_or_else(|_| STRIPE_API_BASE.to_string());
        Self {
            api_key,
            webhook_secret,
            api_base,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), req.success_url),
            ("cancel_url".into(), req.cancel_url),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                req.currency,
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                req.amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                req.product_name,
            ),
        ];
        for (key, value) in req.metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let session: StripeSessionResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{e}; body={body}")))?;
        let url = session
            .url
            .ok_or_else(|| ProviderError::InvalidResponse("session has no url".to_string()))?;

        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    async fn query_status(&self, session_id: &str) -> Result<CheckoutStatus, ProviderError> {
        let resp = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{session_id}",
                self.api_base
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let session: StripeSessionResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{e}; body={body}")))?;

        Ok(CheckoutStatus {
            status: session.status.unwrap_or_else(|| "unknown".to_string()),
            payment_status: session
                .payment_status
                .unwrap_or_else(|| "unknown".to_string()),
            amount_total: session.amount_total,
            currency: session.currency,
        })
    }

    /// Stripe signature header: `t=<timestamp>,v1=<hex hmac>[,v1=...]` where the
    /// signed payload is `"{t}.{raw body}"`.
    fn verify_webhook(&self, body: &[u8], signature: &str) -> Result<WebhookEvent, ProviderError> {
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();
        for part in signature.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| ProviderError::BadSignature("no timestamp in header".to_string()))?;
        if candidates.is_empty() {
            return Err(ProviderError::BadSignature(
                "no v1 signature in header".to_string(),
            ));
        }

        let payload = String::from_utf8_lossy(body);
        let expected = sign_hmac_sha256_hex(&self.webhook_secret, &format!("{timestamp}.{payload}"));
        if !candidates.iter().any(|c| *c == expected) {
            return Err(ProviderError::BadSignature(
                "signature mismatch".to_string(),
            ));
        }

        decode_event(body)
    }
}

/// Stand-in provider for local development and tests: sessions are issued
/// locally and every status query reports a paid session.
pub struct MockCheckout;

#[async_trait]
impl CheckoutProvider for MockCheckout {
    async fn create_session(
        &self,
        req: CreateSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let session_id = format!("cs_mock_{}", Uuid::new_v4().simple());
        let url = req
            .success_url
            .replace("{CHECKOUT_SESSION_ID}", &session_id);
        Ok(CheckoutSession { session_id, url })
    }

    async fn query_status(&self, _session_id: &str) -> Result<CheckoutStatus, ProviderError> {
        Ok(CheckoutStatus {
            status: "complete".to_string(),
            payment_status: "paid".to_string(),
            amount_total: None,
            currency: None,
        })
    }

    fn verify_webhook(&self, body: &[u8], _signature: &str) -> Result<WebhookEvent, ProviderError> {
        decode_event(body)
    }
}
