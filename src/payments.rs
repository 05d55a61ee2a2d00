//! Hosted checkout through a Stripe-compatible payment provider.
//!
//! The service never touches card data: it asks the provider for a checkout
//! session, redirects the buyer to the session url, and learns the outcome
//! from the signed webhook.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::{config::StripeConfig, errors::AppError};

type HmacSha256 = Hmac<Sha256>;

/// Signed webhooks older than this are rejected.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub course_title: String,
    pub thumbnail: Option<String>,
    /// Smallest currency unit.
    pub unit_amount: i64,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession, AppError>;
}

/// Stands in when no secret key is configured; paid checkouts answer 503.
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_checkout_session(&self, _request: CheckoutSessionRequest) -> Result<CheckoutSession, AppError> {
        Err(AppError::PaymentUnavailable)
    }
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
    currency: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, api_base: String, currency: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            api_base,
            currency,
        }
    }

    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        config.secret_key.clone().map(|secret_key| {
            Self::new(secret_key, config.api_base.clone(), config.currency.clone())
        })
    }

    fn form(&self, request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), self.currency.clone()),
            ("line_items[0][price_data][unit_amount]".to_string(), request.unit_amount.to_string()),
            ("line_items[0][price_data][product_data][name]".to_string(), request.course_title.clone()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("metadata[courseId]".to_string(), request.course_id.to_string()),
            ("metadata[userId]".to_string(), request.user_id.to_string()),
        ];
        if let Some(thumbnail) = &request.thumbnail {
            form.push((
                "line_items[0][price_data][product_data][images][0]".to_string(),
                thumbnail.clone(),
            ));
        }
        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession, AppError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&self.form(&request))
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentProvider(format!("checkout session rejected ({status}): {body}")));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))
    }
}

/// Checks a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against the raw body.
pub fn verify_webhook_signature(
    payload:&[u8],
    header:&str,
    secret:&str,
    now:i64,
) -> Result<(), AppError>{
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| AppError::BadRequest("Malformed webhook signature".to_string()))?;
    if signatures.is_empty() {
        return Err(AppError::BadRequest("Malformed webhook signature".to_string()));
    }
    if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(AppError::BadRequest("Webhook timestamp outside tolerance".to_string()));
    }

    let mac = signed_mac(payload, timestamp, secret);
    // verify_slice compares in constant time
    let matched = signatures
        .iter()
        .filter_map(|signature| hex::decode(signature).ok())
        .any(|signature| mac.clone().verify_slice(&signature).is_ok());

    if matched {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid webhook signature".to_string()))
    }
}

fn signed_mac(payload:&[u8], timestamp:i64, secret:&str) -> HmacSha256{
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn sign_payload(payload:&[u8], timestamp:i64, secret:&str) -> String{
    hex::encode(signed_mac(payload, timestamp, secret).finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub amount_total: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"type":"checkout.session.completed"}"#;

    #[test]
    fn test_valid_signature(){
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign_payload(BODY, now, SECRET));

        assert!(verify_webhook_signature(BODY, &header, SECRET, now + 10).is_ok());
    }

    #[test]
    fn test_any_v1_signature_may_match(){
        let now = 1_700_000_000;
        let header = format!("t={now},v1=deadbeef,v0=ignored,v1={}", sign_payload(BODY, now, SECRET));

        assert!(verify_webhook_signature(BODY, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_tampered_body_is_rejected(){
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign_payload(BODY, now, SECRET));

        let err = verify_webhook_signature(b"{}", &header, SECRET, now).unwrap_err();
        assert_eq!(err.to_string(), "Invalid webhook signature");
    }

    #[test]
    fn test_truncated_or_non_hex_signature_is_rejected(){
        let now = 1_700_000_000;
        let signature = sign_payload(BODY, now, SECRET);

        for v1 in [&signature[..32], "zz", "not-hex-at-all"] {
            let header = format!("t={now},v1={v1}");
            let err = verify_webhook_signature(BODY, &header, SECRET, now).unwrap_err();
            assert_eq!(err.to_string(), "Invalid webhook signature", "v1: {v1:?}");
        }

        let header = format!("t={now},v1={}", signature.to_uppercase());
        assert!(verify_webhook_signature(BODY, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_stale_timestamp_is_rejected(){
        let then = 1_700_000_000;
        let header = format!("t={then},v1={}", sign_payload(BODY, then, SECRET));

        let err = verify_webhook_signature(BODY, &header, SECRET, then + WEBHOOK_TOLERANCE_SECS + 1).unwrap_err();
        assert_eq!(err.to_string(), "Webhook timestamp outside tolerance");
    }

    #[test]
    fn test_malformed_header_is_rejected(){
        for header in ["", "v1=abc", "t=notanumber,v1=abc", "t=1700000000"] {
            let err = verify_webhook_signature(BODY, header, SECRET, 1_700_000_000).unwrap_err();
            assert_eq!(err.to_string(), "Malformed webhook signature", "header: {header:?}");
        }
    }

    #[test]
    fn test_checkout_form_carries_line_item_and_metadata(){
        let gateway = StripeGateway::new("sk_test".into(), "http://localhost".into(), "inr".into());
        let course_id = Uuid::new_v4();
        let form = gateway.form(&CheckoutSessionRequest {
            course_id,
            user_id: Uuid::new_v4(),
            course_title: "Docker in depth".to_string(),
            thumbnail: Some("https://img.example.com/docker.png".to_string()),
            unit_amount: 49_900,
            success_url: "http://localhost:5173/course-progress/x".to_string(),
            cancel_url: "http://localhost:5173/course-detail/x".to_string(),
        });

        let get = |key: &str| form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("49900"));
        assert_eq!(get("line_items[0][price_data][currency]"), Some("inr"));
        assert_eq!(get("metadata[courseId]"), Some(course_id.to_string().as_str()));
        assert_eq!(
            get("line_items[0][price_data][product_data][images][0]"),
            Some("https://img.example.com/docker.png")
        );
    }

    #[test]
    fn test_webhook_event_parsing(){
        let raw = r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_test_1","amount_total":49900}}}"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");

        let session: CheckoutSessionObject = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.amount_total, Some(49900));
    }
}
