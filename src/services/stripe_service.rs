use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use log::{debug, warn};

use crate::config::settings::StripeConfig;
use crate::stripe_types::{ApiErrorResponse, Event, PaymentIntent, ERROR_CODE_RESOURCE_MISSING};

#[derive(Debug, thiserror::Error)]
pub enum StripeServiceError {
    #[error("Stripe request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

type HmacSha256 = Hmac<Sha256>;

/// Thin client over the Stripe REST endpoints this service needs.
#[derive(Clone)]
pub struct StripeService {
    client: Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
    webhook_tolerance_secs: i64,
}

impl StripeService {
    pub fn new(client: Client, config: &StripeConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
        }
    }

    /// Retrieve a PaymentIntent by ID. Unknown intents resolve to `None`.
    pub async fn retrieve_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<PaymentIntent>, StripeServiceError> {
        if payment_intent_id.trim().is_empty() {
            return Err(StripeServiceError::Configuration(
                "Payment intent id must not be empty".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/payment_intents/{}",
            self.api_base,
            urlencoding::encode(payment_intent_id)
        );
        debug!("Retrieving PaymentIntent {}", payment_intent_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payment_intent = response.json::<PaymentIntent>().await?;
            return Ok(Some(payment_intent));
        }

        let body = response.text().await.unwrap_or_default();
        let api_error = serde_json::from_str::<ApiErrorResponse>(&body).ok();

        if status == StatusCode::NOT_FOUND {
            let missing = api_error
                .as_ref()
                .and_then(|e| e.error.code.as_deref())
                .map_or(true, |code| code == ERROR_CODE_RESOURCE_MISSING);
            if missing {
                debug!("PaymentIntent {} is unknown to Stripe", payment_intent_id);
                return Ok(None);
            }
        }

        let message = api_error
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("unexpected response body: {}", body));
        warn!("Stripe returned {} for PaymentIntent {}: {}", status, payment_intent_id, message);

        Err(StripeServiceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Verify webhook signature against the current time
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<(), StripeServiceError> {
        self.verify_webhook_signature_at(payload, signature, Utc::now().timestamp())
    }

    pub fn verify_webhook_signature_at(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> Result<(), StripeServiceError> {
        let mut timestamp = "";
        let mut signatures = Vec::new();

        for element in signature.split(',') {
            let element = element.trim();
            if let Some(t) = element.strip_prefix("t=") {
                timestamp = t;
            } else if let Some(s) = element.strip_prefix("v1=") {
                signatures.push(s);
            }
        }

        if timestamp.is_empty() || signatures.is_empty() {
            return Err(StripeServiceError::WebhookVerification(
                "Invalid signature format".to_string(),
            ));
        }

        let signed_at: i64 = timestamp.parse().map_err(|_| {
            StripeServiceError::WebhookVerification("Invalid signature timestamp".to_string())
        })?;
        let tolerance = u64::try_from(self.webhook_tolerance_secs).unwrap_or(0);
        if now.abs_diff(signed_at) > tolerance {
            return Err(StripeServiceError::WebhookVerification(
                "Signature timestamp outside the tolerance window".to_string(),
            ));
        }

        let expected_signature = compute_signature(&self.webhook_secret, timestamp, payload)?;

        let matched = signatures
            .iter()
            .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected_signature.as_bytes())));

        if matched {
            Ok(())
        } else {
            Err(StripeServiceError::WebhookVerification(
                "Signature verification failed".to_string(),
            ))
        }
    }

    /// Parse webhook event from payload
    pub fn parse_webhook_event(&self, payload: &str) -> Result<Event, StripeServiceError> {
        serde_json::from_str(payload)
            .map_err(|e| StripeServiceError::WebhookVerification(format!("Failed to parse event: {}", e)))
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    payload: &str,
) -> Result<String, StripeServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| StripeServiceError::WebhookVerification(format!("HMAC error: {}", e)))?;
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stripe_types::PaymentIntentStatus;

    fn service(api_base: &str) -> StripeService {
        StripeService::new(
            Client::new(),
            &StripeConfig {
                secret_key: "sk_test_123".to_string(),
                webhook_secret: "whsec_test".to_string(),
                api_base: api_base.to_string(),
                webhook_tolerance_secs: 300,
            },
        )
    }

    #[test]
    fn test_valid_signature_accepted() {
        let service = service("http://unused");
        let payload = r#"{"id":"evt_1"}"#;
        let sig = compute_signature("whsec_test", "1700000000", payload).unwrap();
        let header = format!("t=1700000000,v1={}", sig);

        assert!(service.verify_webhook_signature_at(payload, &header, 1700000100).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = service("http://unused");
        let sig = compute_signature("whsec_test", "1700000000", r#"{"id":"evt_1"}"#).unwrap();
        let header = format!("t=1700000000,v1={}", sig);

        let result = service.verify_webhook_signature_at(r#"{"id":"evt_2"}"#, &header, 1700000000);
        assert!(matches!(result, Err(StripeServiceError::WebhookVerification(_))));
    }

    #[test]
    fn test_stale_signature_rejected() {
        let service = service("http://unused");
        let payload = "{}";
        let sig = compute_signature("whsec_test", "1700000000", payload).unwrap();
        let header = format!("t=1700000000,v1={}", sig);

        let result = service.verify_webhook_signature_at(payload, &header, 1700000301);
        assert!(result.is_err());
    }

    #[test]
    fn test_extreme_timestamp_rejected() {
        let service = service("http://unused");
        for timestamp in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1=00", timestamp);
            let result = service.verify_webhook_signature_at("{}", &header, 1_700_000_000);
            assert!(matches!(result, Err(StripeServiceError::WebhookVerification(_))));
        }
    }

    #[test]
    fn test_malformed_header_rejected() {
        let service = service("http://unused");
        assert!(service.verify_webhook_signature_at("{}", "garbage", 0).is_err());
        assert!(service.verify_webhook_signature_at("{}", "t=abc,v1=00", 0).is_err());
    }

    #[tokio::test]
    async fn test_retrieve_payment_intent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/payment_intents/pi_123")
            .match_header("authorization", "Bearer sk_test_123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"pi_123","object":"payment_intent","amount":2500,"amount_received":2500,
                    "currency":"usd","customer":null,"description":null,"metadata":{},
                    "status":"succeeded","created":1700000000,"receipt_email":null,
                    "cancellation_reason":null,"last_payment_error":null}"#,
            )
            .create_async()
            .await;

        let intent = service(&server.url())
            .retrieve_payment_intent("pi_123")
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(intent.status, PaymentIntentStatus::Succeeded);
        assert_eq!(intent.settled_amount(), 2500);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_payment_intent_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/payment_intents/pi_missing")
            .with_status(404)
            .with_body(r#"{"error":{"code":"resource_missing","message":"No such payment_intent","type":"invalid_request_error"}}"#)
            .create_async()
            .await;

        let intent = service(&server.url())
            .retrieve_payment_intent("pi_missing")
            .await
            .unwrap();
        assert!(intent.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/payment_intents/pi_500")
            .with_status(500)
            .with_body(r#"{"error":{"message":"Something went wrong","type":"api_error"}}"#)
            .create_async()
            .await;

        let result = service(&server.url()).retrieve_payment_intent("pi_500").await;
        match result {
            Err(StripeServiceError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Something went wrong");
            }
            other => panic!("expected api error, got {:?}", other.map(|_| ())),
        }
    }
}
