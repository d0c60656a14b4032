use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;

use crate::confirmation::OrderStatusSource;
use crate::error::AppError;
use crate::models::OrderStatusResponse;

pub const ORDER_STATUS_PATH: &str = "/api/orders/status";

/// HTTP client for the order status endpoint, used by the confirmation flow
/// when it runs outside the server process.
#[derive(Debug, Clone)]
pub struct OrderStatusClient {
    http_client: Client,
    base_url: String,
}

impl OrderStatusClient {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http_client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_status(&self, payment_intent_id: &str) -> Result<OrderStatusResponse, AppError> {
        let url = format!("{}{}", self.base_url, ORDER_STATUS_PATH);
        debug!("Requesting order status for payment intent {}", payment_intent_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("payment_intent", payment_intent_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            warn!("Order status request failed with {}: {}", status, error_text);
            return Err(AppError::External(format!(
                "Order status request failed (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str::<OrderStatusResponse>(&body)
            .map_err(|e| AppError::InvalidResponse(format!("Malformed order status response: {}", e)))
    }
}

#[async_trait]
impl OrderStatusSource for OrderStatusClient {
    async fn resolve_order_status(&self, payment_intent_id: &str) -> Result<OrderStatusResponse, AppError> {
        self.fetch_status(payment_intent_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolvedStatus;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn client_for(server: &mockito::ServerGuard) -> OrderStatusClient {
        OrderStatusClient::new(Client::new(), format!("{}/", server.url()))
    }

    #[tokio::test]
    async fn test_parses_completed_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", ORDER_STATUS_PATH)
            .match_query(Matcher::UrlEncoded("payment_intent".into(), "pi_123".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"status":"completed","orderId":"ord_9"}"#)
            .create_async()
            .await;

        let response = client_for(&server).fetch_status("pi_123").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response, OrderStatusResponse::completed("ord_9"));
    }

    #[tokio::test]
    async fn test_failed_payload_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ORDER_STATUS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"success":true,"status":"failed","error":"card_declined"}"#)
            .create_async()
            .await;

        let response = client_for(&server).resolve_order_status("pi_456").await.unwrap();

        assert_eq!(response.status, ResolvedStatus::Failed);
        assert_eq!(response.error.as_deref(), Some("card_declined"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ORDER_STATUS_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let result = client_for(&server).fetch_status("pi_123").await;

        assert!(matches!(result, Err(AppError::External(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ORDER_STATUS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let result = client_for(&server).fetch_status("pi_123").await;

        assert!(matches!(result, Err(AppError::InvalidResponse(_))));
    }
}
