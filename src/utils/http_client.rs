use reqwest::Client;
use std::time::Duration;

use crate::error::AppError;

/// Shared HTTP client for outbound calls (payment provider, order status API).
pub fn new_api_client() -> Result<Client, AppError> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        // Below the server's keep-alive so pooled connections are never stale
        .pool_idle_timeout(Some(Duration::from_secs(60)))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}
