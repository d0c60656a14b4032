use async_trait::async_trait;
use log::{error, info, warn};

use crate::error::AppError;
use crate::models::OrderStatusResponse;
use crate::services::order_status_resolver::OrderStatusResolver;

/// Where the poller asks for the status of a payment intent.
#[async_trait]
pub trait OrderStatusSource: Send + Sync {
    async fn resolve_order_status(&self, payment_intent_id: &str) -> Result<OrderStatusResponse, AppError>;
}

/// The client-held cart. Only the confirmation flow's `completed` step clears it.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn clear_cart(&self) -> Result<(), AppError>;
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[async_trait]
impl OrderStatusSource for OrderStatusResolver {
    async fn resolve_order_status(&self, payment_intent_id: &str) -> Result<OrderStatusResponse, AppError> {
        Ok(OrderStatusResolver::resolve_order_status(self, payment_intent_id).await)
    }
}

/// Routes notifications to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!("[success] {}", message);
    }

    fn error(&self, message: &str) {
        error!("[error] {}", message);
    }

    fn warning(&self, message: &str) {
        warn!("[warning] {}", message);
    }
}
