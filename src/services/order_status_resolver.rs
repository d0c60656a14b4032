use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::repositories::OrderRepository;
use crate::error::AppError;
use crate::models::{Order, OrderStatus, OrderStatusResponse};
use crate::services::stripe_service::StripeService;
use crate::stripe_types::{PaymentIntent, PaymentIntentStatus};

pub const MISSING_PAYMENT_INTENT_MESSAGE: &str = "Payment intent id is required";
pub const LOOKUP_UNAVAILABLE_MESSAGE: &str = "Unable to verify payment status. Please try again.";
const PAYMENT_CANCELLED_MESSAGE: &str = "Payment was cancelled";
const PAYMENT_FAILED_MESSAGE: &str = "Payment failed";

/// Read access to orders keyed by payment intent.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>, AppError>;
}

/// Read access to the payment provider's view of an intent.
#[async_trait]
pub trait PaymentIntentLookup: Send + Sync {
    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<Option<PaymentIntent>, AppError>;
}

#[async_trait]
impl OrderLookup for OrderRepository {
    async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>, AppError> {
        OrderRepository::find_by_payment_intent(self, payment_intent_id).await
    }
}

#[async_trait]
impl PaymentIntentLookup for StripeService {
    async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<Option<PaymentIntent>, AppError> {
        Ok(StripeService::retrieve_payment_intent(self, payment_intent_id).await?)
    }
}

/// Answers whether a payment intent has turned into an order yet.
///
/// Read-only: orders are created by the webhook handler, never here.
#[derive(Clone)]
pub struct OrderStatusResolver {
    orders: Arc<dyn OrderLookup>,
    payments: Arc<dyn PaymentIntentLookup>,
}

impl OrderStatusResolver {
    pub fn new(orders: Arc<dyn OrderLookup>, payments: Arc<dyn PaymentIntentLookup>) -> Self {
        Self { orders, payments }
    }

    /// Never fails: lookup errors are folded into `success: false`.
    pub async fn resolve_order_status(&self, payment_intent_id: &str) -> OrderStatusResponse {
        let payment_intent_id = payment_intent_id.trim();
        if payment_intent_id.is_empty() {
            return OrderStatusResponse::unavailable(MISSING_PAYMENT_INTENT_MESSAGE);
        }

        match self.try_resolve(payment_intent_id).await {
            Ok(response) => {
                debug!(
                    payment_intent_id = payment_intent_id,
                    status = %response.status,
                    order_id = ?response.order_id,
                    "Resolved order status"
                );
                response
            }
            Err(e) => {
                warn!(
                    payment_intent_id = payment_intent_id,
                    error = %e,
                    "Order status lookup failed"
                );
                OrderStatusResponse::unavailable(LOOKUP_UNAVAILABLE_MESSAGE)
            }
        }
    }

    async fn try_resolve(&self, payment_intent_id: &str) -> Result<OrderStatusResponse, AppError> {
        if let Some(order) = self.orders.find_by_payment_intent(payment_intent_id).await? {
            return Ok(Self::from_order(&order));
        }

        let Some(intent) = self.payments.retrieve_payment_intent(payment_intent_id).await? else {
            info!(payment_intent_id = payment_intent_id, "Payment intent not found");
            return Ok(OrderStatusResponse::not_found());
        };

        Ok(Self::from_payment_intent(&intent))
    }

    fn from_order(order: &Order) -> OrderStatusResponse {
        let order_id = order.id.to_string();

        match order.status {
            OrderStatus::Pending => OrderStatusResponse::processing(Some(order_id)),
            OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered => {
                OrderStatusResponse::completed(order_id)
            }
            OrderStatus::Cancelled => {
                OrderStatusResponse::failed(Some(order_id), "Order was cancelled")
            }
            OrderStatus::Refunded => {
                OrderStatusResponse::failed(Some(order_id), "Order was refunded")
            }
        }
    }

    fn from_payment_intent(intent: &PaymentIntent) -> OrderStatusResponse {
        match intent.status {
            PaymentIntentStatus::Succeeded
            | PaymentIntentStatus::Processing
            | PaymentIntentStatus::RequiresCapture
            | PaymentIntentStatus::RequiresAction
            | PaymentIntentStatus::RequiresConfirmation => OrderStatusResponse::processing(None),
            PaymentIntentStatus::Canceled => {
                let reason = intent
                    .cancellation_reason
                    .clone()
                    .unwrap_or_else(|| PAYMENT_CANCELLED_MESSAGE.to_string());
                OrderStatusResponse::failed(None, reason)
            }
            PaymentIntentStatus::RequiresPaymentMethod => {
                let reason = intent
                    .last_payment_error
                    .as_ref()
                    .and_then(|e| {
                        e.decline_code
                            .clone()
                            .or_else(|| e.code.clone())
                            .or_else(|| e.message.clone())
                    })
                    .unwrap_or_else(|| PAYMENT_FAILED_MESSAGE.to_string());
                OrderStatusResponse::failed(None, reason)
            }
        }
    }
}
