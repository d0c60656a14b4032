use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::db::repositories::OrderRepository;
use crate::error::AppError;
use crate::models::{NewOrder, Order, OrderItem};
use crate::stripe_types::{
    PaymentIntent, PaymentIntentStatus, METADATA_CUSTOMER_EMAIL, METADATA_CUSTOMER_NAME, METADATA_ITEMS,
};

/// Write access used when a confirmed payment turns into an order.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn create_if_absent(&self, new_order: NewOrder) -> Result<(Order, bool), AppError>;
}

#[async_trait]
impl OrderSink for OrderRepository {
    async fn create_if_absent(&self, new_order: NewOrder) -> Result<(Order, bool), AppError> {
        OrderRepository::create_if_absent(self, new_order).await
    }
}

/// Builds the order snapshot captured at purchase time from a succeeded intent.
pub fn new_order_from_payment_intent(payment_intent: &PaymentIntent) -> Result<NewOrder, AppError> {
    if payment_intent.status != PaymentIntentStatus::Succeeded {
        return Err(AppError::InvalidArgument(format!(
            "Payment intent {} has not succeeded",
            payment_intent.id
        )));
    }

    let items = match payment_intent.metadata.get(METADATA_ITEMS) {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<OrderItem>>(raw).map_err(|e| {
            AppError::InvalidArgument(format!("Invalid items metadata on {}: {}", payment_intent.id, e))
        })?,
        _ => Vec::new(),
    };

    if let Some(item) = items.iter().find(|item| {
        item.quantity <= 0 || item.unit_amount_cents < 0 || item.line_total_cents().is_none()
    }) {
        return Err(AppError::InvalidArgument(format!(
            "Invalid line item {} on {}",
            item.product_id, payment_intent.id
        )));
    }

    let customer_email = metadata_value(payment_intent, METADATA_CUSTOMER_EMAIL)
        .or_else(|| payment_intent.receipt_email.clone());

    Ok(NewOrder {
        payment_intent_id: payment_intent.id.clone(),
        customer_email,
        customer_name: metadata_value(payment_intent, METADATA_CUSTOMER_NAME),
        items,
        total_amount_cents: payment_intent.settled_amount(),
        currency: payment_intent.currency.to_uppercase(),
    })
}

fn metadata_value(payment_intent: &PaymentIntent, key: &str) -> Option<String> {
    payment_intent
        .metadata
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Creates orders for confirmed payments. Safe under webhook re-delivery.
#[derive(Clone)]
pub struct OrderMaterializer {
    orders: Arc<dyn OrderSink>,
}

impl OrderMaterializer {
    pub fn new(orders: Arc<dyn OrderSink>) -> Self {
        Self { orders }
    }

    pub async fn materialize(&self, payment_intent: &PaymentIntent) -> Result<Order, AppError> {
        let new_order = new_order_from_payment_intent(payment_intent)?;
        let (order, created) = self.orders.create_if_absent(new_order).await?;

        if created {
            info!(
                payment_intent_id = %payment_intent.id,
                order_id = %order.id,
                total_amount_cents = order.total_amount_cents,
                "Materialized order from payment"
            );
        } else {
            info!(
                payment_intent_id = %payment_intent.id,
                order_id = %order.id,
                "Order already materialized, ignoring re-delivery"
            );
        }

        Ok(order)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory sink keyed by payment intent.
    #[derive(Default)]
    pub(crate) struct MemorySink {
        pub(crate) orders: Mutex<HashMap<String, Order>>,
    }

    #[async_trait]
    impl OrderSink for MemorySink {
        async fn create_if_absent(&self, new_order: NewOrder) -> Result<(Order, bool), AppError> {
            let mut orders = self.orders.lock().unwrap();
            if let Some(existing) = orders.get(&new_order.payment_intent_id) {
                return Ok((existing.clone(), false));
            }
            let now = Utc::now();
            let order = Order {
                id: Uuid::new_v4(),
                payment_intent_id: new_order.payment_intent_id.clone(),
                status: OrderStatus::Pending,
                customer_email: new_order.customer_email,
                customer_name: new_order.customer_name,
                items: new_order.items,
                total_amount_cents: new_order.total_amount_cents,
                currency: new_order.currency,
                created_at: now,
                updated_at: now,
            };
            orders.insert(new_order.payment_intent_id, order.clone());
            Ok((order, true))
        }
    }

    pub(crate) fn succeeded_intent(id: &str, metadata: &[(&str, &str)]) -> PaymentIntent {
        PaymentIntent {
            id: id.to_string(),
            object: Some("payment_intent".to_string()),
            amount: 4500,
            amount_received: Some(4500),
            currency: "usd".to_string(),
            customer: None,
            description: None,
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            status: PaymentIntentStatus::Succeeded,
            created: 1_700_000_000,
            receipt_email: Some("receipt@example.com".to_string()),
            cancellation_reason: None,
            last_payment_error: None,
        }
    }

    const ITEMS: &str =
        r#"[{"productId":"prod_mug","variationId":"blue","name":"Mug","quantity":3,"unitAmountCents":1500}]"#;

    #[test]
    fn test_snapshot_from_metadata() {
        let intent = succeeded_intent(
            "pi_123",
            &[(METADATA_CUSTOMER_EMAIL, "ada@example.com"), (METADATA_CUSTOMER_NAME, "Ada"), (METADATA_ITEMS, ITEMS)],
        );

        let new_order = new_order_from_payment_intent(&intent).unwrap();

        assert_eq!(new_order.payment_intent_id, "pi_123");
        assert_eq!(new_order.customer_email.as_deref(), Some("ada@example.com"));
        assert_eq!(new_order.customer_name.as_deref(), Some("Ada"));
        assert_eq!(new_order.items.len(), 1);
        assert_eq!(new_order.items[0].line_total_cents(), Some(4500));
        assert_eq!(new_order.total_amount_cents, 4500);
        assert_eq!(new_order.currency, "USD");
    }

    #[test]
    fn test_email_falls_back_to_receipt_email() {
        let intent = succeeded_intent("pi_123", &[]);
        let new_order = new_order_from_payment_intent(&intent).unwrap();
        assert_eq!(new_order.customer_email.as_deref(), Some("receipt@example.com"));
        assert!(new_order.items.is_empty());
    }

    #[test]
    fn test_rejects_malformed_items() {
        let intent = succeeded_intent("pi_123", &[(METADATA_ITEMS, "not json")]);
        assert!(matches!(
            new_order_from_payment_intent(&intent),
            Err(AppError::InvalidArgument(_))
        ));

        let negative = succeeded_intent(
            "pi_124",
            &[(METADATA_ITEMS, r#"[{"productId":"p","name":"P","quantity":0,"unitAmountCents":100}]"#)],
        );
        assert!(new_order_from_payment_intent(&negative).is_err());

        let overflowing = succeeded_intent(
            "pi_125",
            &[(
                METADATA_ITEMS,
                r#"[{"productId":"p","name":"P","quantity":2147483647,"unitAmountCents":9223372036854775807}]"#,
            )],
        );
        assert!(matches!(
            new_order_from_payment_intent(&overflowing),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_unsettled_intent() {
        let mut intent = succeeded_intent("pi_123", &[]);
        intent.status = PaymentIntentStatus::Processing;
        assert!(new_order_from_payment_intent(&intent).is_err());
    }

    #[tokio::test]
    async fn test_redelivery_returns_existing_order() {
        let sink = Arc::new(MemorySink::default());
        let materializer = OrderMaterializer::new(sink.clone());
        let intent = succeeded_intent("pi_123", &[(METADATA_ITEMS, ITEMS)]);

        let first = materializer.materialize(&intent).await.unwrap();
        let second = materializer.materialize(&intent).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, OrderStatus::Pending);
        assert_eq!(sink.orders.lock().unwrap().len(), 1);
    }
}
