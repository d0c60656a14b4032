use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use log::{debug, info};

use crate::error::AppError;
use crate::models::{NewOrder, Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str = r#"
    id, payment_intent_id, status, customer_email, customer_name,
    items, total_amount_cents, currency, created_at, updated_at
"#;

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: Uuid,
    payment_intent_id: String,
    status: String,
    customer_email: Option<String>,
    customer_name: Option<String>,
    items: Json<Vec<OrderItem>>,
    total_amount_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| AppError::Database(format!("Corrupt status on order {}: {}", row.id, e)))?;

        Ok(Order {
            id: row.id,
            payment_intent_id: row.payment_intent_id,
            status,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            items: row.items.0,
            total_amount_cents: row.total_amount_cents,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_payment_intent(&self, payment_intent_id: &str) -> Result<Option<Order>, AppError> {
        let query = format!("SELECT {} FROM orders WHERE payment_intent_id = $1", ORDER_COLUMNS);

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(payment_intent_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch order by payment intent: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: &Uuid) -> Result<Order, AppError> {
        let query = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => AppError::NotFound(format!("Order not found: {}", id)),
                _ => AppError::Database(format!("Failed to fetch order: {}", e)),
            })?;

        Order::try_from(row)
    }

    /// Inserts the order unless one already exists for its payment intent.
    /// Returns the stored order and whether this call created it.
    pub async fn create_if_absent(&self, new_order: NewOrder) -> Result<(Order, bool), AppError> {
        let query = format!(
            r#"
            INSERT INTO orders (
                id, payment_intent_id, status, customer_email, customer_name,
                items, total_amount_cents, currency, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            ON CONFLICT (payment_intent_id) DO NOTHING
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let inserted = sqlx::query_as::<_, OrderRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&new_order.payment_intent_id)
            .bind(OrderStatus::Pending.as_str())
            .bind(&new_order.customer_email)
            .bind(&new_order.customer_name)
            .bind(Json(&new_order.items))
            .bind(new_order.total_amount_cents)
            .bind(&new_order.currency)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create order: {}", e)))?;

        match inserted {
            Some(row) => {
                let order = Order::try_from(row)?;
                info!("Created order {} for payment intent {}", order.id, order.payment_intent_id);
                Ok((order, true))
            }
            None => {
                debug!("Order already exists for payment intent {}", new_order.payment_intent_id);
                let existing = self
                    .find_by_payment_intent(&new_order.payment_intent_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database(format!(
                            "Order for payment intent {} vanished after conflict",
                            new_order.payment_intent_id
                        ))
                    })?;
                Ok((existing, false))
            }
        }
    }

    /// Moves an order to `next`, rejecting transitions the status table forbids.
    pub async fn update_status(&self, id: &Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(String,)> = sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to lock order: {}", e)))?;

        let current = current
            .ok_or_else(|| AppError::NotFound(format!("Order not found: {}", id)))?
            .0
            .parse::<OrderStatus>()?;

        current.transition(next)?;

        let query = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        );
        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .bind(next.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update order status: {}", e)))?;

        tx.commit().await?;

        info!("Order {} moved from {} to {}", id, current, next);
        Order::try_from(row)
    }
}
