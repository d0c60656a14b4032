use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::collaborators::CartStore;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    #[serde(default)]
    pub variation_id: Option<String>,
    pub name: String,
    pub quantity: i32,
    pub unit_amount_cents: i64,
}

impl CartItem {
    fn same_line(&self, other: &CartItem) -> bool {
        self.product_id == other.product_id && self.variation_id == other.variation_id
    }
}

/// Process-local cart keyed by product and variation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCart {
    items: Arc<RwLock<Vec<CartItem>>>,
}

impl InMemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, merging quantities for an existing line.
    pub async fn add_item(&self, item: CartItem) -> Result<(), AppError> {
        if item.quantity <= 0 {
            return Err(AppError::Validation(format!(
                "Quantity must be positive, got {}",
                item.quantity
            )));
        }

        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.same_line(&item)) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                    AppError::Validation(format!("Quantity too large for {}", item.product_id))
                })?;
            }
            None => items.push(item),
        }
        Ok(())
    }

    pub async fn remove_item(&self, product_id: &str, variation_id: Option<&str>) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| {
            !(item.product_id == product_id && item.variation_id.as_deref() == variation_id)
        });
        items.len() != before
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.read().await.clone()
    }

    pub async fn total_cents(&self) -> i64 {
        self.items
            .read()
            .await
            .iter()
            .map(|item| item.unit_amount_cents.saturating_mul(i64::from(item.quantity)))
            .fold(0i64, i64::saturating_add)
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl CartStore for InMemoryCart {
    async fn clear_cart(&self) -> Result<(), AppError> {
        self.items.write().await.clear();
        Ok(())
    }
}
