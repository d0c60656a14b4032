use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    pub amount: i64,
    pub amount_received: Option<i64>,
    pub currency: String,
    pub customer: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub status: PaymentIntentStatus,
    pub created: i64,
    pub receipt_email: Option<String>,
    pub cancellation_reason: Option<String>,
    pub last_payment_error: Option<PaymentIntentError>,
}

impl PaymentIntent {
    /// Amount actually captured, falling back to the requested amount.
    pub fn settled_amount(&self) -> i64 {
        self.amount_received
            .filter(|received| *received > 0)
            .unwrap_or(self.amount)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PaymentIntentError {
    pub code: Option<String>,
    pub decline_code: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}
