//! Custom Stripe types module

pub mod enums;
pub mod event;
pub mod payment_intent;

// Re-export all types for convenience
pub use enums::*;
pub use event::{Event, EventData, EventType};
pub use payment_intent::{PaymentIntent, PaymentIntentError, PaymentIntentStatus};

/// Error envelope returned by the Stripe REST API.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}
