use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: i64,
    pub data: EventData,
    #[serde(default)]
    pub livemode: bool,
    pub api_version: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EventData {
    pub object: serde_json::Value,
}

// Event types handled by the order webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    PaymentIntentSucceeded,
    PaymentIntentPaymentFailed,
    PaymentIntentCanceled,
    Other(String),
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            super::EVENT_PAYMENT_INTENT_SUCCEEDED => EventType::PaymentIntentSucceeded,
            super::EVENT_PAYMENT_INTENT_PAYMENT_FAILED => EventType::PaymentIntentPaymentFailed,
            super::EVENT_PAYMENT_INTENT_CANCELED => EventType::PaymentIntentCanceled,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl Event {
    pub fn event_type(&self) -> EventType {
        EventType::parse(&self.type_)
    }
}
