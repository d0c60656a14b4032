// Stripe enum constants for type safety and consistency

// Webhook Event Types
pub const EVENT_PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EVENT_PAYMENT_INTENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";
pub const EVENT_PAYMENT_INTENT_CANCELED: &str = "payment_intent.canceled";

// Payment intent metadata keys written at checkout
pub const METADATA_CUSTOMER_EMAIL: &str = "customer_email";
pub const METADATA_CUSTOMER_NAME: &str = "customer_name";
pub const METADATA_ITEMS: &str = "items";

// Stripe API error codes
pub const ERROR_CODE_RESOURCE_MISSING: &str = "resource_missing";
