pub mod order_materializer;
pub mod order_status_resolver;
pub mod stripe_service;

// Re-export commonly used types
pub use order_materializer::{OrderMaterializer, OrderSink};
pub use order_status_resolver::{OrderLookup, OrderStatusResolver, PaymentIntentLookup};
pub use stripe_service::{StripeService, StripeServiceError};
