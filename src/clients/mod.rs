pub mod order_status_client;

pub use order_status_client::OrderStatusClient;
