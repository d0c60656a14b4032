pub mod health;
pub mod order_handlers;
pub mod webhook_handlers;
