//! Storefront order service library
//!
//! Exports the modules shared by the API server and the payment
//! confirmation binary.

pub mod clients;
pub mod config;
pub mod confirmation;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod stripe_types;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::AppSettings;
pub use error::AppError;
