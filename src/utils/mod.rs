pub mod http_client;

pub use http_client::new_api_client;
