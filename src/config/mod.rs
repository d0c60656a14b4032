pub mod settings;

pub use settings::{AppSettings, ClientSettings, PollingConfig};
