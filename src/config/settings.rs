use std::env;
use std::str::FromStr;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub stripe: StripeConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
    pub webhook_tolerance_secs: i64,
}

/// Settings for the confirmation-page side of the flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientSettings {
    pub server_base_url: String,
    pub polling: PollingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval_ms: 3000,
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| AppError::Configuration(format!("{} must be set", key)))
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Configuration(format!("{} must be a valid number", key))),
        None => Ok(default),
    }
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // App config
        let app_name = lookup("APP_NAME").unwrap_or_else(|| "storefront-orders".to_string());
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        // Database config
        let database_url = required(&lookup, "DATABASE_URL")?;
        let max_connections = parsed_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        // Server config
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Server URL
        let server_url = lookup("SERVER_URL")
            .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port));

        // Stripe configuration
        let stripe_secret_key = required(&lookup, "STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = required(&lookup, "STRIPE_WEBHOOK_SECRET")?;
        let stripe_api_base = lookup("STRIPE_API_BASE")
            .unwrap_or_else(|| "https://api.stripe.com".to_string())
            .trim_end_matches('/')
            .to_string();
        let webhook_tolerance_secs = parsed_or(&lookup, "STRIPE_WEBHOOK_TOLERANCE_SECS", 300i64)?;
        if webhook_tolerance_secs < 0 {
            return Err(AppError::Configuration(
                "STRIPE_WEBHOOK_TOLERANCE_SECS must not be negative".to_string(),
            ));
        }

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
                url: server_url,
            },
            stripe: StripeConfig {
                secret_key: stripe_secret_key,
                webhook_secret: stripe_webhook_secret,
                api_base: stripe_api_base,
                webhook_tolerance_secs,
            },
        })
    }
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PollingConfig::default();

        let server_base_url = lookup("ORDER_SERVER_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let max_attempts = parsed_or(&lookup, "ORDER_POLL_MAX_ATTEMPTS", defaults.max_attempts)?;
        let interval_ms = parsed_or(&lookup, "ORDER_POLL_INTERVAL_MS", defaults.interval_ms)?;

        if max_attempts == 0 {
            return Err(AppError::Configuration(
                "ORDER_POLL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            server_base_url,
            polling: PollingConfig {
                max_attempts,
                interval_ms,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_app_settings_defaults() {
        let settings = AppSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
        ]))
        .unwrap();

        assert_eq!(settings.app.name, "storefront-orders");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.cors_origins, vec!["*".to_string()]);
        assert_eq!(settings.server.url, "http://0.0.0.0:8080");
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.stripe.api_base, "https://api.stripe.com");
        assert_eq!(settings.stripe.webhook_tolerance_secs, 300);
    }

    #[test]
    fn test_app_settings_requires_stripe_secret() {
        let result = AppSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
        ]));

        match result {
            Err(AppError::Configuration(msg)) => assert!(msg.contains("STRIPE_SECRET_KEY")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_app_settings_rejects_bad_port() {
        let result = AppSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("SERVER_PORT", "eighty"),
        ]));

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_app_settings_rejects_negative_tolerance() {
        let result = AppSettings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("STRIPE_WEBHOOK_TOLERANCE_SECS", "-5"),
        ]));

        match result {
            Err(AppError::Configuration(msg)) => assert!(msg.contains("STRIPE_WEBHOOK_TOLERANCE_SECS")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_client_settings_overrides() {
        let settings = ClientSettings::from_lookup(lookup_from(&[
            ("ORDER_SERVER_BASE_URL", "https://shop.example.com/"),
            ("ORDER_POLL_MAX_ATTEMPTS", "4"),
            ("ORDER_POLL_INTERVAL_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(settings.server_base_url, "https://shop.example.com");
        assert_eq!(settings.polling.max_attempts, 4);
        assert_eq!(settings.polling.interval_ms, 500);
    }

    #[test]
    fn test_client_settings_rejects_zero_attempts() {
        let result = ClientSettings::from_lookup(lookup_from(&[("ORDER_POLL_MAX_ATTEMPTS", "0")]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
