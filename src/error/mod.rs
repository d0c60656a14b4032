use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::error::Error as StdError;
use sqlx::error::Error as SqlxError;

#[derive(Debug)]
pub enum AppError {
    Database(String),
    Internal(String),
    Auth(String),
    NotFound(String),
    BadRequest(String),
    Configuration(String),
    Validation(String),
    External(String),
    Network(String),
    InvalidArgument(String),
    InvalidResponse(String),
    Serialization(String),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    error_type: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::Auth(e) => write!(f, "Authentication error: {}", e),
            AppError::NotFound(e) => write!(f, "Not found: {}", e),
            AppError::BadRequest(e) => write!(f, "Bad request: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::External(e) => write!(f, "External service error: {}", e),
            AppError::Network(e) => write!(f, "Network error: {}", e),
            AppError::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            AppError::InvalidResponse(e) => write!(f, "Invalid response: {}", e),
            AppError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl StdError for AppError {}

impl AppError {
    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "authentication_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::External(_) => (StatusCode::BAD_GATEWAY, "external_service_error"),
            AppError::Network(_) => (StatusCode::BAD_GATEWAY, "network_error"),
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            AppError::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, "invalid_response"),
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_type) = self.kind();

        let error_response = ErrorResponse {
            code: status_code.as_u16(),
            message: self.to_string(),
            error_type: error_type.to_string(),
        };

        HttpResponse::build(status_code).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.kind().0
    }
}

impl From<SqlxError> for AppError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(format!("Migration failed: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Serialization(format!("JSON deserialization/serialization error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            AppError::InvalidResponse(format!("Failed to parse response: {}", error))
        } else {
            AppError::Network(format!("Request failed: {}", error))
        }
    }
}

impl From<crate::services::stripe_service::StripeServiceError> for AppError {
    fn from(error: crate::services::stripe_service::StripeServiceError) -> Self {
        use crate::services::stripe_service::StripeServiceError;

        match error {
            StripeServiceError::Transport(e) => {
                AppError::External(format!("Stripe request failed: {}", e))
            }
            StripeServiceError::Api { status, message } => {
                AppError::External(format!("Stripe API error ({}): {}", status, message))
            }
            StripeServiceError::WebhookVerification(msg) => {
                AppError::Auth(format!("Webhook verification failed: {}", msg))
            }
            StripeServiceError::Configuration(msg) => {
                AppError::Configuration(format!("Stripe configuration error: {}", msg))
            }
        }
    }
}
