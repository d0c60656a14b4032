use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of resolving a payment intent against the order table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedStatus {
    Completed,
    Processing,
    Failed,
    NotFound,
}

impl fmt::Display for ResolvedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolvedStatus::Completed => "completed",
            ResolvedStatus::Processing => "processing",
            ResolvedStatus::Failed => "failed",
            ResolvedStatus::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Wire shape of `GET /api/orders/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub success: bool,
    pub status: ResolvedStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrderStatusResponse {
    pub fn completed(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            status: ResolvedStatus::Completed,
            order_id: Some(order_id.into()),
            error: None,
        }
    }

    pub fn processing(order_id: Option<String>) -> Self {
        Self {
            success: true,
            status: ResolvedStatus::Processing,
            order_id,
            error: None,
        }
    }

    pub fn failed(order_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: true,
            status: ResolvedStatus::Failed,
            order_id,
            error: Some(error.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: true,
            status: ResolvedStatus::NotFound,
            order_id: None,
            error: None,
        }
    }

    /// The lookup itself could not be performed.
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: ResolvedStatus::Failed,
            order_id: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_completed_wire_shape() {
        let value = serde_json::to_value(OrderStatusResponse::completed("ord_9")).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "status": "completed", "orderId": "ord_9" })
        );
    }

    #[test]
    fn test_unavailable_wire_shape() {
        let value = serde_json::to_value(OrderStatusResponse::unavailable("try again")).unwrap();
        assert_eq!(
            value,
            json!({ "success": false, "status": "failed", "error": "try again" })
        );
    }

    #[test]
    fn test_parses_not_found_without_optional_fields() {
        let parsed: OrderStatusResponse =
            serde_json::from_value(json!({ "success": true, "status": "not_found" })).unwrap();
        assert_eq!(parsed, OrderStatusResponse::not_found());
    }
}
