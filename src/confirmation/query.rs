use url::form_urlencoded;

/// Query parameter the checkout redirect carries the payment intent in.
pub const PAYMENT_INTENT_PARAM: &str = "payment_intent";

/// Extracts the payment intent id from a query string (with or without the
/// leading `?`). Blank values count as absent.
pub fn payment_intent_from_query(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == PAYMENT_INTENT_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Same as [`payment_intent_from_query`] for a full URL.
pub fn payment_intent_from_url(raw_url: &str) -> Option<String> {
    let parsed = url::Url::parse(raw_url).ok()?;
    payment_intent_from_query(parsed.query().unwrap_or_default())
}

pub fn confirmation_path(order_id: &str) -> String {
    format!("/order/confirmation/{}", urlencoding::encode(order_id))
}
