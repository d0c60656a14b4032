use actix_web::{post, web, HttpRequest, HttpResponse};
use log::{error, info, warn};
use serde_json::json;

use crate::error::AppError;
use crate::services::{OrderMaterializer, StripeService};
use crate::stripe_types::{Event, EventType, PaymentIntent};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

fn payment_intent_from_event(event: &Event) -> Result<PaymentIntent, AppError> {
    serde_json::from_value(event.data.object.clone()).map_err(|e| {
        error!("Event {} does not carry a payment intent: {}", event.id, e);
        AppError::BadRequest(format!("Invalid payment intent payload: {}", e))
    })
}

/// Handle Stripe webhook events.
///
/// Orders are only ever created here, once the provider confirms the payment.
#[post("/stripe")]
pub async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    stripe_service: web::Data<StripeService>,
    materializer: web::Data<OrderMaterializer>,
) -> Result<HttpResponse, AppError> {
    let stripe_signature = req
        .headers()
        .get(STRIPE_SIGNATURE_HEADER)
        .ok_or_else(|| {
            error!("Missing Stripe-Signature header in webhook request");
            AppError::Auth("Missing Stripe-Signature header".to_string())
        })?
        .to_str()
        .map_err(|e| {
            error!("Invalid Stripe-Signature header encoding: {}", e);
            AppError::Auth("Invalid Stripe-Signature header".to_string())
        })?;

    let body_str = std::str::from_utf8(&body).map_err(|e| {
        error!("Invalid UTF-8 in webhook body: {}", e);
        AppError::BadRequest("Invalid webhook body encoding".to_string())
    })?;

    stripe_service
        .verify_webhook_signature(body_str, stripe_signature)
        .map_err(|e| {
            error!("Stripe webhook signature verification failed: {}", e);
            AppError::from(e)
        })?;

    let event = stripe_service.parse_webhook_event(body_str).map_err(|e| {
        error!("Failed to parse verified webhook body: {}", e);
        AppError::BadRequest(e.to_string())
    })?;

    info!("Verified Stripe webhook event {} (type: {})", event.id, event.type_);

    match event.event_type() {
        EventType::PaymentIntentSucceeded => {
            let payment_intent = payment_intent_from_event(&event)?;
            let order = materializer.materialize(&payment_intent).await?;
            info!("Payment intent {} backs order {}", payment_intent.id, order.id);
        }
        EventType::PaymentIntentPaymentFailed => {
            let payment_intent = payment_intent_from_event(&event)?;
            let reason = payment_intent
                .last_payment_error
                .as_ref()
                .and_then(|e| e.decline_code.clone().or_else(|| e.code.clone()))
                .unwrap_or_else(|| "unknown".to_string());
            warn!("Payment failed for intent {}: {}", payment_intent.id, reason);
        }
        EventType::PaymentIntentCanceled => {
            let payment_intent = payment_intent_from_event(&event)?;
            info!(
                "Payment intent {} canceled ({})",
                payment_intent.id,
                payment_intent.cancellation_reason.as_deref().unwrap_or("no reason given")
            );
        }
        EventType::Other(event_type) => {
            info!("Ignoring unhandled webhook event type: {}", event_type);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
