use actix_web::web;
use crate::handlers;

/// Configures order routes. Mounted under the "/api" scope in main.rs.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Order routes (/api/orders/*). "/status" must precede "/{order_id}".
    cfg.service(
        web::scope("/orders")
            .service(handlers::order_handlers::get_order_status)
            .service(handlers::order_handlers::get_order)
            .service(handlers::order_handlers::update_order_status)
    );
}

/// Configures inbound payment provider webhooks. Mounted under "/webhooks".
pub fn configure_webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::webhook_handlers::stripe_webhook);
}
