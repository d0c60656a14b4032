use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use storefront_orders::config::AppSettings;
use storefront_orders::db::{create_pool, run_migrations, verify_connection, OrderRepository};
use storefront_orders::handlers;
use storefront_orders::routes::{configure_routes, configure_webhook_routes};
use storefront_orders::services::{OrderMaterializer, OrderStatusResolver, StripeService};
use storefront_orders::utils::new_api_client;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    let db_pool = match create_pool(&app_settings.database).await {
        Ok(pool) => {
            if let Err(e) = verify_connection(&pool).await {
                log::error!("Database connection verification failed: {}", e);
                log::error!("Cannot start server without a working database connection");
                std::process::exit(1);
            }
            log::info!("Database connection established successfully");
            pool
        }
        Err(e) => {
            log::error!("Failed to create database connection pool: {}", e);
            log::error!("Cannot start server without a working database connection");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&db_pool).await {
        log::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let http_client = match new_api_client() {
        Ok(client) => client,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let order_repository = OrderRepository::new(db_pool.clone());
    let stripe_service = StripeService::new(http_client, &app_settings.stripe);
    let resolver = OrderStatusResolver::new(
        Arc::new(order_repository.clone()),
        Arc::new(stripe_service.clone()),
    );
    let materializer = OrderMaterializer::new(Arc::new(order_repository.clone()));

    let order_repository = web::Data::new(order_repository);
    let stripe_service = web::Data::new(stripe_service);
    let resolver = web::Data::new(resolver);
    let materializer = web::Data::new(materializer);

    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!(
        "Starting {} ({}) at http://{}:{}",
        app_settings.app.name,
        app_settings.app.environment,
        host,
        port
    );

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    let cors_origins = app_settings.server.cors_origins.clone();

    HttpServer::new(move || {
        let mut cors = Cors::default();

        if cors_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        cors = cors.allow_any_method().allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(order_repository.clone())
            .app_data(stripe_service.clone())
            .app_data(resolver.clone())
            .app_data(materializer.clone())
            .route("/health", web::get().to(handlers::health::health_check))
            .service(web::scope("/api").configure(configure_routes))
            .service(web::scope("/webhooks").configure(configure_webhook_routes))
    })
    .listen(listener)?
    .run()
    .await
}
