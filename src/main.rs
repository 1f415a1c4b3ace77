use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gutterbook::config::AppConfig;
use gutterbook::db;
use gutterbook::handlers;
use gutterbook::services::notify::mailer::HttpMailer;
use gutterbook::services::payments::cash::CashGateway;
use gutterbook::services::payments::mollie::MollieGateway;
use gutterbook::services::payments::paypal::PayPalGateway;
use gutterbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    anyhow::ensure!(
        !config.paypal_client_id.is_empty() && !config.paypal_client_secret.is_empty(),
        "PAYPAL_CLIENT_ID and PAYPAL_CLIENT_SECRET must be set"
    );
    anyhow::ensure!(
        !config.mollie_api_key.is_empty(),
        "MOLLIE_API_KEY must be set"
    );

    let paypal = PayPalGateway::new(
        config.paypal_api_url.clone(),
        config.paypal_client_id.clone(),
        config.paypal_client_secret.clone(),
        config.frontend_url.clone(),
    );
    let mollie = MollieGateway::new(
        config.mollie_api_url.clone(),
        config.mollie_api_key.clone(),
        config.base_url.clone(),
        config.frontend_url.clone(),
    );
    let mailer = HttpMailer::new(config.notify_url.clone(), config.admin_email.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        paypal: Box::new(paypal),
        mollie: Box::new(mollie),
        cash: Box::new(CashGateway),
        notifier: Box::new(mailer),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings/check", post(handlers::bookings::check))
        .route("/api/bookings", post(handlers::bookings::create))
        .route(
            "/api/payments/:booking_id/status",
            get(handlers::payments::status),
        )
        .route(
            "/api/payments/paypal/capture",
            post(handlers::payments::paypal_capture),
        )
        .route(
            "/api/payments/paypal/cancel",
            post(handlers::payments::paypal_cancel),
        )
        .route(
            "/api/payments/mollie/cancel/:payment_id",
            post(handlers::payments::mollie_cancel),
        )
        .route(
            "/api/payments/refund",
            post(handlers::payments::paypal_refund),
        )
        .route(
            "/api/payments/mollie/refund",
            post(handlers::payments::mollie_refund),
        )
        .route("/webhooks/mollie", post(handlers::payments::mollie_webhook))
        .route("/api/slots", get(handlers::slots::day))
        .route("/api/slots/disabled", get(handlers::slots::disabled))
        .route("/api/admin/slots/block", post(handlers::slots::block))
        .route("/api/admin/slots/unblock", post(handlers::slots::unblock))
        .route(
            "/api/admin/bookings",
            get(handlers::bookings::admin_list).post(handlers::bookings::admin_create),
        )
        .route(
            "/api/admin/bookings/:id",
            get(handlers::bookings::admin_get)
                .put(handlers::bookings::admin_update)
                .delete(handlers::bookings::admin_delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
