use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courtbook::config::AppConfig;
use courtbook::db;
use courtbook::handlers;
use courtbook::jobs;
use courtbook::services::notification::mailer::MailApiNotifier;
use courtbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.mail_api_key.is_empty() {
        tracing::warn!("MAIL_API_KEY not set, booking emails will be logged and dropped");
    }
    let notifier = MailApiNotifier::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_from.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(notifier),
        tier_job_running: AtomicBool::new(false),
    });

    jobs::spawn_tier_reconciliation(state.clone());

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/my-bookings",
            get(handlers::bookings::my_bookings),
        )
        .route(
            "/api/bookings/by-court/:court_id",
            get(handlers::bookings::bookings_by_court),
        )
        .route(
            "/api/bookings/total-approved-revenue-for-date",
            get(handlers::bookings::revenue_for_date),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id", put(handlers::bookings::update_booking))
        .route("/api/bookings/:id", patch(handlers::bookings::patch_booking))
        .route(
            "/api/bookings/:id",
            delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/bookings/:id/approve",
            put(handlers::bookings::approve_booking),
        )
        .route(
            "/api/bookings/:id/reject",
            put(handlers::bookings::reject_booking),
        )
        .route("/api/revenue", get(handlers::revenue::revenue_series))
        .route("/api/revenue/total", get(handlers::revenue::revenue_total))
        .route("/api/sports", post(handlers::sports::create_sport))
        .route("/api/sports", get(handlers::sports::list_sports))
        .route("/api/sports/:id", get(handlers::sports::get_sport))
        .route("/api/sports/:id", put(handlers::sports::update_sport))
        .route("/api/sports/:id", patch(handlers::sports::patch_sport))
        .route("/api/sports/:id", delete(handlers::sports::delete_sport))
        .route("/api/courts", post(handlers::courts::create_court))
        .route("/api/courts", get(handlers::courts::list_courts))
        .route("/api/courts/:id", get(handlers::courts::get_court))
        .route("/api/courts/:id", put(handlers::courts::update_court))
        .route("/api/courts/:id", patch(handlers::courts::patch_court))
        .route("/api/courts/:id", delete(handlers::courts::delete_court))
        .route(
            "/api/time-slots",
            post(handlers::time_slots::create_time_slot),
        )
        .route("/api/time-slots", get(handlers::time_slots::list_time_slots))
        .route(
            "/api/time-slots/:id",
            get(handlers::time_slots::get_time_slot),
        )
        .route(
            "/api/time-slots/:id",
            put(handlers::time_slots::update_time_slot),
        )
        .route(
            "/api/time-slots/:id",
            patch(handlers::time_slots::patch_time_slot),
        )
        .route(
            "/api/time-slots/:id",
            delete(handlers::time_slots::delete_time_slot),
        )
        .route(
            "/api/client-tiers",
            post(handlers::client_tiers::create_client_tier),
        )
        .route(
            "/api/client-tiers",
            get(handlers::client_tiers::list_client_tiers),
        )
        .route(
            "/api/client-tiers/:id",
            get(handlers::client_tiers::get_client_tier),
        )
        .route(
            "/api/client-tiers/:id",
            put(handlers::client_tiers::update_client_tier),
        )
        .route(
            "/api/client-tiers/:id",
            patch(handlers::client_tiers::patch_client_tier),
        )
        .route(
            "/api/client-tiers/:id",
            delete(handlers::client_tiers::delete_client_tier),
        )
        .route("/api/clients", post(handlers::clients::create_client))
        .route("/api/clients", get(handlers::clients::list_clients))
        .route("/api/clients/:id", get(handlers::clients::get_client))
        .route("/api/clients/:id", put(handlers::clients::update_client))
        .route("/api/clients/:id", patch(handlers::clients::patch_client))
        .route("/api/clients/:id", delete(handlers::clients::delete_client))
        .route("/api/payments", post(handlers::payments::create_payment))
        .route("/api/payments", get(handlers::payments::list_payments))
        .route("/api/payments/:id", get(handlers::payments::get_payment))
        .route("/api/payments/:id", put(handlers::payments::update_payment))
        .route("/api/payments/:id", patch(handlers::payments::patch_payment))
        .route(
            "/api/payments/:id",
            delete(handlers::payments::delete_payment),
        )
        .route(
            "/api/tier-vouchers",
            post(handlers::tier_vouchers::create_tier_voucher),
        )
        .route(
            "/api/tier-vouchers",
            get(handlers::tier_vouchers::list_tier_vouchers),
        )
        .route(
            "/api/tier-vouchers/by-tier/:tier",
            get(handlers::tier_vouchers::get_voucher_by_tier),
        )
        .route(
            "/api/tier-vouchers/tier/:tier",
            put(handlers::tier_vouchers::upsert_voucher_for_tier),
        )
        .route(
            "/api/tier-vouchers/:id",
            get(handlers::tier_vouchers::get_tier_voucher),
        )
        .route(
            "/api/tier-vouchers/:id",
            put(handlers::tier_vouchers::update_tier_voucher),
        )
        .route(
            "/api/tier-vouchers/:id",
            patch(handlers::tier_vouchers::patch_tier_voucher),
        )
        .route(
            "/api/tier-vouchers/:id",
            delete(handlers::tier_vouchers::delete_tier_voucher),
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
