mod billing;
mod error;
mod state;
mod trips;

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::{Router, serve};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

use cartage_engine::orchestrator::TripOrchestrator;
use cartage_engine::store::Store;

use crate::state::AppState;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn app(state: Arc<AppState>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/trips", post(trips::create_trip_handler))
        .route("/trips/{trip_id}", get(trips::get_trip_handler))
        .route("/trips/{trip_id}/stops", get(trips::get_trip_stops_handler))
        .route(
            "/trips/{trip_id}/locations",
            get(trips::get_trip_locations_handler).post(trips::record_location_handler),
        )
        .route("/trips/{trip_id}/assign", post(trips::assign_driver_handler))
        .route(
            "/trips/{trip_id}/unassign",
            post(trips::unassign_driver_handler),
        )
        .route("/trips/{trip_id}/start", post(trips::start_trip_handler))
        .route(
            "/trips/{trip_id}/stops/{stop_id}/complete",
            post(trips::complete_stop_handler),
        )
        .route(
            "/trips/{trip_id}/complete",
            post(trips::complete_trip_handler),
        )
        .route("/trips/{trip_id}/cancel", post(trips::cancel_trip_handler))
        .route("/trips/{trip_id}/charge", get(billing::get_trip_charge_handler))
        .route(
            "/billing/pricing-rules",
            get(billing::list_pricing_rules_handler).post(billing::create_pricing_rule_handler),
        )
        .route(
            "/billing/settlements/{settlement_id}",
            get(billing::get_settlement_handler),
        )
        .route(
            "/billing/settlements/{settlement_id}/approve",
            post(billing::approve_settlement_handler),
        )
        .route(
            "/billing/settlements/{settlement_id}/paid",
            post(billing::mark_settlement_paid_handler),
        )
        .route(
            "/billing/settlements/{settlement_id}/ledger",
            get(billing::get_settlement_ledger_handler),
        )
        .route(
            "/billing/accounts/{account_id}/settlements",
            get(billing::get_account_settlements_handler),
        )
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::from_filename("./.env.local").ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let store = Arc::new(Store::default());
    let state = Arc::new(AppState {
        orchestrator: TripOrchestrator::new(store),
    });

    let bind_addr =
        std::env::var("CARTAGE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    info!(%bind_addr, "cartage api listening");

    serve(listener, app(state)).await.unwrap();
}
