use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use cartage_core::{
    geopoint::GeoPoint,
    ids::{AccountId, DriverId, ParcelId, RouteId, StopId, TripId, VehicleId},
    trip::{Trip, TripLocation, TripStop},
};
use cartage_engine::creation::TripDraft;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub fleet_owner_id: AccountId,
    pub route_id: RouteId,
    pub parcel_id: ParcelId,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
}

#[derive(Serialize)]
pub struct CreateTripResponse {
    pub trip_id: TripId,
}

pub async fn create_trip_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTripRequest>,
) -> Result<Json<CreateTripResponse>, ApiError> {
    let trip_id = state.orchestrator.create_trip(TripDraft {
        fleet_owner_id: request.fleet_owner_id,
        route_id: request.route_id,
        parcel_id: request.parcel_id,
        vehicle_id: request.vehicle_id,
        driver_id: request.driver_id,
    })?;
    Ok(Json(CreateTripResponse { trip_id }))
}

#[derive(Deserialize)]
pub struct FleetActorRequest {
    pub fleet_owner_id: AccountId,
}

#[derive(Deserialize)]
pub struct AssignDriverRequest {
    pub fleet_owner_id: AccountId,
    pub driver_id: DriverId,
}

pub async fn assign_driver_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<Trip>, ApiError> {
    state
        .orchestrator
        .assign_driver(trip_id, request.driver_id, request.fleet_owner_id)?;
    Ok(Json(state.orchestrator.trip(trip_id)?))
}

pub async fn unassign_driver_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<FleetActorRequest>,
) -> Result<Json<Trip>, ApiError> {
    state
        .orchestrator
        .unassign_driver(trip_id, request.fleet_owner_id)?;
    Ok(Json(state.orchestrator.trip(trip_id)?))
}

pub async fn cancel_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<FleetActorRequest>,
) -> Result<Json<Trip>, ApiError> {
    state
        .orchestrator
        .cancel_trip(trip_id, request.fleet_owner_id)?;
    Ok(Json(state.orchestrator.trip(trip_id)?))
}

#[derive(Deserialize)]
pub struct DriverActorRequest {
    pub driver_id: DriverId,
}

#[derive(Serialize)]
pub struct StartTripResponse {
    pub trip_id: TripId,
    pub started_at: Timestamp,
    pub vehicle_locked: bool,
}

pub async fn start_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<DriverActorRequest>,
) -> Result<Json<StartTripResponse>, ApiError> {
    let outcome = state.orchestrator.start_trip(trip_id, request.driver_id)?;
    Ok(Json(StartTripResponse {
        trip_id: outcome.trip_id,
        started_at: outcome.started_at,
        vehicle_locked: outcome.vehicle_locked,
    }))
}

#[derive(Deserialize)]
pub struct RecordLocationRequest {
    pub driver_id: DriverId,
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
}

pub async fn record_location_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<RecordLocationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sample_id = state.orchestrator.record_location(
        trip_id,
        request.driver_id,
        GeoPoint::new(request.lat, request.lng),
        request.accuracy_m,
    )?;
    Ok(Json(serde_json::json!({ "sample_id": sample_id })))
}

#[derive(Serialize)]
pub struct CompleteStopResponse {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub sequence: u32,
}

pub async fn complete_stop_handler(
    State(state): State<Arc<AppState>>,
    Path((trip_id, stop_id)): Path<(TripId, StopId)>,
    Json(request): Json<DriverActorRequest>,
) -> Result<Json<CompleteStopResponse>, ApiError> {
    let sequence = state
        .orchestrator
        .complete_stop(trip_id, stop_id, request.driver_id)?;
    Ok(Json(CompleteStopResponse {
        trip_id,
        stop_id,
        sequence,
    }))
}

#[derive(Serialize)]
pub struct CompleteTripResponse {
    pub trip_id: TripId,
    pub completed_at: Timestamp,
    pub vehicle_unlocked: bool,
    pub stops_completed: usize,
    pub charge: cartage_core::billing::TripCharge,
}

pub async fn complete_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<DriverActorRequest>,
) -> Result<Json<CompleteTripResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .complete_trip(trip_id, request.driver_id)?;
    Ok(Json(CompleteTripResponse {
        trip_id: outcome.trip_id,
        completed_at: outcome.completed_at,
        vehicle_unlocked: outcome.vehicle_unlocked,
        stops_completed: outcome.stops_completed,
        charge: outcome.charge,
    }))
}

pub async fn get_trip_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
) -> Result<Json<Trip>, ApiError> {
    Ok(Json(state.orchestrator.trip(trip_id)?))
}

pub async fn get_trip_stops_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
) -> Result<Json<Vec<TripStop>>, ApiError> {
    Ok(Json(state.orchestrator.trip_stops(trip_id)?))
}

pub async fn get_trip_locations_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
) -> Result<Json<Vec<TripLocation>>, ApiError> {
    Ok(Json(state.orchestrator.trip_locations(trip_id)?))
}
