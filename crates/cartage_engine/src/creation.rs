//! Trip intake: a new trip starts life PLANNED, with a pickup and a delivery
//! stop derived from the route endpoints, and is only admitted when the
//! assigned vehicle can physically carry the parcel.

use jiff::Timestamp;
use tracing::info;

use cartage_core::{
    error::ExecutionError,
    ids::{AccountId, DriverId, ParcelId, RouteId, StopId, TripId, VehicleId},
    trip::{StopKind, StopStatus, Trip, TripStatus, TripStop},
};

use crate::store::StoreState;

pub struct TripDraft {
    pub fleet_owner_id: AccountId,
    pub route_id: RouteId,
    pub parcel_id: ParcelId,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
}

/// Create a PLANNED trip with its two stops. Capacity is validated here, at
/// intake, so an overweight or oversized parcel never reaches execution.
pub fn create_trip(
    tx: &mut StoreState,
    draft: TripDraft,
    now: Timestamp,
) -> Result<TripId, ExecutionError> {
    // Foreign routes read as absent; tenants never learn what other fleets
    // operate.
    let route = tx.route(draft.route_id)?;
    if route.fleet_owner_id != draft.fleet_owner_id {
        return Err(ExecutionError::RouteNotFound(draft.route_id));
    }
    let origin = route.origin;
    let destination = route.destination;

    let parcel = tx.parcel(draft.parcel_id)?;
    let (weight_kg, volume_cm3) = (parcel.weight_kg, parcel.volume_cm3);

    if let Some(vehicle_id) = draft.vehicle_id {
        let vehicle = tx.vehicle(vehicle_id)?;
        if weight_kg > vehicle.max_weight_kg {
            return Err(ExecutionError::WeightCapacityExceeded {
                parcel_id: draft.parcel_id,
                vehicle_id,
                weight_kg,
                max_weight_kg: vehicle.max_weight_kg,
            });
        }
        if volume_cm3 > vehicle.max_volume_cm3 {
            return Err(ExecutionError::VolumeCapacityExceeded {
                parcel_id: draft.parcel_id,
                vehicle_id,
                volume_cm3,
                max_volume_cm3: vehicle.max_volume_cm3,
            });
        }
    }

    if let Some(driver_id) = draft.driver_id {
        let driver = tx.driver(driver_id)?;
        if !driver.active {
            return Err(ExecutionError::DriverInactive(driver_id));
        }
        if driver.fleet_owner_id != draft.fleet_owner_id {
            return Err(ExecutionError::DriverNotInFleet { driver_id });
        }
    }

    // A trip created with a driver already attached still starts PLANNED;
    // assignment is what moves it to PENDING.
    let trip_id = tx.insert_trip(Trip {
        id: TripId::generate(),
        fleet_owner_id: draft.fleet_owner_id,
        route_id: draft.route_id,
        vehicle_id: draft.vehicle_id,
        driver_id: draft.driver_id,
        status: TripStatus::Planned,
        created_at: now,
        updated_at: now,
        started_at: None,
        completed_at: None,
    });

    tx.insert_stop(TripStop {
        id: StopId::generate(),
        trip_id,
        parcel_id: draft.parcel_id,
        kind: StopKind::Pickup,
        sequence: 1,
        location: origin,
        status: StopStatus::Pending,
        created_at: now,
        completed_at: None,
    });
    tx.insert_stop(TripStop {
        id: StopId::generate(),
        trip_id,
        parcel_id: draft.parcel_id,
        kind: StopKind::Delivery,
        sequence: 2,
        location: destination,
        status: StopStatus::Pending,
        created_at: now,
        completed_at: None,
    });

    info!(%trip_id, route_id = %draft.route_id, parcel_id = %draft.parcel_id, "trip created");
    Ok(trip_id)
}
