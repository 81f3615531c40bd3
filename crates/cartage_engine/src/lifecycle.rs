//! The trip state machine: PLANNED → PENDING → IN_PROGRESS → COMPLETED, with
//! PENDING → PLANNED reversal and PLANNED/PENDING → CANCELLED. Each transition
//! runs its guards and its mutation inside one store transaction.

use jiff::Timestamp;
use tracing::info;

use cartage_core::{
    billing::TripCharge,
    error::ExecutionError,
    geopoint::GeoPoint,
    ids::{AccountId, DriverId, LocationSampleId, StopId, TripId},
    trip::{StopStatus, Trip, TripLocation, TripStatus},
};

use crate::{connectivity, locks, settlement, store::StoreState};

#[derive(Debug)]
pub struct StartOutcome {
    pub trip_id: TripId,
    pub started_at: Timestamp,
    pub vehicle_locked: bool,
}

#[derive(Debug)]
pub struct CompletionOutcome {
    pub trip_id: TripId,
    pub completed_at: Timestamp,
    pub vehicle_unlocked: bool,
    pub stops_completed: usize,
    pub charge: TripCharge,
}

fn ensure_fleet_owns(trip: &Trip, fleet_owner_id: AccountId) -> Result<(), ExecutionError> {
    if trip.fleet_owner_id != fleet_owner_id {
        return Err(ExecutionError::OwnershipViolation {
            trip_id: trip.id,
            actor: format!("fleet owner {fleet_owner_id}"),
        });
    }
    Ok(())
}

fn ensure_driver_owns(trip: &Trip, driver_id: DriverId) -> Result<(), ExecutionError> {
    if trip.driver_id != Some(driver_id) {
        return Err(ExecutionError::OwnershipViolation {
            trip_id: trip.id,
            actor: format!("driver {driver_id}"),
        });
    }
    Ok(())
}

fn ensure_status(
    trip: &Trip,
    status: TripStatus,
    expected: &'static str,
) -> Result<(), ExecutionError> {
    if trip.status != status {
        return Err(ExecutionError::StateMismatch {
            trip_id: trip.id,
            expected,
            actual: trip.status,
        });
    }
    Ok(())
}

/// PLANNED → PENDING. The driver must be active, belong to the requesting
/// fleet, and pass route-connectivity admission against every trip they
/// already hold.
pub fn assign_driver(
    tx: &mut StoreState,
    trip_id: TripId,
    driver_id: DriverId,
    fleet_owner_id: AccountId,
    now: Timestamp,
) -> Result<(), ExecutionError> {
    let trip = tx.trip(trip_id)?.clone();
    ensure_fleet_owns(&trip, fleet_owner_id)?;
    ensure_status(&trip, TripStatus::Planned, "PLANNED")?;

    let driver = tx.driver(driver_id)?;
    if !driver.active {
        return Err(ExecutionError::DriverInactive(driver_id));
    }
    if driver.fleet_owner_id != fleet_owner_id {
        return Err(ExecutionError::DriverNotInFleet { driver_id });
    }

    connectivity::can_assign(tx, driver_id, &trip)?;

    let trip = tx.trip_mut(trip_id)?;
    trip.driver_id = Some(driver_id);
    trip.status = TripStatus::Pending;
    trip.updated_at = now;
    info!(%trip_id, %driver_id, "driver assigned");
    Ok(())
}

/// PENDING → PLANNED. Never allowed once the trip is in progress.
pub fn unassign_driver(
    tx: &mut StoreState,
    trip_id: TripId,
    fleet_owner_id: AccountId,
    now: Timestamp,
) -> Result<(), ExecutionError> {
    let trip = tx.trip(trip_id)?.clone();
    ensure_fleet_owns(&trip, fleet_owner_id)?;
    ensure_status(&trip, TripStatus::Pending, "PENDING")?;

    let trip = tx.trip_mut(trip_id)?;
    trip.driver_id = None;
    trip.status = TripStatus::Planned;
    trip.updated_at = now;
    info!(%trip_id, "driver unassigned");
    Ok(())
}

/// PENDING → IN_PROGRESS. The driver may have no other in-progress trip
/// (count check; drivers are a logical, not a physical resource) and the
/// vehicle, when one is attached, must be lockable.
pub fn start(
    tx: &mut StoreState,
    trip_id: TripId,
    driver_id: DriverId,
    now: Timestamp,
) -> Result<StartOutcome, ExecutionError> {
    let trip = tx.trip(trip_id)?.clone();
    ensure_status(&trip, TripStatus::Pending, "PENDING")?;
    ensure_driver_owns(&trip, driver_id)?;

    if tx.in_progress_count(driver_id) > 0 {
        return Err(ExecutionError::DriverBusy(driver_id));
    }

    let mut vehicle_locked = false;
    if let Some(vehicle_id) = trip.vehicle_id {
        locks::acquire(tx, vehicle_id, trip_id, driver_id, now)?;
        vehicle_locked = true;
    }

    let trip = tx.trip_mut(trip_id)?;
    trip.status = TripStatus::InProgress;
    trip.started_at = Some(now);
    trip.updated_at = now;
    info!(%trip_id, %driver_id, vehicle_locked, "trip started");

    Ok(StartOutcome {
        trip_id,
        started_at: now,
        vehicle_locked,
    })
}

/// Persist a GPS breadcrumb for an in-progress trip. Pass-through: no state
/// machine involvement.
pub fn record_location(
    tx: &mut StoreState,
    trip_id: TripId,
    driver_id: DriverId,
    point: GeoPoint,
    accuracy_m: Option<f64>,
    recorded_at: Timestamp,
) -> Result<LocationSampleId, ExecutionError> {
    let trip = tx.trip(trip_id)?;
    ensure_status(trip, TripStatus::InProgress, "IN_PROGRESS")?;
    ensure_driver_owns(trip, driver_id)?;

    Ok(tx.insert_location(TripLocation {
        id: LocationSampleId::generate(),
        trip_id,
        driver_id,
        point,
        accuracy_m,
        recorded_at,
    }))
}

/// Complete one stop, strictly in ascending sequence order. The violation
/// reports the sequence number expected next.
pub fn complete_stop(
    tx: &mut StoreState,
    trip_id: TripId,
    stop_id: StopId,
    driver_id: DriverId,
    now: Timestamp,
) -> Result<u32, ExecutionError> {
    let trip = tx.trip(trip_id)?;
    ensure_status(trip, TripStatus::InProgress, "IN_PROGRESS")?;
    ensure_driver_owns(trip, driver_id)?;

    let stop = tx.stop(trip_id, stop_id)?;
    if stop.status == StopStatus::Completed {
        return Err(ExecutionError::StopAlreadyCompleted(stop_id));
    }
    let attempted = stop.sequence;

    let expected = tx.max_completed_sequence(trip_id) + 1;
    if attempted != expected {
        return Err(ExecutionError::SequenceViolation {
            trip_id,
            expected,
            attempted,
        });
    }

    let stop = tx.stop_mut(trip_id, stop_id)?;
    stop.status = StopStatus::Completed;
    stop.completed_at = Some(now);

    let trip = tx.trip_mut(trip_id)?;
    trip.updated_at = now;
    info!(%trip_id, %stop_id, sequence = attempted, "stop completed");
    Ok(attempted)
}

/// IN_PROGRESS → COMPLETED. Requires every stop completed, releases the
/// vehicle lock, and settles the trip synchronously. A settlement failure
/// fails this function, and with it the enclosing transaction: completion
/// and billing commit together or not at all.
pub fn complete(
    tx: &mut StoreState,
    trip_id: TripId,
    driver_id: DriverId,
    now: Timestamp,
) -> Result<CompletionOutcome, ExecutionError> {
    let trip = tx.trip(trip_id)?.clone();
    ensure_status(&trip, TripStatus::InProgress, "IN_PROGRESS")?;
    ensure_driver_owns(&trip, driver_id)?;

    let pending = tx.pending_stop_sequences(trip_id);
    if !pending.is_empty() {
        return Err(ExecutionError::StopsPending { trip_id, pending });
    }
    let stops_completed = tx.stops_of(trip_id).len();

    let mut vehicle_unlocked = false;
    if let Some(vehicle_id) = trip.vehicle_id {
        vehicle_unlocked = locks::release(tx, vehicle_id, trip_id, now);
    }

    let trip = tx.trip_mut(trip_id)?;
    trip.status = TripStatus::Completed;
    trip.completed_at = Some(now);
    trip.updated_at = now;

    let charge = settlement::process_trip(tx, trip_id, now)?;
    info!(%trip_id, %driver_id, vehicle_unlocked, "trip completed");

    Ok(CompletionOutcome {
        trip_id,
        completed_at: now,
        vehicle_unlocked,
        stops_completed,
        charge,
    })
}

/// PLANNED or PENDING → CANCELLED. Terminal; a vehicle is never locked
/// before start, so there is nothing to release.
pub fn cancel(
    tx: &mut StoreState,
    trip_id: TripId,
    fleet_owner_id: AccountId,
    now: Timestamp,
) -> Result<(), ExecutionError> {
    let trip = tx.trip(trip_id)?.clone();
    ensure_fleet_owns(&trip, fleet_owner_id)?;
    if !matches!(trip.status, TripStatus::Planned | TripStatus::Pending) {
        return Err(ExecutionError::StateMismatch {
            trip_id,
            expected: "PLANNED or PENDING",
            actual: trip.status,
        });
    }

    let trip = tx.trip_mut(trip_id)?;
    trip.status = TripStatus::Cancelled;
    trip.driver_id = None;
    trip.updated_at = now;
    info!(%trip_id, "trip cancelled");
    Ok(())
}
