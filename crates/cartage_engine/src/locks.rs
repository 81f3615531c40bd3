//! Exclusive vehicle holds for the duration of an active trip.
//!
//! The uniqueness of live locks lives in the store insert, so two concurrent
//! starts on the same vehicle race at the storage layer and exactly one wins;
//! the loser gets a typed, retryable conflict.

use jiff::Timestamp;
use tracing::debug;

use cartage_core::{
    error::ExecutionError,
    ids::{DriverId, LockId, TripId, VehicleId},
    lock::VehicleLock,
};

use crate::store::StoreState;

pub fn acquire(
    tx: &mut StoreState,
    vehicle_id: VehicleId,
    trip_id: TripId,
    driver_id: DriverId,
    now: Timestamp,
) -> Result<LockId, ExecutionError> {
    let lock = VehicleLock {
        id: LockId::generate(),
        vehicle_id,
        trip_id,
        driver_id,
        acquired_at: now,
        released_at: None,
    };
    let lock_id = lock.id;
    tx.insert_vehicle_lock(lock)?;
    debug!(%vehicle_id, %trip_id, "vehicle lock acquired");
    Ok(lock_id)
}

/// Release the lock held by `trip_id`. Idempotent: false when the lock was
/// already released or never existed.
pub fn release(
    tx: &mut StoreState,
    vehicle_id: VehicleId,
    trip_id: TripId,
    now: Timestamp,
) -> bool {
    let released = tx.release_lock(vehicle_id, trip_id, now);
    if released {
        debug!(%vehicle_id, %trip_id, "vehicle lock released");
    }
    released
}

pub fn is_locked(tx: &StoreState, vehicle_id: VehicleId) -> Option<&VehicleLock> {
    tx.live_lock(vehicle_id)
}
