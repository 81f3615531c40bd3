use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::ids::{DriverId, LockId, TripId, VehicleId};

/// Time-bounded exclusive claim on a vehicle for the duration of an active
/// trip. At most one lock per vehicle may have `released_at == None` at any
/// instant; the store enforces this on insert.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VehicleLock {
    pub id: LockId,
    pub vehicle_id: VehicleId,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub acquired_at: Timestamp,
    pub released_at: Option<Timestamp>,
}

impl VehicleLock {
    pub fn is_live(&self) -> bool {
        self.released_at.is_none()
    }
}
