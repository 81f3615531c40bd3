use jiff::Timestamp;
use thiserror::Error;

use crate::{
    billing::SettlementStatus,
    ids::{DriverId, ParcelId, RouteId, SettlementId, StopId, TripId, VehicleId},
    trip::TripStatus,
};

/// Typed failures surfaced at every operation boundary of the execution and
/// settlement core. None of these are retried internally; the caller decides
/// (only the lock/driver conflicts are worth retrying).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("trip {0} not found")]
    TripNotFound(TripId),

    #[error("stop {stop_id} not found for trip {trip_id}")]
    StopNotFound { trip_id: TripId, stop_id: StopId },

    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("parcel {0} not found")]
    ParcelNotFound(ParcelId),

    #[error("settlement {0} not found")]
    SettlementNotFound(SettlementId),

    #[error("trip {trip_id} is {actual}, operation requires {expected}")]
    StateMismatch {
        trip_id: TripId,
        expected: &'static str,
        actual: TripStatus,
    },

    #[error("settlement {settlement_id} is {actual}, operation requires {expected}")]
    SettlementStateMismatch {
        settlement_id: SettlementId,
        expected: SettlementStatus,
        actual: SettlementStatus,
    },

    #[error("trip {trip_id} is not controlled by {actor}")]
    OwnershipViolation { trip_id: TripId, actor: String },

    #[error("driver {0} is not active")]
    DriverInactive(DriverId),

    #[error("driver {driver_id} does not belong to the requesting fleet")]
    DriverNotInFleet { driver_id: DriverId },

    #[error("vehicle {vehicle_id} is already in use by trip {holding_trip_id}")]
    VehicleInUse {
        vehicle_id: VehicleId,
        holding_trip_id: TripId,
    },

    #[error("driver {0} already has a trip in progress")]
    DriverBusy(DriverId),

    #[error(
        "stops must be completed in order: expected sequence {expected}, attempted {attempted}"
    )]
    SequenceViolation {
        trip_id: TripId,
        expected: u32,
        attempted: u32,
    },

    #[error("stop {0} is already completed")]
    StopAlreadyCompleted(StopId),

    #[error("trip {trip_id} still has pending stops: {pending:?}")]
    StopsPending { trip_id: TripId, pending: Vec<u32> },

    #[error(
        "parcel {parcel_id} weight {weight_kg}kg exceeds vehicle {vehicle_id} capacity {max_weight_kg}kg"
    )]
    WeightCapacityExceeded {
        parcel_id: ParcelId,
        vehicle_id: VehicleId,
        weight_kg: f64,
        max_weight_kg: f64,
    },

    #[error(
        "parcel {parcel_id} volume {volume_cm3}cm3 exceeds vehicle {vehicle_id} capacity {max_volume_cm3}cm3"
    )]
    VolumeCapacityExceeded {
        parcel_id: ParcelId,
        vehicle_id: VehicleId,
        volume_cm3: f64,
        max_volume_cm3: f64,
    },

    #[error("no pricing rule is active at {at}, billing cannot proceed")]
    MissingPricingRule { at: Timestamp },

    #[error("route of trip {candidate_trip_id} is not connected to held trip {blocking_trip_id}")]
    ConnectivityVeto {
        candidate_trip_id: TripId,
        blocking_trip_id: TripId,
    },

    #[error("trip {0} has no parcel attached to a pickup stop")]
    MissingParcel(TripId),

    #[error("trip {trip_id} already has charge {charge_id}")]
    ChargeAlreadyRecorded {
        trip_id: TripId,
        charge_id: crate::ids::ChargeId,
    },
}

impl ExecutionError {
    /// Conflicts a caller may retry after the contended resource frees up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecutionError::VehicleInUse { .. } | ExecutionError::DriverBusy(_)
        )
    }
}
