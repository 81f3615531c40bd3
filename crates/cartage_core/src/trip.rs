use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    geopoint::GeoPoint,
    ids::{AccountId, DriverId, LocationSampleId, ParcelId, RouteId, StopId, TripId, VehicleId},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripStatus {
    /// Created from an accepted match, no driver yet.
    Planned,
    /// Driver assigned, not started.
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TripStatus::Planned => "PLANNED",
            TripStatus::Pending => "PENDING",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{name}")
    }
}

/// One scheduled movement of parcels by one vehicle/driver along one route.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Trip {
    pub id: TripId,
    pub fleet_owner_id: AccountId,
    pub route_id: RouteId,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
    pub status: TripStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Pickup,
    Delivery,
}

impl fmt::Display for StopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopKind::Pickup => write!(f, "PICKUP"),
            StopKind::Delivery => write!(f, "DELIVERY"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Pending,
    Completed,
    Skipped,
}

/// Ordered waypoint within a trip. Stops complete strictly in ascending
/// sequence order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripStop {
    pub id: StopId,
    pub trip_id: TripId,
    pub parcel_id: ParcelId,
    pub kind: StopKind,
    pub sequence: u32,
    pub location: GeoPoint,
    pub status: StopStatus,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// GPS breadcrumb recorded during an in-progress trip. Pass-through
/// persistence only, not part of the state machine.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripLocation {
    pub id: LocationSampleId,
    pub trip_id: TripId,
    pub driver_id: DriverId,
    pub point: GeoPoint,
    pub accuracy_m: Option<f64>,
    pub recorded_at: Timestamp,
}
