use serde::{Deserialize, Serialize};

use crate::{
    geopoint::GeoPoint,
    ids::{AccountId, DriverId, ParcelId, RouteId, VehicleId},
};

/// Read model of a fleet route: the endpoints the core needs for distance
/// and connectivity checks. Route CRUD is an external collaborator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FleetRoute {
    pub id: RouteId,
    pub fleet_owner_id: AccountId,
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Driver {
    pub id: DriverId,
    pub fleet_owner_id: AccountId,
    pub name: String,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub fleet_owner_id: AccountId,
    pub max_weight_kg: f64,
    pub max_volume_cm3: f64,
}

/// Read model of a parcel: payer identity and billable weight.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Parcel {
    pub id: ParcelId,
    pub hub_owner_id: AccountId,
    pub weight_kg: f64,
    pub volume_cm3: f64,
}
