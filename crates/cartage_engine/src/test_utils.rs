use std::sync::Arc;

use jiff::Timestamp;

use cartage_core::{
    billing::{PricingRule, TripCharge},
    fleet::{Driver, FleetRoute, Parcel, Vehicle},
    geopoint::GeoPoint,
    ids::{
        AccountId, ChargeId, DriverId, ParcelId, PricingRuleId, RouteId, StopId, TripId, VehicleId,
    },
    trip::{StopKind, StopStatus, Trip, TripStatus, TripStop},
};

use crate::store::Store;

/// One fleet owner, one hub owner, a driver, a vehicle, a Brussels→Antwerp
/// route, a parcel, an active pricing rule, and a PENDING trip with a pickup
/// and a delivery stop.
pub struct Fixture {
    pub store: Arc<Store>,
    pub fleet_owner: AccountId,
    pub hub_owner: AccountId,
    pub driver_id: DriverId,
    pub vehicle_id: VehicleId,
    pub route_id: RouteId,
    pub parcel_id: ParcelId,
    pub trip_id: TripId,
    pub pickup_stop: StopId,
    pub delivery_stop: StopId,
    pub rule_id: PricingRuleId,
}

pub const BRUSSELS: (f64, f64) = (50.8503, 4.3517);
pub const ANTWERP: (f64, f64) = (51.2194, 4.4025);

pub fn fixture() -> Fixture {
    let store = Arc::new(Store::default());
    let now = Timestamp::now();

    let fleet_owner = AccountId::generate();
    let hub_owner = AccountId::generate();

    let (trip_id, driver_id, vehicle_id, route_id, parcel_id, pickup_stop, delivery_stop, rule_id) =
        store.setup(|state| {
            let driver_id = state.insert_driver(Driver {
                id: DriverId::generate(),
                fleet_owner_id: fleet_owner,
                name: "test driver".to_owned(),
                active: true,
            });

            let vehicle_id = state.insert_vehicle(Vehicle {
                id: VehicleId::generate(),
                fleet_owner_id: fleet_owner,
                max_weight_kg: 1_000.0,
                max_volume_cm3: 2_000_000.0,
            });

            let route_id = state.insert_route(FleetRoute {
                id: RouteId::generate(),
                fleet_owner_id: fleet_owner,
                origin: GeoPoint::new(BRUSSELS.0, BRUSSELS.1),
                destination: GeoPoint::new(ANTWERP.0, ANTWERP.1),
            });

            let parcel_id = state.insert_parcel(Parcel {
                id: ParcelId::generate(),
                hub_owner_id: hub_owner,
                weight_kg: 12.5,
                volume_cm3: 40_000.0,
            });

            let trip_id = state.insert_trip(Trip {
                id: TripId::generate(),
                fleet_owner_id: fleet_owner,
                route_id,
                vehicle_id: Some(vehicle_id),
                driver_id: Some(driver_id),
                status: TripStatus::Pending,
                created_at: now,
                updated_at: now,
                started_at: None,
                completed_at: None,
            });

            let pickup_stop = state.insert_stop(TripStop {
                id: StopId::generate(),
                trip_id,
                parcel_id,
                kind: StopKind::Pickup,
                sequence: 1,
                location: GeoPoint::new(BRUSSELS.0, BRUSSELS.1),
                status: StopStatus::Pending,
                created_at: now,
                completed_at: None,
            });

            let delivery_stop = state.insert_stop(TripStop {
                id: StopId::generate(),
                trip_id,
                parcel_id,
                kind: StopKind::Delivery,
                sequence: 2,
                location: GeoPoint::new(ANTWERP.0, ANTWERP.1),
                status: StopStatus::Pending,
                created_at: now,
                completed_at: None,
            });

            let rule_id = state.insert_pricing_rule(PricingRule {
                id: PricingRuleId::generate(),
                name: "standard".to_owned(),
                rate_per_km: 2.0,
                surcharge_per_kg: 0.5,
                effective_from: now - jiff::SignedDuration::from_hours(24),
                effective_until: None,
                active: true,
                created_at: now,
            });

            (
                trip_id,
                driver_id,
                vehicle_id,
                route_id,
                parcel_id,
                pickup_stop,
                delivery_stop,
                rule_id,
            )
        });

    Fixture {
        store,
        fleet_owner,
        hub_owner,
        driver_id,
        vehicle_id,
        route_id,
        parcel_id,
        trip_id,
        pickup_stop,
        delivery_stop,
        rule_id,
    }
}

impl Fixture {
    pub fn charge_template(&self) -> TripCharge {
        TripCharge {
            id: ChargeId::generate(),
            trip_id: self.trip_id,
            payer_id: self.hub_owner,
            payee_id: self.fleet_owner,
            pricing_rule_id: self.rule_id,
            distance_km: 41.5,
            weight_kg: 12.5,
            base_charge: 83.0,
            surcharge: 6.25,
            total: 89.25,
            settlement_id: None,
            calculated_at: Timestamp::now(),
        }
    }

    /// Add another route between arbitrary endpoints for the same fleet.
    pub fn add_route(&self, origin: (f64, f64), destination: (f64, f64)) -> RouteId {
        self.store.setup(|state| {
            state.insert_route(FleetRoute {
                id: RouteId::generate(),
                fleet_owner_id: self.fleet_owner,
                origin: GeoPoint::new(origin.0, origin.1),
                destination: GeoPoint::new(destination.0, destination.1),
            })
        })
    }

    /// Add another trip in the given status, optionally held by a driver.
    pub fn add_trip(
        &self,
        route_id: RouteId,
        driver_id: Option<DriverId>,
        status: TripStatus,
        created_at: Timestamp,
    ) -> TripId {
        self.store.setup(|state| {
            state.insert_trip(Trip {
                id: TripId::generate(),
                fleet_owner_id: self.fleet_owner,
                route_id,
                vehicle_id: None,
                driver_id,
                status,
                created_at,
                updated_at: created_at,
                started_at: None,
                completed_at: None,
            })
        })
    }
}
