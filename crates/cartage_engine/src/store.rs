use fxhash::FxHashMap;
use jiff::Timestamp;
use parking_lot::RwLock;

use cartage_core::{
    billing::{LedgerEntry, PricingRule, Settlement, TripCharge},
    error::ExecutionError,
    fleet::{Driver, FleetRoute, Parcel, Vehicle},
    ids::{
        AccountId, ChargeId, DriverId, LedgerEntryId, LocationSampleId, ParcelId, PricingRuleId,
        RouteId, SettlementId, StopId, TripId, VehicleId,
    },
    lock::VehicleLock,
    trip::{StopStatus, Trip, TripLocation, TripStop, TripStatus},
};

/// Every persisted table of the execution core. Cloneable so a transaction
/// can work against a draft and throw it away on failure.
#[derive(Default, Clone)]
pub struct StoreState {
    trips: FxHashMap<TripId, Trip>,
    stops: FxHashMap<StopId, TripStop>,
    locks: FxHashMap<cartage_core::ids::LockId, VehicleLock>,
    locations: FxHashMap<LocationSampleId, TripLocation>,
    pricing_rules: FxHashMap<PricingRuleId, PricingRule>,
    charges: FxHashMap<ChargeId, TripCharge>,
    settlements: FxHashMap<SettlementId, Settlement>,
    ledger: FxHashMap<LedgerEntryId, LedgerEntry>,
    routes: FxHashMap<RouteId, FleetRoute>,
    drivers: FxHashMap<DriverId, Driver>,
    vehicles: FxHashMap<VehicleId, Vehicle>,
    parcels: FxHashMap<ParcelId, Parcel>,
}

impl StoreState {
    // --- trips ---

    pub fn trip(&self, trip_id: TripId) -> Result<&Trip, ExecutionError> {
        self.trips
            .get(&trip_id)
            .ok_or(ExecutionError::TripNotFound(trip_id))
    }

    pub fn trip_mut(&mut self, trip_id: TripId) -> Result<&mut Trip, ExecutionError> {
        self.trips
            .get_mut(&trip_id)
            .ok_or(ExecutionError::TripNotFound(trip_id))
    }

    pub fn insert_trip(&mut self, trip: Trip) -> TripId {
        let id = trip.id;
        self.trips.insert(id, trip);
        id
    }

    pub fn planned_trips_of(&self, driver_id: DriverId) -> Vec<&Trip> {
        self.trips
            .values()
            .filter(|trip| trip.driver_id == Some(driver_id) && trip.status == TripStatus::Planned)
            .collect()
    }

    pub fn in_progress_count(&self, driver_id: DriverId) -> usize {
        self.trips
            .values()
            .filter(|trip| {
                trip.driver_id == Some(driver_id) && trip.status == TripStatus::InProgress
            })
            .count()
    }

    // --- stops ---

    pub fn insert_stop(&mut self, stop: TripStop) -> StopId {
        let id = stop.id;
        self.stops.insert(id, stop);
        id
    }

    pub fn stop(&self, trip_id: TripId, stop_id: StopId) -> Result<&TripStop, ExecutionError> {
        self.stops
            .get(&stop_id)
            .filter(|stop| stop.trip_id == trip_id)
            .ok_or(ExecutionError::StopNotFound { trip_id, stop_id })
    }

    pub fn stop_mut(
        &mut self,
        trip_id: TripId,
        stop_id: StopId,
    ) -> Result<&mut TripStop, ExecutionError> {
        self.stops
            .get_mut(&stop_id)
            .filter(|stop| stop.trip_id == trip_id)
            .ok_or(ExecutionError::StopNotFound { trip_id, stop_id })
    }

    pub fn stops_of(&self, trip_id: TripId) -> Vec<&TripStop> {
        let mut stops: Vec<&TripStop> = self
            .stops
            .values()
            .filter(|stop| stop.trip_id == trip_id)
            .collect();
        stops.sort_by_key(|stop| stop.sequence);
        stops
    }

    /// Highest sequence number already completed for the trip, 0 if none.
    pub fn max_completed_sequence(&self, trip_id: TripId) -> u32 {
        self.stops
            .values()
            .filter(|stop| stop.trip_id == trip_id && stop.status == StopStatus::Completed)
            .map(|stop| stop.sequence)
            .max()
            .unwrap_or(0)
    }

    pub fn pending_stop_sequences(&self, trip_id: TripId) -> Vec<u32> {
        let mut pending: Vec<u32> = self
            .stops
            .values()
            .filter(|stop| stop.trip_id == trip_id && stop.status != StopStatus::Completed)
            .map(|stop| stop.sequence)
            .collect();
        pending.sort_unstable();
        pending
    }

    // --- vehicle locks ---

    pub fn live_lock(&self, vehicle_id: VehicleId) -> Option<&VehicleLock> {
        self.locks
            .values()
            .find(|lock| lock.vehicle_id == vehicle_id && lock.is_live())
    }

    /// Insert a new live lock. The conditional uniqueness of "at most one
    /// unreleased lock per vehicle" is enforced here, at the storage layer,
    /// and surfaces as a typed conflict rather than a generic fault.
    pub fn insert_vehicle_lock(&mut self, lock: VehicleLock) -> Result<(), ExecutionError> {
        if let Some(holder) = self.live_lock(lock.vehicle_id) {
            return Err(ExecutionError::VehicleInUse {
                vehicle_id: lock.vehicle_id,
                holding_trip_id: holder.trip_id,
            });
        }
        self.locks.insert(lock.id, lock);
        Ok(())
    }

    /// Release the live lock held by `trip_id` on `vehicle_id`. Idempotent:
    /// returns false when no such live lock exists.
    pub fn release_lock(
        &mut self,
        vehicle_id: VehicleId,
        trip_id: TripId,
        released_at: Timestamp,
    ) -> bool {
        let lock = self.locks.values_mut().find(|lock| {
            lock.vehicle_id == vehicle_id && lock.trip_id == trip_id && lock.is_live()
        });
        match lock {
            Some(lock) => {
                lock.released_at = Some(released_at);
                true
            }
            None => false,
        }
    }

    // --- locations ---

    pub fn insert_location(&mut self, sample: TripLocation) -> LocationSampleId {
        let id = sample.id;
        self.locations.insert(id, sample);
        id
    }

    pub fn locations_of(&self, trip_id: TripId) -> Vec<&TripLocation> {
        let mut samples: Vec<&TripLocation> = self
            .locations
            .values()
            .filter(|sample| sample.trip_id == trip_id)
            .collect();
        samples.sort_by_key(|sample| sample.recorded_at);
        samples
    }

    // --- pricing ---

    pub fn insert_pricing_rule(&mut self, rule: PricingRule) -> PricingRuleId {
        let id = rule.id;
        self.pricing_rules.insert(id, rule);
        id
    }

    pub fn pricing_rules(&self) -> impl Iterator<Item = &PricingRule> {
        self.pricing_rules.values()
    }

    // --- charges ---

    pub fn charge_for_trip(&self, trip_id: TripId) -> Option<&TripCharge> {
        self.charges.values().find(|charge| charge.trip_id == trip_id)
    }

    /// Insert a trip charge, enforcing at most one charge per trip.
    pub fn insert_trip_charge(&mut self, charge: TripCharge) -> Result<ChargeId, ExecutionError> {
        if let Some(existing) = self.charge_for_trip(charge.trip_id) {
            return Err(ExecutionError::ChargeAlreadyRecorded {
                trip_id: charge.trip_id,
                charge_id: existing.id,
            });
        }
        let id = charge.id;
        self.charges.insert(id, charge);
        Ok(id)
    }

    /// Set the append-only settlement link of a charge. A no-op if already
    /// linked; charges are otherwise read-only after creation.
    pub fn link_charge_to_settlement(&mut self, charge_id: ChargeId, settlement_id: SettlementId) {
        if let Some(charge) = self.charges.get_mut(&charge_id) {
            if charge.settlement_id.is_none() {
                charge.settlement_id = Some(settlement_id);
            }
        }
    }

    // --- settlements & ledger ---

    pub fn insert_settlement(&mut self, settlement: Settlement) -> SettlementId {
        let id = settlement.id;
        self.settlements.insert(id, settlement);
        id
    }

    pub fn settlement(&self, settlement_id: SettlementId) -> Result<&Settlement, ExecutionError> {
        self.settlements
            .get(&settlement_id)
            .ok_or(ExecutionError::SettlementNotFound(settlement_id))
    }

    pub fn settlement_mut(
        &mut self,
        settlement_id: SettlementId,
    ) -> Result<&mut Settlement, ExecutionError> {
        self.settlements
            .get_mut(&settlement_id)
            .ok_or(ExecutionError::SettlementNotFound(settlement_id))
    }

    pub fn settlements_for_account(&self, account_id: AccountId) -> Vec<&Settlement> {
        let mut settlements: Vec<&Settlement> = self
            .settlements
            .values()
            .filter(|s| s.payer_id == account_id || s.payee_id == account_id)
            .collect();
        settlements.sort_by_key(|s| s.created_at);
        settlements
    }

    // Ledger rows are append-only: insert and read, no mutable access.

    pub fn insert_ledger_entry(&mut self, entry: LedgerEntry) -> LedgerEntryId {
        let id = entry.id;
        self.ledger.insert(id, entry);
        id
    }

    pub fn ledger_for_settlement(&self, settlement_id: SettlementId) -> Vec<&LedgerEntry> {
        self.ledger
            .values()
            .filter(|entry| entry.settlement_id == settlement_id)
            .collect()
    }

    // --- fleet read models ---

    pub fn insert_route(&mut self, route: FleetRoute) -> RouteId {
        let id = route.id;
        self.routes.insert(id, route);
        id
    }

    pub fn route(&self, route_id: RouteId) -> Result<&FleetRoute, ExecutionError> {
        self.routes
            .get(&route_id)
            .ok_or(ExecutionError::RouteNotFound(route_id))
    }

    pub fn insert_driver(&mut self, driver: Driver) -> DriverId {
        let id = driver.id;
        self.drivers.insert(id, driver);
        id
    }

    pub fn driver(&self, driver_id: DriverId) -> Result<&Driver, ExecutionError> {
        self.drivers
            .get(&driver_id)
            .ok_or(ExecutionError::DriverNotFound(driver_id))
    }

    pub fn insert_vehicle(&mut self, vehicle: Vehicle) -> VehicleId {
        let id = vehicle.id;
        self.vehicles.insert(id, vehicle);
        id
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> Result<&Vehicle, ExecutionError> {
        self.vehicles
            .get(&vehicle_id)
            .ok_or(ExecutionError::VehicleNotFound(vehicle_id))
    }

    pub fn insert_parcel(&mut self, parcel: Parcel) -> ParcelId {
        let id = parcel.id;
        self.parcels.insert(id, parcel);
        id
    }

    pub fn parcel(&self, parcel_id: ParcelId) -> Result<&Parcel, ExecutionError> {
        self.parcels
            .get(&parcel_id)
            .ok_or(ExecutionError::ParcelNotFound(parcel_id))
    }
}

/// The persistent store. The write lock is the serialization point for all
/// state transitions; guard checks and mutations of one operation always run
/// under the same exclusive hold.
#[derive(Default)]
pub struct Store {
    state: RwLock<StoreState>,
}

impl Store {
    /// Run `f` as one atomic unit of work: the draft state is installed only
    /// when `f` returns `Ok`, otherwise every mutation is discarded.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, ExecutionError>,
    ) -> Result<T, ExecutionError> {
        let mut guard = self.state.write();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        *guard = draft;
        Ok(out)
    }

    pub fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        f(&self.state.read())
    }

    /// Infallible setup writes (fixtures, external-collaborator CRUD).
    pub fn setup<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        f(&mut self.state.write())
    }
}
