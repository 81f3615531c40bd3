//! The single entrypoint callers drive. One method per inbound operation;
//! each runs its guards and mutations as one store transaction and emits an
//! audit event after the commit.

use std::sync::Arc;

use jiff::Timestamp;
use serde_json::json;
use tracing::warn;

use cartage_core::{
    billing::{LedgerEntry, PricingRule, Settlement, TripCharge},
    error::ExecutionError,
    geopoint::GeoPoint,
    ids::{AccountId, DriverId, LocationSampleId, PricingRuleId, SettlementId, StopId, TripId},
    trip::{Trip, TripLocation, TripStop},
};

use crate::{
    audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink},
    billing_admin::{self, PricingRuleDraft},
    creation::{self, TripDraft},
    lifecycle::{self, CompletionOutcome, StartOutcome},
    store::Store,
};

pub struct TripOrchestrator<A: AuditSink = TracingAuditSink> {
    store: Arc<Store>,
    audit: A,
}

impl TripOrchestrator<TracingAuditSink> {
    pub fn new(store: Arc<Store>) -> Self {
        Self::with_audit(store, TracingAuditSink)
    }
}

impl<A: AuditSink> TripOrchestrator<A> {
    pub fn with_audit(store: Arc<Store>, audit: A) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Audit failures are logged and swallowed: the transaction has already
    /// committed and must stay committed.
    fn emit(&self, action: AuditAction, actor: String, metadata: serde_json::Value) {
        let event = AuditEvent::new(action, actor, metadata);
        if let Err(error) = self.audit.record(event) {
            warn!(%action, %error, "audit event dropped");
        }
    }

    // --- intake ---

    pub fn create_trip(&self, draft: TripDraft) -> Result<TripId, ExecutionError> {
        let actor = format!("fleet owner {}", draft.fleet_owner_id);
        let route_id = draft.route_id;
        let trip_id = self
            .store
            .transaction(|tx| creation::create_trip(tx, draft, Timestamp::now()))?;
        self.emit(
            AuditAction::TripCreated,
            actor,
            json!({ "trip_id": trip_id.to_string(), "route_id": route_id.to_string() }),
        );
        Ok(trip_id)
    }

    pub fn cancel_trip(
        &self,
        trip_id: TripId,
        fleet_owner_id: AccountId,
    ) -> Result<(), ExecutionError> {
        self.store
            .transaction(|tx| lifecycle::cancel(tx, trip_id, fleet_owner_id, Timestamp::now()))?;
        self.emit(
            AuditAction::TripCancelled,
            format!("fleet owner {fleet_owner_id}"),
            json!({ "trip_id": trip_id.to_string() }),
        );
        Ok(())
    }

    // --- assignment ---

    pub fn assign_driver(
        &self,
        trip_id: TripId,
        driver_id: DriverId,
        fleet_owner_id: AccountId,
    ) -> Result<(), ExecutionError> {
        self.store.transaction(|tx| {
            lifecycle::assign_driver(tx, trip_id, driver_id, fleet_owner_id, Timestamp::now())
        })?;
        self.emit(
            AuditAction::DriverAssigned,
            format!("fleet owner {fleet_owner_id}"),
            json!({ "trip_id": trip_id.to_string(), "driver_id": driver_id.to_string() }),
        );
        Ok(())
    }

    pub fn unassign_driver(
        &self,
        trip_id: TripId,
        fleet_owner_id: AccountId,
    ) -> Result<(), ExecutionError> {
        self.store.transaction(|tx| {
            lifecycle::unassign_driver(tx, trip_id, fleet_owner_id, Timestamp::now())
        })?;
        self.emit(
            AuditAction::DriverUnassigned,
            format!("fleet owner {fleet_owner_id}"),
            json!({ "trip_id": trip_id.to_string() }),
        );
        Ok(())
    }

    // --- execution ---

    pub fn start_trip(
        &self,
        trip_id: TripId,
        driver_id: DriverId,
    ) -> Result<StartOutcome, ExecutionError> {
        let outcome = self
            .store
            .transaction(|tx| lifecycle::start(tx, trip_id, driver_id, Timestamp::now()))?;
        self.emit(
            AuditAction::TripStarted,
            format!("driver {driver_id}"),
            json!({
                "trip_id": trip_id.to_string(),
                "vehicle_locked": outcome.vehicle_locked,
            }),
        );
        Ok(outcome)
    }

    /// Breadcrumbs are high-volume pass-through writes and are not audited
    /// individually.
    pub fn record_location(
        &self,
        trip_id: TripId,
        driver_id: DriverId,
        point: GeoPoint,
        accuracy_m: Option<f64>,
    ) -> Result<LocationSampleId, ExecutionError> {
        self.store.transaction(|tx| {
            lifecycle::record_location(tx, trip_id, driver_id, point, accuracy_m, Timestamp::now())
        })
    }

    pub fn complete_stop(
        &self,
        trip_id: TripId,
        stop_id: StopId,
        driver_id: DriverId,
    ) -> Result<u32, ExecutionError> {
        let sequence = self.store.transaction(|tx| {
            lifecycle::complete_stop(tx, trip_id, stop_id, driver_id, Timestamp::now())
        })?;
        self.emit(
            AuditAction::StopCompleted,
            format!("driver {driver_id}"),
            json!({
                "trip_id": trip_id.to_string(),
                "stop_id": stop_id.to_string(),
                "sequence": sequence,
            }),
        );
        Ok(sequence)
    }

    /// Completion and settlement commit together: when billing fails, the
    /// trip stays IN_PROGRESS and the vehicle lock stays held.
    pub fn complete_trip(
        &self,
        trip_id: TripId,
        driver_id: DriverId,
    ) -> Result<CompletionOutcome, ExecutionError> {
        let outcome = self
            .store
            .transaction(|tx| lifecycle::complete(tx, trip_id, driver_id, Timestamp::now()))?;
        self.emit(
            AuditAction::TripCompleted,
            format!("driver {driver_id}"),
            json!({
                "trip_id": trip_id.to_string(),
                "vehicle_unlocked": outcome.vehicle_unlocked,
            }),
        );
        self.emit(
            AuditAction::TripChargeCalculated,
            format!("driver {driver_id}"),
            json!({
                "trip_id": trip_id.to_string(),
                "charge_id": outcome.charge.id.to_string(),
                "total": outcome.charge.total,
            }),
        );
        Ok(outcome)
    }

    // --- billing back office ---

    pub fn create_pricing_rule(&self, draft: PricingRuleDraft, actor: String) -> PricingRuleId {
        let rule_id = self
            .store
            .setup(|state| billing_admin::create_pricing_rule(state, draft, Timestamp::now()));
        self.emit(
            AuditAction::PricingRuleCreated,
            actor,
            json!({ "rule_id": rule_id.to_string() }),
        );
        rule_id
    }

    pub fn approve_settlement(
        &self,
        settlement_id: SettlementId,
        actor: String,
    ) -> Result<(), ExecutionError> {
        self.store.transaction(|tx| {
            billing_admin::approve_settlement(tx, settlement_id, Timestamp::now())
        })?;
        self.emit(
            AuditAction::SettlementApproved,
            actor,
            json!({ "settlement_id": settlement_id.to_string() }),
        );
        Ok(())
    }

    pub fn mark_settlement_paid(
        &self,
        settlement_id: SettlementId,
        actor: String,
    ) -> Result<(), ExecutionError> {
        self.store.transaction(|tx| {
            billing_admin::mark_settlement_paid(tx, settlement_id, Timestamp::now())
        })?;
        self.emit(
            AuditAction::SettlementPaid,
            actor,
            json!({ "settlement_id": settlement_id.to_string() }),
        );
        Ok(())
    }

    // --- reads ---

    pub fn trip(&self, trip_id: TripId) -> Result<Trip, ExecutionError> {
        self.store.read(|state| state.trip(trip_id).cloned())
    }

    pub fn trip_stops(&self, trip_id: TripId) -> Result<Vec<TripStop>, ExecutionError> {
        self.store.read(|state| {
            state.trip(trip_id)?;
            Ok(state.stops_of(trip_id).into_iter().cloned().collect())
        })
    }

    pub fn trip_locations(&self, trip_id: TripId) -> Result<Vec<TripLocation>, ExecutionError> {
        self.store.read(|state| {
            state.trip(trip_id)?;
            Ok(state.locations_of(trip_id).into_iter().cloned().collect())
        })
    }

    pub fn trip_charge(&self, trip_id: TripId) -> Result<Option<TripCharge>, ExecutionError> {
        self.store.read(|state| {
            state.trip(trip_id)?;
            Ok(state.charge_for_trip(trip_id).cloned())
        })
    }

    pub fn settlement(&self, settlement_id: SettlementId) -> Result<Settlement, ExecutionError> {
        self.store
            .read(|state| state.settlement(settlement_id).cloned())
    }

    pub fn settlements_for_account(&self, account_id: AccountId) -> Vec<Settlement> {
        self.store.read(|state| {
            state
                .settlements_for_account(account_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn pricing_rules(&self) -> Vec<PricingRule> {
        self.store.read(|state| {
            let mut rules: Vec<PricingRule> = state.pricing_rules().cloned().collect();
            rules.sort_by_key(|rule| rule.effective_from);
            rules
        })
    }

    pub fn settlement_ledger(
        &self,
        settlement_id: SettlementId,
    ) -> Result<Vec<LedgerEntry>, ExecutionError> {
        self.store.read(|state| {
            state.settlement(settlement_id)?;
            Ok(state
                .ledger_for_settlement(settlement_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use cartage_core::{billing::SettlementStatus, fleet::Driver, trip::TripStatus};

    use super::*;
    use crate::audit::testing::{FailingAuditSink, MemoryAuditSink};
    use crate::test_utils::fixture;

    #[test]
    fn drives_a_trip_from_start_to_settled_charge() {
        let fx = fixture();
        let orchestrator =
            TripOrchestrator::with_audit(Arc::clone(&fx.store), MemoryAuditSink::default());

        orchestrator.start_trip(fx.trip_id, fx.driver_id).unwrap();
        orchestrator
            .complete_stop(fx.trip_id, fx.pickup_stop, fx.driver_id)
            .unwrap();
        orchestrator
            .complete_stop(fx.trip_id, fx.delivery_stop, fx.driver_id)
            .unwrap();
        let outcome = orchestrator.complete_trip(fx.trip_id, fx.driver_id).unwrap();

        assert!(outcome.vehicle_unlocked);
        let charge = orchestrator.trip_charge(fx.trip_id).unwrap().unwrap();
        assert_eq!(charge.id, outcome.charge.id);

        let settlement_id = charge.settlement_id.unwrap();
        orchestrator
            .approve_settlement(settlement_id, "billing admin".to_owned())
            .unwrap();
        orchestrator
            .mark_settlement_paid(settlement_id, "billing admin".to_owned())
            .unwrap();
        assert_eq!(
            orchestrator.settlement(settlement_id).unwrap().status,
            SettlementStatus::Paid
        );

        let ledger = orchestrator.settlement_ledger(settlement_id).unwrap();
        assert_eq!(ledger.len(), 2);

        let actions: Vec<AuditAction> = orchestrator
            .audit
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::TripStarted,
                AuditAction::StopCompleted,
                AuditAction::StopCompleted,
                AuditAction::TripCompleted,
                AuditAction::TripChargeCalculated,
                AuditAction::SettlementApproved,
                AuditAction::SettlementPaid,
            ]
        );
    }

    #[test]
    fn audit_sink_failure_never_undoes_a_commit() {
        let fx = fixture();
        let orchestrator = TripOrchestrator::with_audit(Arc::clone(&fx.store), FailingAuditSink);

        orchestrator.start_trip(fx.trip_id, fx.driver_id).unwrap();
        fx.store.read(|state| {
            assert_eq!(
                state.trip(fx.trip_id).unwrap().status,
                TripStatus::InProgress
            );
        });
    }

    #[test]
    fn concurrent_starts_on_one_vehicle_admit_exactly_one() {
        let fx = fixture();
        let orchestrator = Arc::new(TripOrchestrator::new(Arc::clone(&fx.store)));

        // Four more pending trips on the same vehicle, each with its own
        // driver.
        let mut contenders = vec![(fx.trip_id, fx.driver_id)];
        for i in 0..4 {
            let (trip_id, driver_id) = fx.store.setup(|state| {
                let driver_id = state.insert_driver(Driver {
                    id: DriverId::generate(),
                    fleet_owner_id: fx.fleet_owner,
                    name: format!("driver {i}"),
                    active: true,
                });
                let mut trip = state.trip(fx.trip_id).unwrap().clone();
                trip.id = TripId::generate();
                trip.driver_id = Some(driver_id);
                let trip_id = state.insert_trip(trip);
                (trip_id, driver_id)
            });
            contenders.push((trip_id, driver_id));
        }

        let handles: Vec<_> = contenders
            .into_iter()
            .map(|(trip_id, driver_id)| {
                let orchestrator = Arc::clone(&orchestrator);
                thread::spawn(move || orchestrator.start_trip(trip_id, driver_id))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let winners = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(winners, 1);
        for result in results.iter().filter(|result| result.is_err()) {
            let err = result.as_ref().unwrap_err();
            assert!(
                matches!(err, ExecutionError::VehicleInUse { .. }),
                "unexpected loser error: {err}"
            );
            assert!(err.is_retryable());
        }

        fx.store.read(|state| {
            assert!(state.live_lock(fx.vehicle_id).is_some());
        });
    }

    #[test]
    fn full_intake_to_execution_flow() {
        let fx = fixture();
        let orchestrator = TripOrchestrator::new(Arc::clone(&fx.store));

        let trip_id = orchestrator
            .create_trip(TripDraft {
                fleet_owner_id: fx.fleet_owner,
                route_id: fx.route_id,
                parcel_id: fx.parcel_id,
                vehicle_id: None,
                driver_id: None,
            })
            .unwrap();
        assert_eq!(orchestrator.trip(trip_id).unwrap().status, TripStatus::Planned);

        orchestrator
            .assign_driver(trip_id, fx.driver_id, fx.fleet_owner)
            .unwrap();
        assert_eq!(orchestrator.trip(trip_id).unwrap().status, TripStatus::Pending);

        orchestrator.unassign_driver(trip_id, fx.fleet_owner).unwrap();
        assert_eq!(orchestrator.trip(trip_id).unwrap().status, TripStatus::Planned);

        orchestrator.cancel_trip(trip_id, fx.fleet_owner).unwrap();
        assert_eq!(
            orchestrator.trip(trip_id).unwrap().status,
            TripStatus::Cancelled
        );
    }
}
