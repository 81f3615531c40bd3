//! Conversion of a completed trip into an immutable financial record:
//! pricing resolution, charge computation, settlement creation, and the
//! double-entry ledger pair. Runs inside the same unit of work as the
//! completion transition that triggers it, and replays safely.

use jiff::Timestamp;
use tracing::info;

use cartage_core::{
    billing::{LedgerEntry, LedgerEntryKind, Settlement, SettlementStatus, TripCharge},
    error::ExecutionError,
    ids::{ChargeId, LedgerEntryId, SettlementId, TripId},
    trip::{StopKind, TripStatus},
};

use crate::{pricing, store::StoreState};

/// Settle a completed trip. Calling this for a trip that already carries a
/// charge returns that charge unchanged; anything but COMPLETED status is a
/// contract violation by the caller.
pub fn process_trip(
    tx: &mut StoreState,
    trip_id: TripId,
    now: Timestamp,
) -> Result<TripCharge, ExecutionError> {
    let trip = tx.trip(trip_id)?;
    if trip.status != TripStatus::Completed {
        return Err(ExecutionError::StateMismatch {
            trip_id,
            expected: "COMPLETED",
            actual: trip.status,
        });
    }
    let payee_id = trip.fleet_owner_id;
    let route_id = trip.route_id;

    // Idempotent replay: the per-trip uniqueness of charges makes a retried
    // completion return the record it already produced.
    if let Some(existing) = tx.charge_for_trip(trip_id) {
        return Ok(existing.clone());
    }

    // The payer and the billable weight come from the parcel on the pickup
    // stop.
    let parcel_id = tx
        .stops_of(trip_id)
        .iter()
        .find(|stop| stop.kind == StopKind::Pickup)
        .map(|stop| stop.parcel_id)
        .ok_or(ExecutionError::MissingParcel(trip_id))?;
    let parcel = tx.parcel(parcel_id)?;
    let payer_id = parcel.hub_owner_id;
    let weight_kg = parcel.weight_kg;

    let route = tx.route(route_id)?;
    let distance_km = route.origin.haversine_km(&route.destination);

    let rule = pricing::resolve_active(tx, now)?;
    let pricing_rule_id = rule.id;
    let base_charge = distance_km * rule.rate_per_km;
    let surcharge = weight_kg * rule.surcharge_per_kg;
    let total = base_charge + surcharge;

    let mut charge = TripCharge {
        id: ChargeId::generate(),
        trip_id,
        payer_id,
        payee_id,
        pricing_rule_id,
        distance_km,
        weight_kg,
        base_charge,
        surcharge,
        total,
        settlement_id: None,
        calculated_at: now,
    };
    let charge_id = tx.insert_trip_charge(charge.clone())?;

    let settlement_id = tx.insert_settlement(Settlement {
        id: SettlementId::generate(),
        payer_id,
        payee_id,
        total_amount: total,
        status: SettlementStatus::Pending,
        approved_at: None,
        paid_at: None,
        created_at: now,
    });
    tx.link_charge_to_settlement(charge_id, settlement_id);
    charge.settlement_id = Some(settlement_id);

    post_pair(tx, settlement_id, payer_id, payee_id, total, trip_id, now);

    info!(%trip_id, %charge_id, %settlement_id, total, "trip charge recorded");

    Ok(charge)
}

/// Exactly one DEBIT against the payer and one CREDIT against the payee, of
/// equal magnitude.
fn post_pair(
    tx: &mut StoreState,
    settlement_id: SettlementId,
    payer_id: cartage_core::ids::AccountId,
    payee_id: cartage_core::ids::AccountId,
    total: f64,
    trip_id: TripId,
    now: Timestamp,
) {
    tx.insert_ledger_entry(LedgerEntry {
        id: LedgerEntryId::generate(),
        settlement_id,
        kind: LedgerEntryKind::Debit,
        account_id: payer_id,
        amount: total,
        description: format!("trip charge {trip_id}"),
        created_at: now,
    });
    tx.insert_ledger_entry(LedgerEntry {
        id: LedgerEntryId::generate(),
        settlement_id,
        kind: LedgerEntryKind::Credit,
        account_id: payee_id,
        amount: total,
        description: format!("trip earnings {trip_id}"),
        created_at: now,
    });
}
