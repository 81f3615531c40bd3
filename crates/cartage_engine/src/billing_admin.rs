//! Back-office billing operations: publishing pricing rules and walking
//! settlements through PENDING → APPROVED → PAID.

use jiff::Timestamp;
use tracing::info;

use cartage_core::{
    billing::{PricingRule, SettlementStatus},
    error::ExecutionError,
    ids::{PricingRuleId, SettlementId},
};

use crate::store::StoreState;

pub struct PricingRuleDraft {
    pub name: String,
    pub rate_per_km: f64,
    pub surcharge_per_kg: f64,
    pub effective_from: Timestamp,
    pub effective_until: Option<Timestamp>,
}

/// Publish a pricing rule. Rules are never edited after publication; rate
/// changes are expressed as a new rule with a later `effective_from`.
pub fn create_pricing_rule(
    tx: &mut StoreState,
    draft: PricingRuleDraft,
    now: Timestamp,
) -> PricingRuleId {
    let rule_id = tx.insert_pricing_rule(PricingRule {
        id: PricingRuleId::generate(),
        name: draft.name,
        rate_per_km: draft.rate_per_km,
        surcharge_per_kg: draft.surcharge_per_kg,
        effective_from: draft.effective_from,
        effective_until: draft.effective_until,
        active: true,
        created_at: now,
    });
    info!(%rule_id, "pricing rule published");
    rule_id
}

/// PENDING → APPROVED.
pub fn approve_settlement(
    tx: &mut StoreState,
    settlement_id: SettlementId,
    now: Timestamp,
) -> Result<(), ExecutionError> {
    let settlement = tx.settlement_mut(settlement_id)?;
    if settlement.status != SettlementStatus::Pending {
        return Err(ExecutionError::SettlementStateMismatch {
            settlement_id,
            expected: SettlementStatus::Pending,
            actual: settlement.status,
        });
    }
    settlement.status = SettlementStatus::Approved;
    settlement.approved_at = Some(now);
    info!(%settlement_id, "settlement approved");
    Ok(())
}

/// APPROVED → PAID. A PENDING settlement cannot skip straight to PAID.
pub fn mark_settlement_paid(
    tx: &mut StoreState,
    settlement_id: SettlementId,
    now: Timestamp,
) -> Result<(), ExecutionError> {
    let settlement = tx.settlement_mut(settlement_id)?;
    if settlement.status != SettlementStatus::Approved {
        return Err(ExecutionError::SettlementStateMismatch {
            settlement_id,
            expected: SettlementStatus::Approved,
            actual: settlement.status,
        });
    }
    settlement.status = SettlementStatus::Paid;
    settlement.paid_at = Some(now);
    info!(%settlement_id, "settlement paid");
    Ok(())
}
