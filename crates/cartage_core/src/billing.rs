use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{
    AccountId, ChargeId, LedgerEntryId, PricingRuleId, SettlementId, TripId,
};

/// Rate table for trip charge computation. At most one rule resolves as
/// active for any given instant.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PricingRule {
    pub id: PricingRuleId,
    pub name: String,
    pub rate_per_km: f64,
    pub surcharge_per_kg: f64,
    pub effective_from: Timestamp,
    pub effective_until: Option<Timestamp>,
    pub active: bool,
    pub created_at: Timestamp,
}

impl PricingRule {
    /// Whether this rule's validity window contains `at`.
    pub fn covers(&self, at: Timestamp) -> bool {
        self.active
            && self.effective_from <= at
            && self.effective_until.is_none_or(|until| until >= at)
    }
}

/// The financial result of one completed trip. Written once; only
/// `settlement_id` is set afterwards, exactly once.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TripCharge {
    pub id: ChargeId,
    pub trip_id: TripId,
    pub payer_id: AccountId,
    pub payee_id: AccountId,
    pub pricing_rule_id: PricingRuleId,
    pub distance_km: f64,
    pub weight_kg: f64,
    pub base_charge: f64,
    pub surcharge: f64,
    pub total: f64,
    pub settlement_id: Option<SettlementId>,
    pub calculated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    Pending,
    Approved,
    Paid,
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementStatus::Pending => "PENDING",
            SettlementStatus::Approved => "APPROVED",
            SettlementStatus::Paid => "PAID",
        };
        write!(f, "{name}")
    }
}

/// Payment obligation from a payer (hub owner) to a payee (fleet owner).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settlement {
    pub id: SettlementId,
    pub payer_id: AccountId,
    pub payee_id: AccountId,
    pub total_amount: f64,
    pub status: SettlementStatus,
    pub approved_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEntryKind {
    Debit,
    Credit,
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEntryKind::Debit => write!(f, "DEBIT"),
            LedgerEntryKind::Credit => write!(f, "CREDIT"),
        }
    }
}

/// Immutable double-entry posting. Never updated or deleted after creation;
/// the store exposes no mutable access to ledger rows.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub settlement_id: SettlementId,
    pub kind: LedgerEntryKind,
    pub account_id: AccountId,
    pub amount: f64,
    pub description: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(from: &str, until: Option<&str>, active: bool) -> PricingRule {
        PricingRule {
            id: PricingRuleId::generate(),
            name: "standard".to_owned(),
            rate_per_km: 2.0,
            surcharge_per_kg: 0.5,
            effective_from: from.parse().unwrap(),
            effective_until: until.map(|u| u.parse().unwrap()),
            active,
            created_at: from.parse().unwrap(),
        }
    }

    #[test]
    fn open_ended_rule_covers_any_later_instant() {
        let rule = rule("2025-01-01T00:00:00Z", None, true);
        assert!(rule.covers("2030-06-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn rule_does_not_cover_before_effective_from() {
        let rule = rule("2025-01-01T00:00:00Z", None, true);
        assert!(!rule.covers("2024-12-31T23:59:59Z".parse().unwrap()));
    }

    #[test]
    fn expired_rule_does_not_cover() {
        let rule = rule("2025-01-01T00:00:00Z", Some("2025-02-01T00:00:00Z"), true);
        assert!(!rule.covers("2025-03-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn inactive_rule_never_covers() {
        let rule = rule("2025-01-01T00:00:00Z", None, false);
        assert!(!rule.covers("2025-06-01T00:00:00Z".parse().unwrap()));
    }
}
