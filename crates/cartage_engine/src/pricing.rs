//! Resolution of the pricing rule in force at a given instant.

use jiff::Timestamp;

use cartage_core::{billing::PricingRule, error::ExecutionError};

use crate::store::StoreState;

/// The single rule billing must use at `now`: active, window containing
/// `now`, latest `effective_from` wins. Absence is a hard failure; billing
/// never falls back to an implicit default rate.
///
/// Two rules sharing an identical `effective_from` are not tie-broken
/// further; which one wins is implementation-defined.
pub fn resolve_active(tx: &StoreState, now: Timestamp) -> Result<&PricingRule, ExecutionError> {
    tx.pricing_rules()
        .filter(|rule| rule.covers(now))
        .max_by_key(|rule| rule.effective_from)
        .ok_or(ExecutionError::MissingPricingRule { at: now })
}
