use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use cartage_core::{
    billing::{LedgerEntry, PricingRule, Settlement, TripCharge},
    ids::{AccountId, PricingRuleId, SettlementId, TripId},
};
use cartage_engine::billing_admin::PricingRuleDraft;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePricingRuleRequest {
    pub name: String,
    pub rate_per_km: f64,
    pub surcharge_per_kg: f64,
    pub effective_from: Timestamp,
    pub effective_until: Option<Timestamp>,
    pub actor: String,
}

#[derive(Serialize)]
pub struct CreatePricingRuleResponse {
    pub rule_id: PricingRuleId,
}

pub async fn create_pricing_rule_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePricingRuleRequest>,
) -> Result<Json<CreatePricingRuleResponse>, ApiError> {
    let rule_id = state.orchestrator.create_pricing_rule(
        PricingRuleDraft {
            name: request.name,
            rate_per_km: request.rate_per_km,
            surcharge_per_kg: request.surcharge_per_kg,
            effective_from: request.effective_from,
            effective_until: request.effective_until,
        },
        request.actor,
    );
    Ok(Json(CreatePricingRuleResponse { rule_id }))
}

pub async fn list_pricing_rules_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<PricingRule>> {
    Json(state.orchestrator.pricing_rules())
}

#[derive(Deserialize)]
pub struct AdminActorRequest {
    pub actor: String,
}

pub async fn approve_settlement_handler(
    State(state): State<Arc<AppState>>,
    Path(settlement_id): Path<SettlementId>,
    Json(request): Json<AdminActorRequest>,
) -> Result<Json<Settlement>, ApiError> {
    state
        .orchestrator
        .approve_settlement(settlement_id, request.actor)?;
    Ok(Json(state.orchestrator.settlement(settlement_id)?))
}

pub async fn mark_settlement_paid_handler(
    State(state): State<Arc<AppState>>,
    Path(settlement_id): Path<SettlementId>,
    Json(request): Json<AdminActorRequest>,
) -> Result<Json<Settlement>, ApiError> {
    state
        .orchestrator
        .mark_settlement_paid(settlement_id, request.actor)?;
    Ok(Json(state.orchestrator.settlement(settlement_id)?))
}

pub async fn get_settlement_handler(
    State(state): State<Arc<AppState>>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<Settlement>, ApiError> {
    Ok(Json(state.orchestrator.settlement(settlement_id)?))
}

pub async fn get_settlement_ledger_handler(
    State(state): State<Arc<AppState>>,
    Path(settlement_id): Path<SettlementId>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    Ok(Json(state.orchestrator.settlement_ledger(settlement_id)?))
}

pub async fn get_account_settlements_handler(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    Ok(Json(state.orchestrator.settlements_for_account(account_id)))
}

pub async fn get_trip_charge_handler(
    State(state): State<Arc<AppState>>,
    Path(trip_id): Path<TripId>,
) -> Result<Json<Option<TripCharge>>, ApiError> {
    Ok(Json(state.orchestrator.trip_charge(trip_id)?))
}
