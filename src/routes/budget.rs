//! Request handlers for viewing and setting the monthly budget.

use axum::{Json, extract::State};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::Claims,
    budget::{BudgetReport, report},
    models::MonthKey,
    state::AppState,
    stores::BudgetStore,
};

/// The form data for setting a monthly budget.
#[derive(Deserialize)]
pub struct SetBudget {
    /// The spending limit. Must not be negative; zero clears the limit.
    pub amount: f64,
    /// The month to budget for. Defaults to the current month.
    #[serde(default)]
    pub month_key: Option<MonthKey>,
}

/// Report the signed-in user's budget for the current month.
pub async fn get_current_budget(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<BudgetReport>, Error> {
    let month_key = MonthKey::from_date(OffsetDateTime::now_utc().date());
    let report = report(
        &state.transaction_store,
        &state.budget_store,
        claims.user_id(),
        month_key,
    )?;

    Ok(Json(report))
}

/// Set the signed-in user's budget for a month and report the result.
pub async fn set_budget(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<SetBudget>,
) -> Result<Json<BudgetReport>, Error> {
    let month_key = data
        .month_key
        .unwrap_or_else(|| MonthKey::from_date(OffsetDateTime::now_utc().date()));

    state
        .budget_store
        .upsert(claims.user_id(), month_key, data.amount)?;

    let report = report(
        &state.transaction_store,
        &state.budget_store,
        claims.user_id(),
        month_key,
    )?;

    Ok(Json(report))
}
