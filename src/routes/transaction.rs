//! Request handlers for creating, listing, and deleting transactions, and for
//! generating transactions from recurring templates.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::Claims,
    budget::{Summary, summary},
    models::{MonthKey, Recurrence, Transaction, TransactionID, TransactionKind},
    recurrence::{SyncOutcome, sync},
    state::AppState,
    stores::TransactionStore,
};

/// The form data for creating a transaction.
#[derive(Deserialize)]
pub struct CreateTransaction {
    /// A short description of what the transaction was for.
    pub title: String,
    /// The amount of money spent or earned. Must be positive.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// An optional category label. Defaults to "General".
    #[serde(default)]
    pub category: Option<String>,
    /// When the transaction happened. Defaults to today.
    #[serde(default)]
    pub date: Option<Date>,
    /// When set, the transaction is created as a recurring template instead
    /// of real spending.
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Create a transaction or recurring template for the signed-in user.
pub async fn create_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<CreateTransaction>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let mut builder = Transaction::build(&data.title, data.amount, data.kind, claims.user_id())?;

    if let Some(category) = &data.category {
        builder = builder.category(category);
    }

    if let Some(date) = data.date {
        builder = builder.date(date);
    }

    if let Some(recurrence) = data.recurrence {
        builder = builder.recurring(recurrence);
    }

    let transaction = state.transaction_store.insert(builder)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List the signed-in user's transactions, most recent first.
pub async fn get_transactions(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<Transaction>>, Error> {
    let transactions = state.transaction_store.get_for_user(claims.user_id())?;

    Ok(Json(transactions))
}

/// Delete one of the signed-in user's transactions.
pub async fn delete_transaction(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<TransactionID>,
) -> Result<StatusCode, Error> {
    state
        .transaction_store
        .delete(transaction_id, claims.user_id())?;

    Ok(StatusCode::NO_CONTENT)
}

/// Report the signed-in user's all-time income and spending totals along
/// with the current month's budget standing.
pub async fn get_summary(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Summary>, Error> {
    let month_key = MonthKey::from_date(OffsetDateTime::now_utc().date());
    let summary = summary(
        &state.transaction_store,
        &state.budget_store,
        claims.user_id(),
        month_key,
    )?;

    Ok(Json(summary))
}

/// Generate all overdue transactions from the signed-in user's recurring
/// templates.
pub async fn generate_recurring(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<SyncOutcome>, Error> {
    let today = OffsetDateTime::now_utc().date();
    let outcome = sync(&state.transaction_store, claims.user_id(), today)?;

    Ok(Json(outcome))
}

#[cfg(test)]
mod transaction_route_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        budget::Summary,
        models::Transaction,
        recurrence::SyncOutcome,
        routes::{endpoints, test_utils::test_server_with_user},
    };

    #[tokio::test]
    async fn create_transaction_returns_created() {
        let (server, token) = test_server_with_user().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .content_type("application/json")
            .json(&json!({
                "title": "Groceries",
                "amount": 45.67,
                "kind": "expense",
                "category": "Food",
                "date": "2024-03-05",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.title(), "Groceries");
        assert_eq!(transaction.category(), "Food");
        assert!(!transaction.is_template());
    }

    #[tokio::test]
    async fn create_transaction_rejects_bad_amount() {
        let (server, token) = test_server_with_user().await;

        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(token)
            .content_type("application/json")
            .json(&json!({
                "title": "Groceries",
                "amount": -1.0,
                "kind": "expense",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_transaction_requires_auth() {
        let (server, _) = test_server_with_user().await;

        server
            .post(endpoints::TRANSACTIONS)
            .content_type("application/json")
            .json(&json!({
                "title": "Groceries",
                "amount": 45.67,
                "kind": "expense",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_transactions_returns_own_transactions() {
        let (server, token) = test_server_with_user().await;
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({
                "title": "Groceries",
                "amount": 45.67,
                "kind": "expense",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].title(), "Groceries");
    }

    #[tokio::test]
    async fn delete_transaction_removes_it() {
        let (server, token) = test_server_with_user().await;
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({
                "title": "Groceries",
                "amount": 45.67,
                "kind": "expense",
            }))
            .await
            .json::<Transaction>();

        server
            .delete(&format!("/api/transactions/{}", transaction.id()))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_transaction_returns_not_found() {
        let (server, token) = test_server_with_user().await;

        server
            .delete("/api/transactions/999")
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn summary_totals_income_against_expenses() {
        let (server, token) = test_server_with_user().await;
        for (title, amount, kind) in [
            ("Salary", 5000.0, "income"),
            ("Rent", 1500.0, "expense"),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&token)
                .content_type("application/json")
                .json(&json!({
                    "title": title,
                    "amount": amount,
                    "kind": kind,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let summary = server
            .get(endpoints::SUMMARY)
            .authorization_bearer(&token)
            .await
            .json::<Summary>();

        assert_eq!(summary.total_income, 5000.0);
        assert_eq!(summary.total_expense, 1500.0);
        assert_eq!(summary.balance, 3500.0);
        // The transactions default to today, so they land in the current
        // month's (unset) budget standing.
        assert_eq!(summary.budget_amount, 0.0);
        assert_eq!(summary.monthly_expense, 1500.0);
        assert_eq!(summary.budget_remaining, -1500.0);
        assert!(!summary.budget_exceeded);
    }

    #[tokio::test]
    async fn generate_recurring_catches_up_overdue_templates() {
        let (server, token) = test_server_with_user().await;
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .content_type("application/json")
            .json(&json!({
                "title": "Rent",
                "amount": 1500.0,
                "kind": "expense",
                "date": "2024-01-01",
                "recurrence": "monthly",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let outcome = server
            .post(endpoints::GENERATE_RECURRING)
            .authorization_bearer(&token)
            .await
            .json::<SyncOutcome>();

        assert_eq!(outcome.processed, 1);
        assert!(outcome.generated > 0);

        // A second run has nothing left to generate.
        let outcome = server
            .post(endpoints::GENERATE_RECURRING)
            .authorization_bearer(&token)
            .await
            .json::<SyncOutcome>();
        assert_eq!(outcome.generated, 0);
    }
}
