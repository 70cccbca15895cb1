//! Defines the JSON API routes and their request handlers.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{auth, state::AppState};

pub mod endpoints;

mod budget;
mod transaction;
mod user;

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(auth::register))
        .route(endpoints::LOG_IN, post(auth::log_in))
        .route(
            endpoints::PROFILE,
            get(user::get_profile).put(user::update_profile),
        )
        .route(
            endpoints::TRANSACTIONS,
            post(transaction::create_transaction).get(transaction::get_transactions),
        )
        .route(endpoints::TRANSACTION, delete(transaction::delete_transaction))
        .route(endpoints::SUMMARY, get(transaction::get_summary))
        .route(
            endpoints::GENERATE_RECURRING,
            post(transaction::generate_recurring),
        )
        .route(
            endpoints::BUDGET,
            get(budget::get_current_budget).put(budget::set_budget),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
