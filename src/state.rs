//! Defines the state of the application which is shared across request
//! handlers.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{
    Error,
    auth::JwtKeys,
    db::initialize,
    stores::sqlite::{SqliteBudgetStore, SqliteTransactionStore, SqliteUserStore},
};

/// The state of the application.
///
/// The stores share a single database connection, so cloning the state into
/// each request handler is cheap.
#[derive(Clone, FromRef)]
pub struct AppState {
    /// The store for transactions and recurring templates.
    pub transaction_store: SqliteTransactionStore,
    /// The store for monthly budgets.
    pub budget_store: SqliteBudgetStore,
    /// The store for user accounts.
    pub user_store: SqliteUserStore,
    /// The keys used to sign and verify access tokens.
    pub jwt_keys: JwtKeys,
}

impl AppState {
    /// Create the application state, creating the database tables if they do
    /// not exist yet.
    ///
    /// # Errors
    /// Returns an error if the database could not be initialized.
    pub fn new(connection: Connection, jwt_secret: &str) -> Result<Self, Error> {
        initialize(&connection)?;
        let connection = Arc::new(Mutex::new(connection));

        Ok(Self {
            transaction_store: SqliteTransactionStore::new(connection.clone()),
            budget_store: SqliteBudgetStore::new(connection.clone()),
            user_store: SqliteUserStore::new(connection),
            jwt_keys: JwtKeys::new(jwt_secret),
        })
    }
}
