use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row, types::Type};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Budget, MonthKey, UserID},
    stores::BudgetStore,
};

/// Creates and retrieves monthly budgets from a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteBudgetStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBudgetStore {
    /// Create a new store that uses the given database connection.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl BudgetStore for SqliteBudgetStore {
    fn get(&self, user_id: UserID, month_key: MonthKey) -> Result<Option<Budget>, Error> {
        let budget = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, user_id, month_key, amount FROM budget \
                 WHERE user_id = ?1 AND month_key = ?2",
            )?
            .query_row(
                (user_id.as_i64(), month_key.to_string()),
                SqliteBudgetStore::map_row,
            )
            .optional()?;

        Ok(budget)
    }

    fn upsert(&self, user_id: UserID, month_key: MonthKey, amount: f64) -> Result<Budget, Error> {
        // The comparison is written this way so that NaN is also rejected.
        if !(amount >= 0.0) {
            return Err(Error::NegativeBudgetAmount);
        }

        let budget = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "INSERT INTO budget (user_id, month_key, amount) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (user_id, month_key) DO UPDATE SET amount = excluded.amount \
                 RETURNING id, user_id, month_key, amount",
            )?
            .query_row(
                (user_id.as_i64(), month_key.to_string(), amount),
                SqliteBudgetStore::map_row,
            )?;

        Ok(budget)
    }
}

impl CreateTable for SqliteBudgetStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                month_key TEXT NOT NULL,
                amount REAL NOT NULL,
                UNIQUE (user_id, month_key)
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteBudgetStore {
    type ReturnType = Budget;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let user_id = UserID::new(row.get(offset + 1)?);

        let raw_month_key: String = row.get(offset + 2)?;
        let month_key = raw_month_key.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                offset + 2,
                Type::Text,
                Box::new(error),
            )
        })?;

        let amount = row.get(offset + 3)?;

        Ok(Budget::new(id, user_id, month_key, amount))
    }
}
