use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, Row, types::Type};
use time::Date;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{
        Recurrence, Transaction, TransactionBuilder, TransactionID, TransactionKind, UserID,
    },
    stores::TransactionStore,
};

/// The transaction table columns in the order they are defined.
const COLUMNS: &str =
    "id, user_id, title, amount, kind, category, date, is_template, recurrence, next_due, \
     generated_from";

/// Creates and retrieves transactions and recurring templates from a SQLite
/// database.
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Create a new store that uses the given database connection.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SqliteTransactionStore {
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO \"transaction\" \
             (user_id, title, amount, kind, category, date, is_template, recurrence, next_due, \
              generated_from) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, ?9)",
            (
                builder.user_id.as_i64(),
                &builder.title,
                builder.amount,
                builder.kind.as_str(),
                &builder.category,
                builder.date,
                builder.is_template(),
                builder.recurrence.map(Recurrence::as_str),
                builder.generated_from,
            ),
        )?;

        let id = connection.last_insert_rowid();
        let is_template = builder.is_template();

        Ok(Transaction::new_unchecked(
            id,
            builder.user_id,
            builder.title,
            builder.amount,
            builder.kind,
            builder.category,
            builder.date,
            is_template,
            builder.recurrence,
            None,
            builder.generated_from,
        ))
    }

    fn get(&self, id: TransactionID) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = ?1"
            ))?
            .query_row([id], SqliteTransactionStore::map_row)?;

        Ok(transaction)
    }

    fn get_for_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(&format!(
            "SELECT {COLUMNS} FROM \"transaction\" WHERE user_id = ?1 \
             ORDER BY date DESC, id DESC"
        ))?;

        let transactions = statement
            .query_map([user_id.as_i64()], SqliteTransactionStore::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn get_templates(&self, user_id: UserID) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(&format!(
            "SELECT {COLUMNS} FROM \"transaction\" \
             WHERE user_id = ?1 AND is_template = 1 ORDER BY id ASC"
        ))?;

        let templates = statement
            .query_map([user_id.as_i64()], SqliteTransactionStore::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(templates)
    }

    fn delete(&self, id: TransactionID, user_id: UserID) -> Result<(), Error> {
        let rows_deleted = self.connection.lock().unwrap().execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )?;

        if rows_deleted == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    fn sum(&self, user_id: UserID, kind: TransactionKind) -> Result<f64, Error> {
        let total = self.connection.lock().unwrap().query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" \
             WHERE user_id = ?1 AND kind = ?2 AND is_template = 0",
            (user_id.as_i64(), kind.as_str()),
            |row| row.get(0),
        )?;

        Ok(total)
    }

    fn sum_in_range(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        start: Date,
        end: Date,
    ) -> Result<f64, Error> {
        let total = self.connection.lock().unwrap().query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\" \
             WHERE user_id = ?1 AND kind = ?2 AND is_template = 0 \
             AND date >= ?3 AND date < ?4",
            (user_id.as_i64(), kind.as_str(), start, end),
            |row| row.get(0),
        )?;

        Ok(total)
    }

    fn claim_next_due(
        &self,
        template_id: TransactionID,
        user_id: UserID,
        previous: Option<Date>,
        next: Date,
    ) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();

        // `IS` rather than `=` so an unset cursor (NULL) can be claimed too.
        let rows_updated = connection.execute(
            "UPDATE \"transaction\" SET next_due = ?1 \
             WHERE id = ?2 AND user_id = ?3 AND is_template = 1 AND next_due IS ?4",
            (next, template_id, user_id.as_i64(), previous),
        )?;

        if rows_updated == 1 {
            return Ok(());
        }

        let template_exists = connection.query_row(
            "SELECT EXISTS (SELECT 1 FROM \"transaction\" \
             WHERE id = ?1 AND user_id = ?2 AND is_template = 1)",
            (template_id, user_id.as_i64()),
            |row| row.get(0),
        )?;

        if template_exists {
            Err(Error::CursorConflict)
        } else {
            Err(Error::NotFound)
        }
    }
}

impl CreateTable for SqliteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                is_template INTEGER NOT NULL DEFAULT 0,
                recurrence TEXT,
                next_due TEXT,
                generated_from INTEGER REFERENCES \"transaction\"(id) ON DELETE SET NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let id = row.get(offset)?;
        let user_id = UserID::new(row.get(offset + 1)?);
        let title = row.get(offset + 2)?;
        let amount = row.get(offset + 3)?;

        let raw_kind: String = row.get(offset + 4)?;
        let kind = TransactionKind::from_str(&raw_kind).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(offset + 4, Type::Text, Box::new(error))
        })?;

        let category = row.get(offset + 5)?;
        let date = row.get(offset + 6)?;
        let is_template = row.get(offset + 7)?;

        // An unrecognised recurrence maps to `None` so the template is skipped
        // rather than making every read of the table fail.
        let recurrence = row
            .get::<_, Option<String>>(offset + 8)?
            .and_then(|text| Recurrence::from_str(&text).ok());

        let next_due = row.get(offset + 9)?;
        let generated_from = row.get(offset + 10)?;

        Ok(Transaction::new_unchecked(
            id,
            user_id,
            title,
            amount,
            kind,
            category,
            date,
            is_template,
            recurrence,
            next_due,
            generated_from,
        ))
    }
}
