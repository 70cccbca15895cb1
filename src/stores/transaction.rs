use time::Date;

use crate::{
    Error,
    models::{Transaction, TransactionBuilder, TransactionID, TransactionKind, UserID},
};

/// Handles the creation and retrieval of transactions and recurring
/// templates.
pub trait TransactionStore: Send + Sync {
    /// Create a new transaction from a builder and store it.
    fn insert(&self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve the transaction with the given ID.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no such transaction.
    fn get(&self, id: TransactionID) -> Result<Transaction, Error>;

    /// Retrieve all of a user's transactions, templates included, most recent
    /// first.
    fn get_for_user(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a user's recurring templates.
    fn get_templates(&self, user_id: UserID) -> Result<Vec<Transaction>, Error>;

    /// Delete the transaction with the given ID if it belongs to `user_id`.
    ///
    /// Deleting a template leaves its generated transactions in place with
    /// their template reference cleared.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if the transaction does not exist or belongs
    /// to another user.
    fn delete(&self, id: TransactionID, user_id: UserID) -> Result<(), Error>;

    /// Sum a user's non-template transactions of the given kind.
    fn sum(&self, user_id: UserID, kind: TransactionKind) -> Result<f64, Error>;

    /// Sum a user's non-template transactions of the given kind with dates in
    /// the half-open range `[start, end)`.
    fn sum_in_range(
        &self,
        user_id: UserID,
        kind: TransactionKind,
        start: Date,
        end: Date,
    ) -> Result<f64, Error>;

    /// Advance a template's due-date cursor from `previous` to `next`, but
    /// only if the stored cursor still equals `previous`.
    ///
    /// This is a compare-and-swap: a template is claimed for generation by
    /// advancing its cursor first, so two overlapping syncs cannot both stamp
    /// transactions from the same template.
    ///
    /// # Errors
    /// Returns [Error::CursorConflict] if the stored cursor no longer equals
    /// `previous`, and [Error::NotFound] if the template does not exist or
    /// belongs to another user.
    fn claim_next_due(
        &self,
        template_id: TransactionID,
        user_id: UserID,
        previous: Option<Date>,
        next: Date,
    ) -> Result<(), Error>;
}
