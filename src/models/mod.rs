//! This module defines the domain data types.

pub use budget::{Budget, MonthKey};
pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{
    DEFAULT_CATEGORY, Recurrence, Transaction, TransactionBuilder, TransactionKind,
};
pub use user::{User, UserID};

mod budget;
mod password;
mod transaction;
mod user;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;

/// Alias for database IDs referring to transactions and recurring templates.
pub type TransactionID = i64;
