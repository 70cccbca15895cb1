//! This file defines the type `Transaction`, the core type of the application.
//!
//! A transaction records a single income or expense event. When flagged as a
//! recurring template it is never counted as money moving; instead it acts as
//! a pattern that the [recurrence engine](crate::recurrence) stamps concrete
//! transactions from.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    models::{TransactionID, UserID},
};

/// The category label given to transactions created without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// An error returned when parsing a string into a [TransactionKind] fails.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0} is not a valid transaction kind")]
pub struct ParseKindError(String);

/// Whether a transaction records money earned or money spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. wages.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The canonical string form used in storage and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// An error returned when parsing a string into a [Recurrence] fails.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0} is not a valid recurrence")]
pub struct ParseRecurrenceError(String);

/// How often a recurring template generates a new transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Every 7 calendar days.
    Weekly,
    /// Every calendar month of variable length.
    Monthly,
    /// Every calendar year.
    Yearly,
}

impl Recurrence {
    /// The canonical string form used in storage and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "yearly" => Ok(Recurrence::Yearly),
            other => Err(ParseRecurrenceError(other.to_string())),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned,
/// or a recurring template for such events.
///
/// To create a new `Transaction`, use [Transaction::build] and finalise the
/// builder with [TransactionStore::insert](crate::stores::TransactionStore::insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionID,
    user_id: UserID,
    title: String,
    amount: f64,
    kind: TransactionKind,
    category: String,
    date: Date,
    is_template: bool,
    recurrence: Option<Recurrence>,
    next_due: Option<Date>,
    generated_from: Option<TransactionID>,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [TransactionBuilder::new] for discoverability.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if `title` is empty or whitespace,
    /// - [Error::NonPositiveAmount] if `amount` is not greater than zero.
    pub fn build(
        title: &str,
        amount: f64,
        kind: TransactionKind,
        user_id: UserID,
    ) -> Result<TransactionBuilder, Error> {
        TransactionBuilder::new(title, amount, kind, user_id)
    }

    /// Create a transaction from its parts without validation.
    ///
    /// This is intended for use by store implementations mapping database rows
    /// back into the domain type. The caller should ensure the parts uphold
    /// the model invariants.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if an invariant is violated it will cause incorrect behaviour but not
    /// affect memory safety.
    #[allow(clippy::too_many_arguments)]
    pub fn new_unchecked(
        id: TransactionID,
        user_id: UserID,
        title: String,
        amount: f64,
        kind: TransactionKind,
        category: String,
        date: Date,
        is_template: bool,
        recurrence: Option<Recurrence>,
        next_due: Option<Date>,
        generated_from: Option<TransactionID>,
    ) -> Self {
        Self {
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
        }
    }

    /// The ID of the transaction.
    pub fn id(&self) -> TransactionID {
        self.id
    }

    /// The ID of the user that owns this transaction.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// A short description of what the transaction was for.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The amount of money spent or earned in this transaction.
    ///
    /// Always positive; see [Transaction::kind] for the direction.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Whether this transaction is income or an expense.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// A free-text label that groups related transactions.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// When the transaction happened. For templates, the start of the
    /// recurring schedule.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Whether this record is a recurring template rather than real spending.
    pub fn is_template(&self) -> bool {
        self.is_template
    }

    /// How often this template recurs. `None` for ordinary transactions, and
    /// for templates whose stored recurrence could not be understood.
    pub fn recurrence(&self) -> Option<Recurrence> {
        self.recurrence
    }

    /// The next date this template is due to generate an occurrence.
    ///
    /// `None` for ordinary transactions and for templates that have not been
    /// synced yet.
    pub fn next_due(&self) -> Option<Date> {
        self.next_due
    }

    /// The template that generated this transaction, if any.
    pub fn generated_from(&self) -> Option<TransactionID> {
        self.generated_from
    }
}

/// Builder for creating a new [Transaction].
///
/// The builder is finalised by passing it to
/// [TransactionStore::insert](crate::stores::TransactionStore::insert).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    pub(crate) user_id: UserID,
    pub(crate) title: String,
    pub(crate) amount: f64,
    pub(crate) kind: TransactionKind,
    pub(crate) category: String,
    pub(crate) date: Date,
    pub(crate) recurrence: Option<Recurrence>,
    pub(crate) generated_from: Option<TransactionID>,
}

impl TransactionBuilder {
    /// Create a builder for a new transaction.
    ///
    /// The date defaults to today (UTC) and the category to
    /// [DEFAULT_CATEGORY].
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTitle] if `title` is empty or whitespace,
    /// - [Error::NonPositiveAmount] if `amount` is not greater than zero.
    pub fn new(
        title: &str,
        amount: f64,
        kind: TransactionKind,
        user_id: UserID,
    ) -> Result<Self, Error> {
        let title = title.trim();

        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }

        // The comparison is written this way so that NaN is also rejected.
        if !(amount > 0.0) {
            return Err(Error::NonPositiveAmount);
        }

        Ok(Self {
            user_id,
            title: title.to_string(),
            amount,
            kind,
            category: DEFAULT_CATEGORY.to_string(),
            date: OffsetDateTime::now_utc().date(),
            recurrence: None,
            generated_from: None,
        })
    }

    /// Set the category for the transaction.
    ///
    /// An empty or whitespace category keeps the default.
    pub fn category(mut self, category: &str) -> Self {
        let category = category.trim();

        if !category.is_empty() {
            self.category = category.to_string();
        }

        self
    }

    /// Set the effective date for the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Mark the transaction as a recurring template with the given
    /// recurrence.
    ///
    /// Templates are never counted as spending or income; the recurrence
    /// engine stamps concrete transactions from them. The template's cursor
    /// (`next_due`) is left unset and is initialised by the first sync.
    pub fn recurring(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Record the template this transaction was generated from.
    pub fn generated_from(mut self, template_id: TransactionID) -> Self {
        self.generated_from = Some(template_id);
        self
    }

    /// Whether the built transaction will be a recurring template.
    pub fn is_template(&self) -> bool {
        self.recurrence.is_some()
    }
}
