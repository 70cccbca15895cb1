use crate::{
    Error,
    models::{Budget, MonthKey, UserID},
};

/// Handles the creation and retrieval of monthly budgets.
pub trait BudgetStore: Send + Sync {
    /// Get the user's budget for the given month, if one has been set.
    fn get(&self, user_id: UserID, month_key: MonthKey) -> Result<Option<Budget>, Error>;

    /// Set the user's budget for the given month, replacing the previous
    /// amount if one was already set.
    ///
    /// # Errors
    /// Returns [Error::NegativeBudgetAmount] if `amount` is negative or not a
    /// number.
    fn upsert(&self, user_id: UserID, month_key: MonthKey, amount: f64) -> Result<Budget, Error>;
}
