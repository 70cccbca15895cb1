//! Monthly budget reporting.
//!
//! A budget report compares a month's spending limit against the expenses
//! recorded in that month, and grades the result into an alert level that the
//! client can surface directly.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{MonthKey, TransactionKind, UserID},
    stores::{BudgetStore, TransactionStore},
};

/// The fraction of the budget at which spending starts to warn.
const WARNING_THRESHOLD: f64 = 0.8;

/// How urgently a month's spending needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// No budget has been set for the month.
    None,
    /// Spending is comfortably within the budget.
    Safe,
    /// Spending has reached 80% of the budget.
    Warning,
    /// Spending has reached or passed the budget.
    Danger,
}

/// A month's budget compared against the expenses recorded in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    /// The month the report covers.
    pub month_key: MonthKey,
    /// The spending limit for the month. Zero if none has been set.
    pub amount: f64,
    /// The sum of the month's expenses. Recurring templates are not counted.
    pub spent: f64,
    /// How much of the budget is left. Negative when overspent.
    pub remaining: f64,
    /// Whether spending has gone strictly past a non-zero budget.
    pub exceeded: bool,
    /// A grading of `spent` against `amount`.
    pub alert_level: AlertLevel,
}

/// Build the budget report for a user's given month.
///
/// A month without a budget reports an amount of zero and an alert level of
/// [AlertLevel::None], whatever was spent.
pub fn report<T, B>(
    transactions: &T,
    budgets: &B,
    user_id: UserID,
    month_key: MonthKey,
) -> Result<BudgetReport, Error>
where
    T: TransactionStore,
    B: BudgetStore,
{
    let amount = budgets
        .get(user_id, month_key)?
        .map(|budget| budget.amount())
        .unwrap_or(0.0);

    let spent = transactions.sum_in_range(
        user_id,
        TransactionKind::Expense,
        month_key.first_day(),
        month_key.next().first_day(),
    )?;

    let alert_level = if amount <= 0.0 {
        AlertLevel::None
    } else if spent >= amount {
        AlertLevel::Danger
    } else if spent >= WARNING_THRESHOLD * amount {
        AlertLevel::Warning
    } else {
        AlertLevel::Safe
    };

    Ok(BudgetReport {
        month_key,
        amount,
        spent,
        remaining: amount - spent,
        exceeded: amount > 0.0 && spent > amount,
        alert_level,
    })
}

/// A user's all-time totals together with one month's budget standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// The sum of all income transactions.
    pub total_income: f64,
    /// The sum of all expense transactions.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The spending limit for the month. Zero if none has been set.
    pub budget_amount: f64,
    /// The sum of the month's expenses.
    pub monthly_expense: f64,
    /// How much of the month's budget is left. Negative when overspent.
    pub budget_remaining: f64,
    /// Whether the month's spending has gone strictly past a non-zero
    /// budget.
    pub budget_exceeded: bool,
}

/// Total up a user's income and expenses across all their transactions, and
/// their budget standing for the given month.
///
/// Recurring templates are not counted.
pub fn summary<T, B>(
    transactions: &T,
    budgets: &B,
    user_id: UserID,
    month_key: MonthKey,
) -> Result<Summary, Error>
where
    T: TransactionStore,
    B: BudgetStore,
{
    let total_income = transactions.sum(user_id, TransactionKind::Income)?;
    let total_expense = transactions.sum(user_id, TransactionKind::Expense)?;
    let budget = report(transactions, budgets, user_id, month_key)?;

    Ok(Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        budget_amount: budget.amount,
        monthly_expense: budget.spent,
        budget_remaining: budget.remaining,
        budget_exceeded: budget.exceeded,
    })
}
