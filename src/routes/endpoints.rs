//! The endpoints for the JSON API.

/// Create a new user account.
pub const REGISTER: &str = "/api/auth/register";
/// Exchange credentials for a bearer token.
pub const LOG_IN: &str = "/api/auth/login";
/// View or edit the signed-in user's account details.
pub const PROFILE: &str = "/api/profile";
/// Create or list the signed-in user's transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// Delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// All-time income and spending totals.
pub const SUMMARY: &str = "/api/transactions/summary";
/// Generate overdue transactions from recurring templates.
pub const GENERATE_RECURRING: &str = "/api/transactions/generate-recurring";
/// View or set the budget for the current month.
pub const BUDGET: &str = "/api/budget/current";
