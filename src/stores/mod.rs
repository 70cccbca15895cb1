//! Describes traits for storing and retrieving the domain models, decoupling
//! the rest of the application from the underlying database.

pub use budget::BudgetStore;
pub use transaction::TransactionStore;
pub use user::UserStore;

mod budget;
mod transaction;
mod user;

pub mod sqlite;
