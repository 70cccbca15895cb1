//! SQLite implementations of the store traits.
//!
//! Each store shares a single [rusqlite::Connection] behind an `Arc<Mutex>`,
//! so they can be cloned into the router state cheaply.

pub use budget::SqliteBudgetStore;
pub use transaction::SqliteTransactionStore;
pub use user::SqliteUserStore;

mod budget;
mod transaction;
mod user;
