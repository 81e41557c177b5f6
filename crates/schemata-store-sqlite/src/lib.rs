//! SQLite backend for the Schemata record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod ledger;
mod schema;
mod store;

pub mod error;
pub mod retry;

pub use error::{Error, Result};
pub use retry::RetryPolicy;
pub use store::SqliteStore;
