//! Core types and trait definitions for the Schemata record store.
//!
//! This crate has no HTTP or database dependencies. Backends implement
//! [`store::RecordStore`]; the API layer consumes it.

// Backends implement the trait with `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod store;
pub mod version;

pub use error::{Classify, Error, ErrorKind, Result};
