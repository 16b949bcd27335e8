//! Storage abstraction and implementations for seatdraft.
//!
//! This crate provides a trait-based store interface over the shared
//! versioned snapshot, with JSON-file and SQLite implementations plus an
//! in-memory store for tests and demos.

#![warn(missing_docs)]

pub mod trait_;

#[cfg(feature = "json")]
pub mod json_store;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use trait_::{Result, Store, StoreError};

#[cfg(feature = "json")]
pub use json_store::JsonStore;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
