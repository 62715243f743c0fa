//! # dacguard store
//!
//! Storage abstraction for dacguard state.
//!
//! ## Design
//!
//! The [`Store`] trait is synchronous. Every method is one atomic step
//! against the backing state; the access-control engines compose these
//! steps and never hold a lock across calls.
//!
//! ## Implementations
//!
//! - [`SqliteStore`]: persistent storage using bundled SQLite
//! - [`MemoryStore`]: in-memory storage for tests and demos

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
