//! SQLite-backed store for cache generations.
//!
//! This module provides the persistent key-value blob store behind the
//! router, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named generations holding request-keyed responses
//! - Atomic shell population (all entries or none)
//! - Cascading deletion of a generation's entries
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use generations::EntryMeta;
pub use store::CacheStorage;
