//! # parley-store
//!
//! SQLite persistence for Parley appservers.
//!
//! [`Database`] wraps a single `rusqlite::Connection`, runs migrations on
//! open and provides typed CRUD helpers for every entity. [`SqliteStorage`]
//! adapts it to the authorization engine's [`parley_authz::Storage`] port.

pub mod channels;
pub mod database;
pub mod grants;
pub mod migrations;
pub mod port;
pub mod roles;
pub mod servers;
pub mod subscriptions;
pub mod users;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
pub use port::SqliteStorage;
