//! # parley-shared
//!
//! Types shared by every Parley crate: the entity records read by the
//! authorization engine, the permission flag tables, and the object class
//! vocabulary used on the wire.

pub mod constants;
pub mod error;
pub mod models;
pub mod permissions;
pub mod types;

pub use error::SharedError;
pub use models::*;
pub use permissions::{PermissionMask, ServerFlags, SubFlags};
pub use types::ObjectClass;
