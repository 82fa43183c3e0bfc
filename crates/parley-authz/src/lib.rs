//! # parley-authz
//!
//! Permission decision engine for Parley appservers.
//!
//! Every mutating or listing RPC asks the [`Engine`] whether the caller may
//! perform an action on an object class (optionally a specific object). The
//! engine combines three permission sources:
//!
//! - **ownership** of the server the object lives in,
//! - **explicit grants** (`read_all` / `write_all` / `delete_all`),
//! - **role masks** aggregated over every role assigned to the caller.
//!
//! Persistence is reached only through the [`Storage`] port and time only
//! through the [`Clock`] port, so tests substitute both.

pub mod action;
pub mod authorizers;
pub mod clock;
pub mod context;
pub mod engine;
pub mod error;
pub mod policy;
pub mod predicates;
pub mod resolve;
pub mod session;
pub mod status;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use action::{Action, ActionFamily, Operation, SubAction};
pub use authorizers::Authorizer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{AuthScope, Claims, RequestContext};
pub use engine::{AuthzRequest, Engine};
pub use error::{AuthzError, ErrorKind, Result};
pub use status::{Code, Status};
pub use storage::{Storage, StorageError, StorageResult};
