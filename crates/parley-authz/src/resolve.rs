//! Target and scope resolution.
//!
//! The loader is generic over the object class, so every authorizer gets
//! the same classification of lookup failures without interpreting storage
//! errors itself.

use std::future::Future;

use tracing::debug;
use uuid::Uuid;

use parley_shared::models::{Server, ServerScoped};

use crate::context::AuthScope;
use crate::error::{AuthzError, Result};
use crate::session::Session;
use crate::storage::{StorageError, StorageResult};

/// Parse a transport-supplied id.
pub fn parse_id(origin: &'static str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|e| AuthzError::invalid_uuid(origin, e))
}

/// Parse an optional object id. Absent, empty and nil ids all mean "no
/// target".
pub fn parse_object_id(raw: Option<&str>) -> Result<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => {
            let id = parse_id("resolve.object_id", raw)?;
            Ok((!id.is_nil()).then_some(id))
        }
    }
}

/// The server (and optionally channel) named by the request's auth scope,
/// confirmed to exist.
#[derive(Debug, Clone)]
pub struct ResolvedScope {
    pub server: Server,
    pub channel_id: Option<Uuid>,
}

impl ResolvedScope {
    pub fn server_id(&self) -> Uuid {
        self.server.id
    }
}

impl<'a> Session<'a> {
    /// Resolve the auth scope to an existing server.
    ///
    /// `Ok(None)` means the request carried no scope.
    pub async fn resolve_scope(&self) -> Result<Option<ResolvedScope>> {
        match self.ctx().scope() {
            AuthScope::Unscoped => Ok(None),
            AuthScope::Server { server_id } => {
                let server = self.load_server(server_id).await?;
                Ok(Some(ResolvedScope {
                    server,
                    channel_id: None,
                }))
            }
            AuthScope::Channel { channel_id } => {
                let channel = self
                    .load_object(channel_id, None, |id| self.storage().get_channel_by_id(id))
                    .await?;
                let server = self.load_server(channel.server_id).await?;
                Ok(Some(ResolvedScope {
                    server,
                    channel_id: Some(channel_id),
                }))
            }
        }
    }

    /// Load one object by id.
    ///
    /// With `scope` set, an object living in a different server is reported
    /// as not-found so that callers cannot probe other servers.
    pub async fn load_object<T, F, Fut>(
        &self,
        id: Uuid,
        scope: Option<&ResolvedScope>,
        fetch: F,
    ) -> Result<T>
    where
        T: ServerScoped,
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let object = match self.guard(fetch(id)).await? {
            Ok(object) => object,
            Err(StorageError::NotFound) => return Err(AuthzError::not_found("resolve.load_object")),
            Err(e) => return Err(AuthzError::internal("resolve.load_object", e)),
        };

        if let Some(scope) = scope {
            if object.server_id() != scope.server_id() {
                debug!(
                    object_id = %id,
                    object_server = %object.server_id(),
                    scope_server = %scope.server_id(),
                    "target outside auth scope"
                );
                return Err(AuthzError::not_found("resolve.scope_mismatch"));
            }
        }

        Ok(object)
    }

    /// Parse and load in one step.
    pub async fn resolve_object<T, F, Fut>(
        &self,
        raw_id: &str,
        scope: Option<&ResolvedScope>,
        fetch: F,
    ) -> Result<T>
    where
        T: ServerScoped,
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let id = parse_id("resolve.object_id", raw_id)?;
        self.load_object(id, scope, fetch).await
    }
}
