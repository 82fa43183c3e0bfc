//! Per-request values handed from the transport to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{AuthzError, Result};

/// Claims of an already verified bearer token.
///
/// `user_id` stays a string here: the engine validates it so that a
/// malformed id is reported as an invalid argument rather than a denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub iss: String,
    pub aud: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// The scope a decision is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AuthScope {
    #[default]
    Unscoped,
    Server {
        server_id: Uuid,
    },
    Channel {
        channel_id: Uuid,
    },
}

impl AuthScope {
    /// Build a scope from raw transport fields.
    ///
    /// At most one of the two ids may be set.
    pub fn from_parts(server_id: Option<&str>, channel_id: Option<&str>) -> Result<Self> {
        let server_id = server_id.map(str::trim).filter(|s| !s.is_empty());
        let channel_id = channel_id.map(str::trim).filter(|s| !s.is_empty());

        match (server_id, channel_id) {
            (None, None) => Ok(Self::Unscoped),
            (Some(raw), None) => Uuid::parse_str(raw)
                .map(|server_id| Self::Server { server_id })
                .map_err(|e| AuthzError::invalid_uuid("scope.server_id", e)),
            (None, Some(raw)) => Uuid::parse_str(raw)
                .map(|channel_id| Self::Channel { channel_id })
                .map_err(|e| AuthzError::invalid_uuid("scope.channel_id", e)),
            (Some(_), Some(_)) => Err(AuthzError::invalid_argument(
                "scope.conflict",
                "conflicting scope",
            )),
        }
    }
}

/// Everything the engine knows about the request besides the decision
/// inputs themselves.
#[derive(Debug, Clone)]
pub struct RequestContext {
    claims: Option<Claims>,
    request_id: String,
    scope: AuthScope,
    deadline: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// Create a context, generating a request id when none is supplied.
    pub fn new(request_id: Option<String>) -> Self {
        let request_id = request_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            claims: None,
            request_id,
            scope: AuthScope::Unscoped,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn with_scope(mut self, scope: AuthScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn scope(&self) -> AuthScope {
        self.scope
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
