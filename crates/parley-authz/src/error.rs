use std::borrow::Cow;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The closed set of decision failures.
///
/// A kind is chosen where the failure is first observed and is never
/// rewritten by callers further up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Denied,
    Unauthenticated,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::NotFound => "not-found",
            Self::Denied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure.
///
/// `message` is safe to show to callers. `origin` names the call site and
/// `cause` keeps the underlying error; neither leaves the process.
#[derive(Debug, Error)]
#[error("{kind}: {message} (at {origin})")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: Cow<'static, str>,
    pub origin: &'static str,
    #[source]
    pub cause: Option<BoxError>,
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error(transparent)]
    Failure(#[from] Failure),

    /// The request's cancellation token fired. Passed through unmapped.
    #[error("request cancelled")]
    Cancelled,

    /// The request's deadline elapsed. Passed through unmapped.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, AuthzError>;

pub(crate) const MSG_INVALID_UUID: &str = "invalid uuid";
pub(crate) const MSG_MISSING_FIELD: &str = "missing field";
pub(crate) const MSG_NOT_FOUND: &str = "resource not found";
pub(crate) const MSG_DENIED: &str = "unauthorized";
pub(crate) const MSG_UNAUTHENTICATED: &str = "missing/invalid token";
pub(crate) const MSG_INTERNAL: &str = "internal server error";

impl AuthzError {
    fn failure(
        kind: ErrorKind,
        origin: &'static str,
        message: impl Into<Cow<'static, str>>,
        cause: Option<BoxError>,
    ) -> Self {
        Self::Failure(Failure {
            kind,
            message: message.into(),
            origin,
            cause,
        })
    }

    pub fn invalid_argument(origin: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::failure(ErrorKind::InvalidArgument, origin, message, None)
    }

    pub fn invalid_uuid(origin: &'static str, cause: uuid::Error) -> Self {
        Self::failure(
            ErrorKind::InvalidArgument,
            origin,
            MSG_INVALID_UUID,
            Some(Box::new(cause)),
        )
    }

    pub fn missing_field(origin: &'static str) -> Self {
        Self::invalid_argument(origin, MSG_MISSING_FIELD)
    }

    pub fn not_found(origin: &'static str) -> Self {
        Self::failure(ErrorKind::NotFound, origin, MSG_NOT_FOUND, None)
    }

    pub fn denied(origin: &'static str) -> Self {
        Self::failure(ErrorKind::Denied, origin, MSG_DENIED, None)
    }

    pub fn unauthenticated(origin: &'static str) -> Self {
        Self::failure(ErrorKind::Unauthenticated, origin, MSG_UNAUTHENTICATED, None)
    }

    pub fn internal(origin: &'static str, cause: impl Into<BoxError>) -> Self {
        Self::failure(ErrorKind::Internal, origin, MSG_INTERNAL, Some(cause.into()))
    }

    /// The decision kind, or `None` for cancellation and deadline expiry.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure(f) => Some(f.kind),
            Self::Cancelled | Self::DeadlineExceeded => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.kind() == Some(ErrorKind::Denied)
    }

    pub fn origin(&self) -> Option<&'static str> {
        match self {
            Self::Failure(f) => Some(f.origin),
            Self::Cancelled | Self::DeadlineExceeded => None,
        }
    }

    /// Render the full cause chain for logs.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
