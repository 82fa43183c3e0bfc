//! Transport-neutral status for a failed decision.
//!
//! Adapters map [`Code`] onto their own status space (HTTP, RPC). The
//! message is the caller-safe text only; origins and causes stay in logs.

use serde::Serialize;

use crate::error::{AuthzError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Code {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    Internal,
    Cancelled,
    DeadlineExceeded,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::NotFound => "not-found",
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline-exceeded",
        }
    }
}

impl From<ErrorKind> for Code {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidArgument => Self::InvalidArgument,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Denied => Self::PermissionDenied,
            ErrorKind::Unauthenticated => Self::Unauthenticated,
            ErrorKind::Internal => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl From<&AuthzError> for Status {
    fn from(err: &AuthzError) -> Self {
        match err {
            AuthzError::Failure(failure) => Self {
                code: failure.kind.into(),
                message: failure.message.to_string(),
            },
            AuthzError::Cancelled => Self {
                code: Code::Cancelled,
                message: "request cancelled".into(),
            },
            AuthzError::DeadlineExceeded => Self {
                code: Code::DeadlineExceeded,
                message: "deadline exceeded".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_kind_and_safe_message() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "socket reset by db");
        let status = Status::from(&AuthzError::internal("predicates.owner", cause));
        assert_eq!(status.code, Code::Internal);
        assert_eq!(status.message, "internal server error");
    }

    #[test]
    fn denial_is_permission_denied() {
        let status = Status::from(&AuthzError::denied("policy.rule"));
        assert_eq!(status.code, Code::PermissionDenied);
        assert_eq!(status.message, "unauthorized");
    }

    #[test]
    fn interruptions_map_to_their_own_codes() {
        assert_eq!(Status::from(&AuthzError::Cancelled).code, Code::Cancelled);
        assert_eq!(
            Status::from(&AuthzError::DeadlineExceeded).code,
            Code::DeadlineExceeded
        );
    }

    #[test]
    fn code_serializes_kebab_case() {
        let json = serde_json::to_string(&Code::DeadlineExceeded).unwrap();
        assert_eq!(json, "\"deadline-exceeded\"");
    }
}
