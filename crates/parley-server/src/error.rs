use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use parley_authz::{AuthzError, Code, Status};

/// A failed request, rendered as `{error, code, request_id}`.
///
/// Only the status code and caller-safe message leave the process.
#[derive(Debug, Error)]
#[error("{}: {}", .status.code.as_str(), .status.message)]
pub struct ServerError {
    pub status: Status,
    pub request_id: String,
}

impl ServerError {
    pub fn from_authz(err: &AuthzError, request_id: &str) -> Self {
        Self {
            status: Status::from(err),
            request_id: request_id.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>, request_id: &str) -> Self {
        Self {
            status: Status {
                code: Code::InvalidArgument,
                message: message.into(),
            },
            request_id: request_id.to_string(),
        }
    }
}

/// HTTP status for a decision status code. 499 is the de facto "client
/// closed request" code.
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Cancelled => {
            StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
        }
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: Code,
    request_id: &'a str,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.status.message,
            code: self.status.code,
            request_id: &self.request_id,
        };
        (http_status(self.status.code), axum::Json(body)).into_response()
    }
}
