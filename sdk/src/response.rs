//! `{"detail": ...}` responses and normalization of errors coming back from RPC calls.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::payload_text;

/// Exception type name a remote service uses to report a validation failure.
pub const RPC_VALIDATION_EXCEPTION: &str = "RPCValidationException";

/// Detail returned to clients when a remote call failed for any other reason.
pub const INTERNAL_SERVER_ERROR_DETAIL: &str = "Erreur interne du serveur";

/// An HTTP error rendered as `{"detail": ...}`.
#[derive(Debug, Clone, Error)]
#[error("{status}: {}", payload_text(.detail))]
pub struct DetailError {
    pub status: StatusCode,
    pub detail: Value,
}

impl DetailError {
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<Value>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn bad_request(detail: impl Into<Value>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    #[must_use]
    pub fn unauthorized(detail: impl Into<Value>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_DETAIL)
    }
}

impl IntoResponse for DetailError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Error reported by a remote service over RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("remote {exc_type}: {}", payload_text(.value))]
pub struct RemoteError {
    pub exc_type: String,
    pub value: Value,
}

impl RemoteError {
    #[must_use]
    pub fn new(exc_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            exc_type: exc_type.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.exc_type == RPC_VALIDATION_EXCEPTION
    }
}

/// Validation failures surface to the caller as 400 with the remote value;
/// everything else is hidden behind a generic 500.
impl From<RemoteError> for DetailError {
    fn from(err: RemoteError) -> Self {
        if err.is_validation() {
            Self::bad_request(err.value)
        } else {
            tracing::error!(exc_type = %err.exc_type, value = %err.value, "Remote call failed");
            Self::internal()
        }
    }
}

impl IntoResponse for RemoteError {
    fn into_response(self) -> Response {
        DetailError::from(self).into_response()
    }
}

/// Raised by a service to reject its RPC input.
#[derive(Debug, Clone, Error)]
#[error("rpc validation failed: {}", payload_text(.0))]
pub struct RpcValidationError(pub Value);

impl From<RpcValidationError> for RemoteError {
    fn from(err: RpcValidationError) -> Self {
        Self::new(RPC_VALIDATION_EXCEPTION, err.0)
    }
}
