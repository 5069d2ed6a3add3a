use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors raised by service handlers that map onto a fixed HTTP status.
///
/// The payload is the first argument the error was raised with: usually a
/// message, sometimes a structured object. It is returned verbatim under the
/// `errors` key of the response body.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("not found: {}", payload_text(.0))]
    NotFound(Value),

    #[error("bad request: {}", payload_text(.0))]
    BadRequest(Value),

    #[error("not authenticated: {}", payload_text(.0))]
    Unauthenticated(Value),

    #[error("not authorized: {}", payload_text(.0))]
    Unauthorized(Value),
}

impl HttpError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthenticated(_) => "NOT_AUTHENTICATED",
            Self::Unauthorized(_) => "NOT_AUTHORIZED",
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Unauthenticated(_) => 403,
            Self::Unauthorized(_) => 401,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            Self::NotFound(v) | Self::BadRequest(v) | Self::Unauthenticated(v) | Self::Unauthorized(v) => v,
        }
    }

    #[must_use]
    pub fn not_found(payload: impl Into<Value>) -> Self {
        Self::NotFound(payload.into())
    }

    #[must_use]
    pub fn bad_request(payload: impl Into<Value>) -> Self {
        Self::BadRequest(payload.into())
    }

    #[must_use]
    pub fn unauthenticated(payload: impl Into<Value>) -> Self {
        Self::Unauthenticated(payload.into())
    }

    #[must_use]
    pub fn unauthorized(payload: impl Into<Value>) -> Self {
        Self::Unauthorized(payload.into())
    }

    /// JSON body sent to the client.
    #[must_use]
    pub fn body(&self) -> Value {
        json!({ "errors": self.payload() })
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

pub(crate) fn payload_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(HttpError::not_found("x").status_code(), 404);
        assert_eq!(HttpError::bad_request("x").status_code(), 400);
        assert_eq!(HttpError::unauthenticated("x").status_code(), 403);
        assert_eq!(HttpError::unauthorized("x").status_code(), 401);
    }

    #[test]
    fn error_codes() {
        assert_eq!(HttpError::not_found("x").error_code(), "NOT_FOUND");
        assert_eq!(HttpError::bad_request("x").error_code(), "BAD_REQUEST");
        assert_eq!(HttpError::unauthenticated("x").error_code(), "NOT_AUTHENTICATED");
        assert_eq!(HttpError::unauthorized("x").error_code(), "NOT_AUTHORIZED");
    }

    #[test]
    fn display_uses_plain_message() {
        let err = HttpError::unauthenticated("Token not valid !");
        assert_eq!(err.to_string(), "not authenticated: Token not valid !");

        let err = HttpError::bad_request(json!({"field": "missing"}));
        assert_eq!(err.to_string(), r#"bad request: {"field":"missing"}"#);
    }

    #[test]
    fn body_wraps_payload() {
        let err = HttpError::not_found(json!({"meter": "unknown guid"}));
        assert_eq!(err.body(), json!({"errors": {"meter": "unknown guid"}}));
    }

    #[tokio::test]
    async fn into_response_sets_status_and_json() {
        let response = HttpError::unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"errors": "nope"}));
    }
}
