//! Axum middleware guarding routes behind a bearer token.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use myem_sdk::DetailError;

use crate::active_user::ActiveUserResolver;
use crate::claims::Claims;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Claims of the caller, inserted into request extensions by
/// [`require_active_user`].
#[derive(Debug, Clone)]
pub struct ActiveUser(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for ActiveUser {
    type Rejection = DetailError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| DetailError::unauthorized(NOT_AUTHENTICATED))
    }
}

/// Reject requests without a valid `Authorization: Bearer <token>` header.
pub async fn require_active_user(
    State(resolver): State<Arc<ActiveUserResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        let mut response = DetailError::unauthorized(NOT_AUTHENTICATED).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return response;
    };

    match resolver.get_active_user(&token).await {
        Ok(claims) => {
            request.extensions_mut().insert(ActiveUser(claims));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).as_deref(), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")).as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
