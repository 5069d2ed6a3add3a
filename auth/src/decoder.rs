//! Decoding of `Authorization` header values into verified claims.

use jsonwebtoken::DecodingKey;
use myem_sdk::HttpError;

use crate::claims::{decode_claims, Claims};
use crate::error::Result;
use crate::jwks::JwksClient;

pub const MISSING_HEADER: &str = "Authorization header missed";
pub const INVALID_TOKEN: &str = "Token not valid !";

/// Verifies `<scheme> <token>` header values against the signing keys of a JWKS URL.
///
/// The scheme word itself is not checked.
#[derive(Debug, Clone)]
pub struct TokenDecoder {
    jwks: JwksClient,
}

impl TokenDecoder {
    pub fn new(jwks: JwksClient) -> Self {
        Self { jwks }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Ok(Self::new(JwksClient::new(url)?))
    }

    /// Signing key matching the `kid` of `token`.
    ///
    /// # Errors
    ///
    /// Any failure to resolve the key is [`HttpError::Unauthenticated`].
    pub async fn get_public_key(&self, token: &str) -> std::result::Result<DecodingKey, HttpError> {
        self.jwks.signing_key_from_jwt(token).await.map_err(|e| {
            tracing::debug!(error = %e, url = %self.jwks.url(), "Signing key lookup failed");
            HttpError::unauthenticated(INVALID_TOKEN)
        })
    }

    /// Verify the token in an `Authorization` header value and return its claims.
    ///
    /// # Errors
    ///
    /// [`HttpError::BadRequest`] when the value is not exactly two
    /// whitespace-separated words, [`HttpError::Unauthenticated`] when the
    /// token does not verify.
    pub async fn decode_jwt_token(
        &self,
        authorization: &str,
    ) -> std::result::Result<Claims, HttpError> {
        let token = match authorization.split_whitespace().collect::<Vec<_>>().as_slice() {
            [_scheme, token] => *token,
            _ => return Err(HttpError::bad_request(MISSING_HEADER)),
        };

        let key = self.get_public_key(token).await?;
        decode_claims(token, &key, None).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            HttpError::unauthenticated(INVALID_TOKEN)
        })
    }
}
