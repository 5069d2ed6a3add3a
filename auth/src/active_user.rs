//! Resolution of the user behind a bearer token.

use jsonwebtoken::{DecodingKey, EncodingKey};
use myem_sdk::DetailError;

use crate::claims::{decode_claims, Claims};
use crate::error::Result;
use crate::jwks::JwksClient;

/// Audience stamped on tokens issued by the user service.
pub const DEFAULT_AUDIENCE: &str = "fastapi-users:auth";

pub const INVALID_KEY: &str = "Invalid Key";
pub const UNAUTHORIZED: &str = "unauthorized";

/// Verifies bearer tokens with one key of a JWKS document, picked by position.
#[derive(Debug, Clone)]
pub struct ActiveUserResolver {
    jwks: JwksClient,
    audience: String,
    index: usize,
}

impl ActiveUserResolver {
    pub fn new(jwks: JwksClient) -> Self {
        Self {
            jwks,
            audience: DEFAULT_AUDIENCE.to_string(),
            index: 0,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        Ok(Self::new(JwksClient::new(url)?))
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// The configured key of the published set.
    ///
    /// # Errors
    ///
    /// 400 `Invalid Key` when the set cannot be fetched or the key is unusable.
    pub async fn get_public_key(&self) -> std::result::Result<DecodingKey, DetailError> {
        self.jwks.key_at(self.index).await.map_err(|e| {
            tracing::warn!(error = %e, url = %self.jwks.url(), index = self.index, "Public key unavailable");
            DetailError::bad_request(INVALID_KEY)
        })
    }

    /// The configured key of the set as a signing key. Only sets publishing
    /// private components have one.
    ///
    /// # Errors
    ///
    /// 401 `unauthorized` when the set cannot be fetched or the entry is not a
    /// complete RSA private key.
    pub async fn get_private_key(&self) -> std::result::Result<EncodingKey, DetailError> {
        self.jwks.private_key_at(self.index).await.map_err(|e| {
            tracing::warn!(error = %e, url = %self.jwks.url(), index = self.index, "Private key unavailable");
            DetailError::unauthorized(UNAUTHORIZED)
        })
    }

    /// Verify `token` and return its claims.
    ///
    /// Tokens without an `aud` claim are accepted; tokens with one must carry
    /// the configured audience.
    ///
    /// # Errors
    ///
    /// 401 `unauthorized` on any failure, including a missing key.
    pub async fn get_active_user(&self, token: &str) -> std::result::Result<Claims, DetailError> {
        let key = self
            .get_public_key()
            .await
            .map_err(|_| DetailError::unauthorized(UNAUTHORIZED))?;

        let claims = match decode_claims(token, &key, None) {
            Err(e) if e.is_invalid_audience() => decode_claims(token, &key, Some(&self.audience)),
            other => other,
        };

        claims.map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            DetailError::unauthorized(UNAUTHORIZED)
        })
    }
}
