//! Authentication error types.

use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid key set document: {0}")]
    InvalidKeySet(String),

    #[error("No signing key matches kid {}", .kid.as_deref().unwrap_or("<none>"))]
    KeyNotFound { kid: Option<String> },

    #[error("Key index {index} out of range ({len} keys published)")]
    KeyIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid public key: {0}")]
    InvalidKey(String),

    #[error("Invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    #[must_use]
    pub fn is_invalid_audience(&self) -> bool {
        matches!(self, Self::Jwt(e) if matches!(e.kind(), ErrorKind::InvalidAudience))
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Jwt(e) if matches!(e.kind(), ErrorKind::ExpiredSignature))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AuthError::KeyNotFound {
            kid: Some("key-1".into()),
        };
        assert_eq!(err.to_string(), "No signing key matches kid key-1");

        let err = AuthError::KeyNotFound { kid: None };
        assert_eq!(err.to_string(), "No signing key matches kid <none>");

        let err = AuthError::KeyIndexOutOfRange { index: 2, len: 1 };
        assert_eq!(err.to_string(), "Key index 2 out of range (1 keys published)");
    }

    #[test]
    fn jwt_error_kinds() {
        let err: AuthError = jsonwebtoken::errors::Error::from(ErrorKind::InvalidAudience).into();
        assert!(err.is_invalid_audience());
        assert!(!err.is_expired());

        let err: AuthError = jsonwebtoken::errors::Error::from(ErrorKind::ExpiredSignature).into();
        assert!(err.is_expired());
    }
}
