//! MyEM Auth
//!
//! Verification of RS256 tokens against keys published as a JWKS document.
//!
//! Two entry points exist, matching the two ways services receive tokens:
//!
//! - [`TokenDecoder`] takes a raw `Authorization` header value, selects the
//!   key by the token `kid` and reports failures as [`myem_sdk::HttpError`].
//! - [`ActiveUserResolver`] takes a bearer token, uses a fixed key of the set
//!   and reports failures as `{"detail": ...}` errors. [`require_active_user`]
//!   wires it into an axum router.

mod active_user;
mod claims;
mod decoder;
mod error;
mod jwks;
mod middleware;

#[cfg(feature = "testutil")]
pub mod testutil;

pub use active_user::{ActiveUserResolver, DEFAULT_AUDIENCE, INVALID_KEY, UNAUTHORIZED};
pub use claims::Claims;
pub use decoder::{TokenDecoder, INVALID_TOKEN, MISSING_HEADER};
pub use error::{AuthError, Result};
pub use jwks::JwksClient;
pub use middleware::{require_active_user, ActiveUser, NOT_AUTHENTICATED};
