//! RS256 claim decoding shared by the token decoder and the active user resolver.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::error::Result;

/// Decoded JWT payload.
pub type Claims = Map<String, Value>;

/// Decode `token` with `key`.
///
/// No claim is required. `exp` and `nbf` are checked when present, with no
/// leeway. Without an expected `audience`, a token carrying an `aud` claim is
/// rejected with `InvalidAudience`.
pub(crate) fn decode_claims(token: &str, key: &DecodingKey, audience: Option<&str>) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.required_spec_claims.clear();
    validation.validate_nbf = true;
    validation.leeway = 0;
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let claims = jsonwebtoken::decode::<Claims>(token, key, &validation)?.claims;
    if audience.is_none() && claims.contains_key("aud") {
        return Err(jsonwebtoken::errors::Error::from(ErrorKind::InvalidAudience).into());
    }
    Ok(claims)
}
