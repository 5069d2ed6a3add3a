//! Client for JSON Web Key Set documents published over HTTP.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{DecodingKey, EncodingKey};
use moka::future::Cache;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{BigUint, RsaPrivateKey};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AuthError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LIFESPAN: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct KeySetDocument {
    keys: Vec<Value>,
}

/// Fetches and caches the key set found at one URL.
///
/// Keys are kept as raw JSON and only turned into [`DecodingKey`]s on lookup,
/// so one malformed entry does not hide the others.
#[derive(Clone)]
pub struct JwksClient {
    url: String,
    client: reqwest::Client,
    cache: Cache<String, Arc<Vec<Value>>>,
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksClient").field("url", &self.url).finish()
    }
}

impl JwksClient {
    /// # Errors
    ///
    /// Returns [`AuthError::Fetch`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_lifespan(url, DEFAULT_LIFESPAN)
    }

    /// Like [`new`](Self::new), keeping fetched documents for `lifespan`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Fetch`] if the HTTP client cannot be built.
    pub fn with_lifespan(url: impl Into<String>, lifespan: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            client,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(lifespan)
                .build(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Published keys, from cache when still fresh.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be fetched or has no `keys` array.
    pub async fn keys(&self) -> Result<Arc<Vec<Value>>> {
        if let Some(keys) = self.cache.get(&self.url).await {
            return Ok(keys);
        }
        self.refresh().await
    }

    /// Fetch the document again, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be fetched or has no `keys` array.
    pub async fn refresh(&self) -> Result<Arc<Vec<Value>>> {
        tracing::debug!(url = %self.url, "Fetching key set");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let document: KeySetDocument =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidKeySet(e.to_string()))?;

        let keys = Arc::new(document.keys);
        self.cache.insert(self.url.clone(), keys.clone()).await;
        Ok(keys)
    }

    /// Key at `index` in the published list.
    ///
    /// # Errors
    ///
    /// Fails when the set cannot be fetched, the index is out of range, or the
    /// entry is not a usable key.
    pub async fn key_at(&self, index: usize) -> Result<DecodingKey> {
        let keys = self.keys().await?;
        let raw = keys.get(index).ok_or(AuthError::KeyIndexOutOfRange {
            index,
            len: keys.len(),
        })?;
        decoding_key(raw)
    }

    /// Private RSA key at `index`, for sets that publish the private
    /// components (`d`, `p`, `q`).
    ///
    /// # Errors
    ///
    /// Fails when the set cannot be fetched, the index is out of range, or the
    /// entry is not a complete RSA private key.
    pub async fn private_key_at(&self, index: usize) -> Result<EncodingKey> {
        let keys = self.keys().await?;
        let raw = keys.get(index).ok_or(AuthError::KeyIndexOutOfRange {
            index,
            len: keys.len(),
        })?;
        encoding_key(raw)
    }

    /// Key whose `kid` matches the header of `token`.
    ///
    /// An unknown `kid` triggers one refetch before giving up, in case the
    /// keys were rotated since the document was cached.
    ///
    /// # Errors
    ///
    /// Fails when the token header is unreadable, the set cannot be fetched,
    /// or no signing key matches.
    pub async fn signing_key_from_jwt(&self, token: &str) -> Result<DecodingKey> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid;

        let keys = self.keys().await?;
        if let Some(raw) = find_signing_key(&keys, kid.as_deref()) {
            return decoding_key(raw);
        }

        tracing::debug!(kid = ?kid, "Signing key not cached, refreshing key set");
        let keys = self.refresh().await?;
        find_signing_key(&keys, kid.as_deref())
            .ok_or(AuthError::KeyNotFound { kid })
            .and_then(decoding_key)
    }
}

fn is_signing_key(raw: &Value) -> bool {
    raw.get("use")
        .and_then(Value::as_str)
        .map_or(true, |usage| usage == "sig")
}

fn find_signing_key<'a>(keys: &'a [Value], kid: Option<&str>) -> Option<&'a Value> {
    let signing: Vec<&Value> = keys.iter().filter(|raw| is_signing_key(raw)).collect();
    let key_id = |raw: &Value| raw.get("kid").and_then(Value::as_str).map(str::to_owned);

    match kid {
        Some(kid) => signing
            .into_iter()
            .find(|raw| key_id(raw).as_deref() == Some(kid)),
        None => match signing.as_slice() {
            [only] => Some(*only),
            many => many.iter().copied().find(|raw| key_id(raw).is_none()),
        },
    }
}

fn decoding_key(raw: &Value) -> Result<DecodingKey> {
    let jwk: Jwk =
        serde_json::from_value(raw.clone()).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

fn encoding_key(raw: &Value) -> Result<EncodingKey> {
    if raw.get("kty").and_then(Value::as_str) != Some("RSA") {
        return Err(AuthError::InvalidKey("not an RSA key".into()));
    }
    let component = |name: &str| -> Result<BigUint> {
        let encoded = raw
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::InvalidKey(format!("missing `{name}` component")))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| AuthError::InvalidKey(format!("`{name}`: {e}")))?;
        Ok(BigUint::from_bytes_be(&bytes))
    };

    let key = RsaPrivateKey::from_components(
        component("n")?,
        component("e")?,
        component("d")?,
        vec![component("p")?, component("q")?],
    )
    .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    key.validate()
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

    let der = key
        .to_pkcs1_der()
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    Ok(EncodingKey::from_rsa_der(der.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(kid: Option<&str>, usage: Option<&str>) -> Value {
        let mut raw = json!({"kty": "RSA", "n": "AQAB", "e": "AQAB"});
        if let Some(kid) = kid {
            raw["kid"] = json!(kid);
        }
        if let Some(usage) = usage {
            raw["use"] = json!(usage);
        }
        raw
    }

    #[test]
    fn finds_key_by_kid() {
        let keys = vec![key(Some("a"), None), key(Some("b"), Some("sig"))];
        let found = find_signing_key(&keys, Some("b")).unwrap();
        assert_eq!(found["kid"], "b");
        assert!(find_signing_key(&keys, Some("c")).is_none());
    }

    #[test]
    fn encryption_keys_are_skipped() {
        let keys = vec![key(Some("a"), Some("enc"))];
        assert!(find_signing_key(&keys, Some("a")).is_none());
    }

    #[test]
    fn missing_kid_uses_the_only_key() {
        let keys = vec![key(Some("a"), None)];
        assert_eq!(find_signing_key(&keys, None).unwrap()["kid"], "a");
    }

    #[test]
    fn missing_kid_among_many_needs_an_anonymous_key() {
        let keys = vec![key(Some("a"), None), key(Some("b"), None)];
        assert!(find_signing_key(&keys, None).is_none());

        let keys = vec![key(Some("a"), None), key(None, None)];
        assert!(find_signing_key(&keys, None).unwrap().get("kid").is_none());
    }

    #[test]
    fn non_rsa_entry_is_invalid_key() {
        let err = decoding_key(&json!({"kty": "nope"})).err().unwrap();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn public_entry_is_not_a_private_key() {
        let err = encoding_key(&key(Some("a"), Some("sig"))).err().unwrap();
        assert!(matches!(err, AuthError::InvalidKey(ref msg) if msg == "missing `d` component"));

        let err = encoding_key(&json!({"kty": "oct", "k": "c2VjcmV0"})).err().unwrap();
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn mismatched_components_are_rejected() {
        let raw = json!({"kty": "RSA", "n": "AQAB", "e": "AQAB", "d": "Aw", "p": "Bw", "q": "Cw"});
        assert!(matches!(encoding_key(&raw), Err(AuthError::InvalidKey(_))));
    }
}
