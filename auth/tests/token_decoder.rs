use myem_auth::testutil::{generate_token, jwks_document, MockJwksServer, PRIMARY_KEY, SECONDARY_KEY};
use myem_auth::{JwksClient, TokenDecoder, INVALID_TOKEN, MISSING_HEADER};
use myem_sdk::HttpError;
use serde_json::json;

fn decoder_for(server: &MockJwksServer) -> TokenDecoder {
    TokenDecoder::from_url(server.url()).unwrap()
}

#[tokio::test]
async fn decodes_valid_token() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY, SECONDARY_KEY])).await;
    let decoder = decoder_for(&server);

    let authorization = generate_token(&json!({"id": 42, "email": "user@myem.fr"}));
    let claims = decoder.decode_jwt_token(&authorization).await.unwrap();

    assert_eq!(claims["id"], 42);
    assert_eq!(claims["email"], "user@myem.fr");
}

#[tokio::test]
async fn key_is_selected_by_kid() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY, SECONDARY_KEY])).await;
    let decoder = decoder_for(&server);

    let token = SECONDARY_KEY.sign(&json!({"id": 7}));
    let claims = decoder
        .decode_jwt_token(&format!("Bearer {token}"))
        .await
        .unwrap();
    assert_eq!(claims["id"], 7);
}

#[tokio::test]
async fn header_without_scheme_is_bad_request() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let token = PRIMARY_KEY.sign(&json!({"id": 1}));
    for header in [token.as_str(), "", "KEY a b"] {
        let err = decoder.decode_jwt_token(header).await.unwrap_err();
        assert!(matches!(err, HttpError::BadRequest(_)));
        assert_eq!(err.payload(), &json!(MISSING_HEADER));
        assert_eq!(err.status_code(), 400);
    }
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn unknown_kid_is_not_authenticated() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let token = SECONDARY_KEY.sign(&json!({"id": 1}));
    let err = decoder
        .decode_jwt_token(&format!("KEY {token}"))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Unauthenticated(_)));
    assert_eq!(err.payload(), &json!(INVALID_TOKEN));
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn signature_from_another_key_is_rejected() {
    // Publish the secondary modulus under the primary kid.
    let mut forged = PRIMARY_KEY.jwk();
    forged["n"] = json!(SECONDARY_KEY.modulus);
    let server = MockJwksServer::start(json!({"keys": [forged]})).await;
    let decoder = decoder_for(&server);

    let err = decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Unauthenticated(_)));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let now = jsonwebtoken::get_current_timestamp();
    for exp in [now - 3600, now - 30] {
        let err = decoder
            .decode_jwt_token(&generate_token(&json!({"id": 1, "exp": exp})))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Unauthenticated(_)));
    }
}

#[tokio::test]
async fn token_not_yet_valid_is_rejected() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let nbf = jsonwebtoken::get_current_timestamp() + 3600;
    let err = decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1, "nbf": nbf})))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Unauthenticated(_)));

    let nbf = jsonwebtoken::get_current_timestamp() - 60;
    let claims = decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1, "nbf": nbf})))
        .await
        .unwrap();
    assert_eq!(claims["id"], 1);
}

#[tokio::test]
async fn token_with_audience_is_rejected() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let err = decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1, "aud": ["fastapi-users:auth"]})))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Unauthenticated(_)));
}

#[tokio::test]
async fn unreachable_key_set_is_not_authenticated() {
    let decoder = TokenDecoder::from_url("http://127.0.0.1:1/jwks.json").unwrap();
    let err = decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Unauthenticated(_)));
}

#[tokio::test]
async fn key_set_is_cached() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = TokenDecoder::new(JwksClient::new(server.url()).unwrap());

    for id in 0..3 {
        decoder
            .decode_jwt_token(&generate_token(&json!({ "id": id })))
            .await
            .unwrap();
    }
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn unknown_kid_refreshes_once() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    decoder
        .decode_jwt_token(&generate_token(&json!({"id": 1})))
        .await
        .unwrap();
    let token = SECONDARY_KEY.sign(&json!({"id": 2}));
    assert!(decoder.decode_jwt_token(&format!("KEY {token}")).await.is_err());
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn token_without_kid_uses_single_key() {
    let server = MockJwksServer::start(jwks_document(&[PRIMARY_KEY])).await;
    let decoder = decoder_for(&server);

    let token = PRIMARY_KEY.sign_without_kid(&json!({"id": 3}));
    let claims = decoder
        .decode_jwt_token(&format!("KEY {token}"))
        .await
        .unwrap();
    assert_eq!(claims["id"], 3);
}
