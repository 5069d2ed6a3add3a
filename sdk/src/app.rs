use axum::Router;
use tower_http::cors::CorsLayer;

/// Apply the settings every MyEM HTTP service shares.
///
/// CORS is fully open: any origin, method and header, with credentials. The
/// request origin is mirrored back since browsers reject a wildcard origin
/// on credentialed requests.
pub fn init_app<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(CorsLayer::very_permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn preflight_mirrors_origin() {
        let app = init_app(Router::new().route("/ping", get(|| async { "pong" })));

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, "https://app.myem.fr")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.myem.fr"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }
}
