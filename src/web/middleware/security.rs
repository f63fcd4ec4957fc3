//! Security headers middleware.

use axum::{
    body::Body,
    http::{
        header::{self, HeaderName, HeaderValue},
        Request,
    },
    middleware::Next,
    response::Response,
};

/// Headers set on every response, overwriting handler values.
const FIXED_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Default when the handler did not choose a caching policy.
const DEFAULT_CACHE_CONTROL: &str = "no-store, max-age=0";

/// Add the fixed security headers plus a default `Cache-Control`.
///
/// Strict-Transport-Security belongs at the TLS-terminating proxy.
pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in FIXED_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static(DEFAULT_CACHE_CONTROL));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, response::IntoResponse, routing::get, Router};
    use tower::util::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "OK" }))
            .route(
                "/cached",
                get(|| async { ([(header::CACHE_CONTROL, "private, max-age=60")], "cached").into_response() }),
            )
            .route(
                "/framed",
                get(|| async { ([(header::X_FRAME_OPTIONS, "SAMEORIGIN")], "framed").into_response() }),
            )
            .layer(middleware::from_fn(security_headers))
    }

    async fn get_headers(uri: &str) -> axum::http::HeaderMap {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.headers().clone()
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let headers = get_headers("/").await;

        for (name, value) in FIXED_HEADERS {
            assert_eq!(headers.get(&name).unwrap(), value, "{name}");
        }
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), DEFAULT_CACHE_CONTROL);
    }

    #[tokio::test]
    async fn test_existing_cache_control_kept() {
        let headers = get_headers("/cached").await;
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "private, max-age=60"
        );
    }

    #[tokio::test]
    async fn test_frame_options_overridden() {
        let headers = get_headers("/framed").await;
        assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    }
}
