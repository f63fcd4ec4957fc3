//! Rate limiting middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

use crate::web::error::ApiError;

/// Per-IP rate limiter using Governor.
pub type IpRateLimiter = DefaultKeyedRateLimiter<String>;

/// State for rate limiting.
pub struct RateLimitState {
    /// Signup and login.
    auth_limiter: IpRateLimiter,
    /// Everything else under `/api`.
    api_limiter: IpRateLimiter,
    auth_rate_limit: u32,
    api_rate_limit: u32,
    /// Read the client address from proxy headers instead of the socket.
    trust_proxy_headers: bool,
}

fn per_minute(requests_per_minute: u32) -> IpRateLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));
    RateLimiter::keyed(quota)
}

impl RateLimitState {
    /// Create a new rate limit state. Limits are requests per minute per IP.
    pub fn new(auth_rate_limit: u32, api_rate_limit: u32) -> Self {
        Self {
            auth_limiter: per_minute(auth_rate_limit),
            api_limiter: per_minute(api_rate_limit),
            auth_rate_limit,
            api_rate_limit,
            trust_proxy_headers: false,
        }
    }

    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn check_auth(&self, ip: &str) -> bool {
        self.auth_limiter.check_key(&ip.to_string()).is_ok()
    }

    pub fn check_api(&self, ip: &str) -> bool {
        self.api_limiter.check_key(&ip.to_string()).is_ok()
    }

    /// Drop state for clients whose buckets have refilled.
    pub fn cleanup(&self) {
        self.auth_limiter.retain_recent();
        self.api_limiter.retain_recent();
        self.auth_limiter.shrink_to_fit();
        self.api_limiter.shrink_to_fit();
    }

    /// Start a background task to periodically clean up old entries.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await; // Every 5 minutes
                self.cleanup();
            }
        });
    }
}

/// Extract client IP from request.
///
/// Proxy headers are client-controlled unless a proxy rewrites them, so they
/// are only read when `trust_proxy_headers` is set.
fn get_client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = proxy_client_ip(req) {
            return ip;
        }
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn proxy_client_ip(req: &Request<Body>) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        let ip = forwarded.split(',').next().unwrap_or_default().trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    req.headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rate limiting middleware for signup and login.
pub async fn auth_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy_headers);

    if !state.check_auth(&ip) {
        tracing::warn!(ip = %ip, limit = state.auth_rate_limit, "Auth rate limit exceeded");
        return ApiError::rate_limited().into_response();
    }

    next.run(req).await
}

/// Rate limiting middleware for general API.
pub async fn api_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req, state.trust_proxy_headers);

    if !state.check_api(&ip) {
        tracing::warn!(ip = %ip, limit = state.api_rate_limit, "API rate limit exceeded");
        return ApiError::rate_limited().into_response();
    }

    next.run(req).await
}
