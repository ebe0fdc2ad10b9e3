//! Fixed-window rate limiter middleware.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;
use tokio::time::Instant;

use pdfdesk_core::config::RateLimitConfig;
use pdfdesk_core::error::AppError;

use crate::error::ApiError;

/// Body message of a rejected request.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Clean up expired windows once the map holds this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

/// In-memory fixed-window request counter per client key.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Client key → window state.
    windows: Arc<Mutex<HashMap<String, Window>>>,
    /// Requests allowed per window.
    max_requests: u32,
    /// Window length.
    window: Duration,
    /// When false every request passes.
    enabled: bool,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
            enabled: true,
        }
    }

    /// Limiter configured from `[server.rate_limit]`.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limiter = Self::new(
            config.max_requests,
            Duration::from_secs(config.window_minutes.saturating_mul(60)),
        );
        limiter.enabled = config.enabled;
        limiter
    }

    /// Counts a request for `key`; false once the window's budget is spent.
    pub async fn check(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        if windows.len() >= PRUNE_THRESHOLD {
            let length = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < length);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count < self.max_requests {
            window.count += 1;
            true
        } else {
            false
        }
    }
}

/// Client key: the peer address, or the first `X-Forwarded-For` hop when
/// the server is not given connection info.
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects requests over budget with 429.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let key = client_key(&request);
    if !limiter.check(&key).await {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return ApiError(AppError::rate_limited(RATE_LIMIT_MESSAGE)).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_window_budget_and_reset() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4").await);
        assert!(limiter.check("1.2.3.4").await);
        assert!(!limiter.check("1.2.3.4").await);
        // Other clients have their own window.
        assert!(limiter.check("5.6.7.8").await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("1.2.3.4").await);
    }

    #[tokio::test]
    async fn test_disabled_limiter_allows_everything() {
        let limiter = RateLimiter::from_config(&RateLimitConfig {
            enabled: false,
            window_minutes: 15,
            max_requests: 0,
        });
        for _ in 0..5 {
            assert!(limiter.check("a").await);
        }
    }

    #[test]
    fn test_client_key_prefers_forwarded_for_without_connect_info() {
        let request = Request::builder()
            .header("x-forwarded-for", "9.9.9.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "9.9.9.9");
    }
}
