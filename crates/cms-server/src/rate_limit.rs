//! Sliding-window limiter for the public lead endpoint.
//!
//! Keyed by client IP. State lives in process memory, so limits reset on
//! restart and are not shared between replicas.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tokio::sync::RwLock;

/// Key used when a request carries no client address headers.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            limit,
            window,
        }
    }

    /// Record a request for `key`. Returns `false` when the window is full;
    /// rejected requests are not recorded.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut requests = self.requests.write().await;
        let window = self.window;

        // Drop keys whose whole history has aged out.
        requests.retain(|_, times| {
            times.retain(|&t| now.saturating_duration_since(t) < window);
            !times.is_empty()
        });

        let times = requests.entry(key.to_string()).or_default();
        if times.len() >= self.limit {
            return false;
        }

        times.push(now);
        true
    }

    pub async fn tracked_keys(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Client address as reported by the proxy in front of the CMS: the
/// first `X-Forwarded-For` entry, else `X-Real-IP`.
///
/// The headers are trusted as sent. The CMS must run behind a proxy that
/// overwrites them; otherwise a client can pick its own rate-limit key.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter() -> RateLimiter {
        RateLimiter::new(5, Duration::from_secs(900))
    }

    #[tokio::test]
    async fn test_sixth_request_is_rejected() {
        let limiter = limiter();
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(i)).await);
        }
        assert!(!limiter.check_at("10.0.0.1", start + Duration::from_secs(10)).await);
    }

    #[tokio::test]
    async fn test_other_ips_are_unaffected() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("10.0.0.1", start).await);
        }
        assert!(!limiter.check_at("10.0.0.1", start).await);
        assert!(limiter.check_at("10.0.0.2", start).await);
    }

    #[tokio::test]
    async fn test_requests_age_out() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at("10.0.0.1", start).await);
        }
        assert!(!limiter.check_at("10.0.0.1", start + Duration::from_secs(899)).await);
        assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(900)).await);
    }

    #[tokio::test]
    async fn test_stale_keys_are_dropped() {
        let limiter = limiter();
        let start = Instant::now();

        assert!(limiter.check_at("10.0.0.1", start).await);
        assert!(limiter.check_at("10.0.0.2", start + Duration::from_secs(1000)).await);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.1.1.1"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.1.1.1"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }
}
