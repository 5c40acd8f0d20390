//! Rate limiting middleware using Governor.
//!
//! Per-caller token buckets, keyed by the hash of the presented API key so
//! raw keys never sit in memory.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{num::NonZeroU32, sync::Arc, time::Duration};

use super::auth::extract_api_key;

const ANONYMOUS: &str = "anonymous";

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    limiters: DashMap<String, Arc<Limiter>>,
    quota: Quota,
    period: Duration,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::per_minute(100)
    }
}

impl RateLimiterState {
    /// Allows `requests` per caller per `period`, all of them as one burst.
    ///
    /// Zero values are raised to one.
    pub fn new(requests: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let period = period.max(Duration::from_millis(1));
        let replenish = period / burst.get();
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            limiters: DashMap::new(),
            quota,
            period,
        }
    }

    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }

    /// Returns true if the caller identified by `key` may proceed.
    pub fn check(&self, key: &str) -> bool {
        let limiter = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        limiter.check().is_ok()
    }

    fn retry_after_seconds(&self) -> u64 {
        self.period.as_secs().max(1)
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let key = extract_api_key(
        request
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok()),
    )
    .filter(|k| !k.is_empty())
    .map(pix_repo::security::hash_api_key)
    .unwrap_or_else(|| ANONYMOUS.to_string());

    if !limiter.check(&key) {
        let retry_after = limiter.retry_after_seconds();
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded. Please try again later.",
                "retry_after_seconds": retry_after
            })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_limited() {
        let state = RateLimiterState::per_minute(2);

        assert!(state.check("a"));
        assert!(state.check("a"));
        assert!(!state.check("a"));
    }

    #[test]
    fn test_keys_are_isolated() {
        let state = RateLimiterState::per_minute(1);

        assert!(state.check("a"));
        assert!(!state.check("a"));
        assert!(state.check("b"));
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let state = RateLimiterState::per_minute(0);

        assert!(state.check("a"));
        assert!(!state.check("a"));
    }
}
