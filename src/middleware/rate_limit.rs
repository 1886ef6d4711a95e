use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::{config::SecurityConfig, error::AppError, state::AppState};

use super::client_ip;

const STRICT_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
];
/// Past this many tracked keys, idle entries are swept on the next check.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
    blocked_until: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_in: Duration,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
    },
}

/// Fixed-window counter per key; overrunning the window blocks the key for
/// `block` before it may count again.
#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    block: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration, block: Duration) -> Self {
        Self {
            limit,
            window,
            block,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().await;
        if windows.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, state| {
                state.blocked_until.is_some_and(|until| until > now)
                    || now.duration_since(state.started) < window
            });
        }

        let state = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
            blocked_until: None,
        });

        if let Some(until) = state.blocked_until {
            if until > now {
                return RateDecision::Limited {
                    limit: self.limit,
                    retry_after: until - now,
                };
            }
            state.blocked_until = None;
            state.count = 0;
            state.started = now;
        }
        if now.duration_since(state.started) >= self.window {
            state.count = 0;
            state.started = now;
        }

        state.count += 1;
        if state.count > self.limit {
            state.blocked_until = Some(now + self.block);
            return RateDecision::Limited {
                limit: self.limit,
                retry_after: self.block,
            };
        }

        RateDecision::Allowed {
            limit: self.limit,
            remaining: self.limit - state.count,
            reset_in: self.window.saturating_sub(now.duration_since(state.started)),
        }
    }
}

/// The general limiter guards every route; auth endpoints use the strict one.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: RateLimiter,
    pub strict: RateLimiter,
}

impl RateLimiters {
    pub fn from_config(cfg: &SecurityConfig) -> Self {
        let (limit, window, block) = cfg.general_window();
        let general = RateLimiter::new(limit, window, block);
        let (limit, window, block) = cfg.strict_window();
        let strict = RateLimiter::new(limit, window, block);
        Self { general, strict }
    }

    fn for_path(&self, path: &str) -> &RateLimiter {
        let path = path.trim_end_matches('/');
        if STRICT_PATHS.contains(&path) {
            &self.strict
        } else {
            &self.general
        }
    }
}

fn reset_stamp(after: Duration) -> HeaderValue {
    let at = Utc::now() + chrono::Duration::from_std(after).unwrap_or_default();
    HeaderValue::from_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|_| HeaderValue::from_static("0"))
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_in: Duration) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("x-ratelimit-reset", reset_stamp(reset_in));
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if !state.config.security.rate_limit_enabled {
        return next.run(req).await;
    }

    let key = client_ip(
        req.headers(),
        req.extensions().get::<ConnectInfo<SocketAddr>>(),
    );
    let limiter = state.rate_limiters.for_path(req.uri().path());

    match limiter.check(&key).await {
        RateDecision::Allowed {
            limit,
            remaining,
            reset_in,
        } => {
            let mut response = next.run(req).await;
            set_limit_headers(response.headers_mut(), limit, remaining, reset_in);
            response
        }
        RateDecision::Limited { limit, retry_after } => {
            let secs = retry_after.as_secs().max(1);
            tracing::warn!(client = %key, retry_after = secs, "rate limit exceeded");
            let mut response = AppError::too_many_requests("Too Many Requests", secs).into_response();
            set_limit_headers(response.headers_mut(), limit, 0, retry_after);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{RateDecision, RateLimiter, RateLimiters};
    use crate::config::SecurityConfig;

    #[tokio::test]
    async fn counts_down_then_blocks() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), Duration::from_secs(900));
        let now = Instant::now();

        assert!(matches!(
            limiter.check_at("1.2.3.4", now).await,
            RateDecision::Allowed { remaining: 1, .. }
        ));
        assert!(matches!(
            limiter.check_at("1.2.3.4", now).await,
            RateDecision::Allowed { remaining: 0, .. }
        ));
        assert_eq!(
            limiter.check_at("1.2.3.4", now).await,
            RateDecision::Limited {
                limit: 2,
                retry_after: Duration::from_secs(900)
            }
        );
        assert!(matches!(
            limiter.check_at("5.6.7.8", now).await,
            RateDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn block_outlasts_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), Duration::from_secs(900));
        let start = Instant::now();
        limiter.check_at("ip", start).await;
        limiter.check_at("ip", start).await;

        let later = start + Duration::from_secs(120);
        assert!(matches!(
            limiter.check_at("ip", later).await,
            RateDecision::Limited { .. }
        ));

        let after_block = start + Duration::from_secs(901);
        assert!(matches!(
            limiter.check_at("ip", after_block).await,
            RateDecision::Allowed { remaining: 0, .. }
        ));
    }

    #[tokio::test]
    async fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), Duration::from_secs(900));
        let start = Instant::now();
        limiter.check_at("ip", start).await;

        assert!(matches!(
            limiter.check_at("ip", start + Duration::from_secs(61)).await,
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn auth_endpoints_use_the_strict_limiter() {
        let limiters = RateLimiters::from_config(&SecurityConfig::default());
        assert!(std::ptr::eq(
            limiters.for_path("/api/auth/login"),
            &limiters.strict
        ));
        assert!(std::ptr::eq(
            limiters.for_path("/api/posts"),
            &limiters.general
        ));
    }
}
