mod client_ip;
mod cors;
mod csrf;
mod json_error;
mod panic;
mod rate_limit;

pub use client_ip::{ClientIp, client_ip};
pub use cors::cors_layer;
pub use csrf::{CSRF_COOKIE, CSRF_HEADER, csrf_middleware, new_csrf_token};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;
pub use rate_limit::{RateDecision, RateLimiter, RateLimiters, rate_limit_middleware};
