use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::SecurityConfig;

use super::CSRF_HEADER;

fn parse_origins(cfg: &SecurityConfig) -> Vec<HeaderValue> {
    cfg.cors_origin_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect()
}

/// Credentialed CORS for the configured origins; any origin is mirrored when
/// none are configured.
pub fn cors_layer(cfg: &SecurityConfig) -> CorsLayer {
    let origins = parse_origins(cfg);
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CSRF_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static(CSRF_HEADER),
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::{cors_layer, parse_origins};
    use crate::config::SecurityConfig;

    fn security(origins: &str) -> SecurityConfig {
        SecurityConfig {
            cors_origins: origins.to_string(),
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn skips_blank_origins() {
        let origins = parse_origins(&security("http://a.test, ,http://b.test"));
        assert_eq!(origins.len(), 2);
    }

    #[tokio::test]
    async fn preflight_echoes_allowed_origin() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(&security("http://a.test")));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/")
                    .header(header::ORIGIN, "http://a.test")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("http://a.test")
        );
    }
}
