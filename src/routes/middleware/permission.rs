use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::Request,
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::{auth::Claims, error::AppError, services::ServiceContext, state::AppState};

/// Authenticates the caller and requires `permission` on their role.
#[derive(Clone)]
pub struct RequirePermissionLayer {
    state: Arc<AppState>,
    permission: &'static str,
}

impl RequirePermissionLayer {
    pub fn new(state: &Arc<AppState>, permission: &'static str) -> Self {
        Self {
            state: Arc::clone(state),
            permission,
        }
    }
}

/// Guards every handler of `route` with `permission`.
pub fn require_permission(
    route: MethodRouter<Arc<AppState>>,
    state: &Arc<AppState>,
    permission: &'static str,
) -> MethodRouter<Arc<AppState>> {
    route.route_layer(RequirePermissionLayer::new(state, permission))
}

#[derive(Clone)]
pub struct RequirePermission<S> {
    inner: S,
    state: Arc<AppState>,
    permission: &'static str,
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermission<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermission {
            inner,
            state: Arc::clone(&self.state),
            permission: self.permission,
        }
    }
}

async fn authorize(
    parts: &mut axum::http::request::Parts,
    state: &Arc<AppState>,
    permission: &str,
) -> Result<(), AppError> {
    let claims = Claims::from_request_parts(parts, state).await?;
    ServiceContext::from_state(state)
        .role()
        .authorize(claims.user_id()?, permission)
        .await
}

impl<S> Service<Request<Body>> for RequirePermission<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let permission = self.permission;
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            if let Err(err) = authorize(&mut parts, &state, permission).await {
                tracing::debug!(permission, error = %err, "permission check failed");
                return Ok(err.into_response());
            }
            inner.call(Request::from_parts(parts, body)).await
        })
    }
}
