pub mod api;
mod entry;
pub mod middleware;
pub mod multipart;

pub use crate::auth::{AdminRole, RequiredRole};
pub use crate::response::{ApiResult, JsonApiResponse};
pub use entry::{API_PREFIX, UPLOADS_PREFIX, router};
pub use middleware::{
    AuthGuard, AuthRoleGuard, RequirePermission, RequirePermissionLayer, require_permission,
};
