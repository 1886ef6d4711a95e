mod guards;
mod permission;

pub use guards::{AuthGuard, AuthRoleGuard};
pub use permission::{RequirePermission, RequirePermissionLayer, require_permission};
