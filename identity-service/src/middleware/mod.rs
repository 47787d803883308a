pub mod auth;
pub mod rbac;

pub use auth::{auth_middleware, AuthUser};
pub use rbac::{rbac_middleware, required_roles, ROUTE_PERMISSIONS};
