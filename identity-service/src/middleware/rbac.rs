//! Route-level role checks.
//!
//! Each protected route declares the roles allowed to call it. The check runs
//! after [`auth_middleware`](super::auth_middleware), so a request without
//! valid claims never gets here on a protected route.

use service_core::axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::services::{authorization, SessionClaims};

/// (method, route pattern, roles allowed). Routes not listed require no role.
pub const ROUTE_PERMISSIONS: &[(&str, &str, &[Role])] = &[("POST", "/auth/invite", &[Role::SuperAdmin, Role::OrgAdmin])];

/// Roles declared for a route; empty when the route declares none.
pub fn required_roles(method: &Method, path: &str) -> &'static [Role] {
    ROUTE_PERMISSIONS
        .iter()
        .find(|(m, p, _)| *m == method.as_str() && *p == path)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

pub async fn rbac_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let required = required_roles(req.method(), &path);
    if required.is_empty() {
        return Ok(next.run(req).await);
    }

    let Some(claims) = req.extensions().get::<SessionClaims>() else {
        return Err(AppError::Unauthorized(anyhow::anyhow!("Authentication required")));
    };

    if let Err(e) = authorization::authorize(required, claims.role) {
        tracing::warn!(account_id = %claims.sub, role = %claims.role, path = %path, "Access denied");
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_requires_admin_roles() {
        let roles = required_roles(&Method::POST, "/auth/invite");
        assert!(roles.contains(&Role::SuperAdmin));
        assert!(roles.contains(&Role::OrgAdmin));
        assert!(!roles.contains(&Role::Employee));
    }

    #[test]
    fn unlisted_routes_require_nothing() {
        assert!(required_roles(&Method::POST, "/auth/login").is_empty());
        assert!(required_roles(&Method::GET, "/auth/invite").is_empty());
    }
}
