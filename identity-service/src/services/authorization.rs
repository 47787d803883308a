//! Role-based access decision for protected routes.

use crate::models::Role;
use crate::services::error::ServiceError;

/// Allow when the route declares no required roles or the caller holds one of them.
pub fn allow(required: &[Role], caller: Role) -> bool {
    required.is_empty() || required.contains(&caller)
}

pub fn authorize(required: &[Role], caller: Role) -> Result<(), ServiceError> {
    if allow(required, caller) {
        Ok(())
    } else {
        Err(ServiceError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMINS: &[Role] = &[Role::SuperAdmin, Role::OrgAdmin];

    #[test]
    fn employee_is_denied_admin_route() {
        assert!(!allow(ADMINS, Role::Employee));
        assert!(matches!(
            authorize(ADMINS, Role::Independent),
            Err(ServiceError::InsufficientPermissions)
        ));
    }

    #[test]
    fn admins_are_allowed() {
        assert!(allow(ADMINS, Role::SuperAdmin));
        assert!(allow(ADMINS, Role::OrgAdmin));
    }

    #[test]
    fn empty_requirement_allows_everyone() {
        for role in [Role::SuperAdmin, Role::OrgAdmin, Role::Employee, Role::Independent] {
            assert!(allow(&[], role));
        }
    }
}
