//! Role model - the fixed RBAC role set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Account role. Serialized as `SUPER_ADMIN`, `ORG_ADMIN`, `EMPLOYEE`,
/// `INDEPENDENT`; `TENANT_ADMIN` is accepted as an alias of `ORG_ADMIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    #[serde(alias = "TENANT_ADMIN")]
    OrgAdmin,
    Employee,
    Independent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::OrgAdmin => "ORG_ADMIN",
            Role::Employee => "EMPLOYEE",
            Role::Independent => "INDEPENDENT",
        }
    }

    /// Roles an inviter holding `self` may hand out.
    pub fn can_grant(&self, role: Role) -> bool {
        match self {
            Role::SuperAdmin => true,
            Role::OrgAdmin => role != Role::SuperAdmin,
            Role::Employee | Role::Independent => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ORG_ADMIN" | "TENANT_ADMIN" => Ok(Role::OrgAdmin),
            "EMPLOYEE" => Ok(Role::Employee),
            "INDEPENDENT" => Ok(Role::Independent),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_storage_code() {
        for role in [Role::SuperAdmin, Role::OrgAdmin, Role::Employee, Role::Independent] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn tenant_admin_is_an_alias() {
        assert_eq!("TENANT_ADMIN".parse::<Role>().unwrap(), Role::OrgAdmin);
        let role: Role = serde_json::from_str("\"TENANT_ADMIN\"").unwrap();
        assert_eq!(role, Role::OrgAdmin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"ORG_ADMIN\"");
    }

    #[test]
    fn org_admin_cannot_grant_super_admin() {
        assert!(Role::SuperAdmin.can_grant(Role::SuperAdmin));
        assert!(Role::OrgAdmin.can_grant(Role::Employee));
        assert!(!Role::OrgAdmin.can_grant(Role::SuperAdmin));
        assert!(!Role::Employee.can_grant(Role::Employee));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("ADMIN".parse::<Role>().is_err());
    }
}
