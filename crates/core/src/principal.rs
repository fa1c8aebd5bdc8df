//! The authenticated identity attached to a session.

use reelhouse_db::entities::admin::AdminRole;
use serde::{Deserialize, Serialize};

/// Who a principal is allowed to act as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A community member from the `users` table.
    #[serde(rename = "user")]
    User,
    /// A back-office moderator.
    #[serde(rename = "admin")]
    ContentModerator,
    #[serde(rename = "super_admin")]
    SuperAdmin,
}

impl Role {
    /// Staff may use the back office.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::ContentModerator | Self::SuperAdmin)
    }

    /// Only super admins may create other admin accounts.
    #[must_use]
    pub const fn is_super_admin(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Page a freshly logged-in principal lands on.
    #[must_use]
    pub const fn landing_page(self) -> &'static str {
        if self.is_staff() {
            "/admin.html"
        } else {
            "/dashboard.html"
        }
    }
}

impl From<AdminRole> for Role {
    fn from(role: AdminRole) -> Self {
        match role {
            AdminRole::ContentModerator => Self::ContentModerator,
            AdminRole::SuperAdmin => Self::SuperAdmin,
        }
    }
}

/// Session principal.
///
/// `id` is a `users.user_id` for [`Role::User`] and an `admins.admin_id`
/// otherwise; the two id spaces are disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i32,
    pub name: String,
    pub role: Role,
    pub email: String,
}

impl Principal {
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    #[must_use]
    pub const fn is_member(&self) -> bool {
        matches!(self.role, Role::User)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tags() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::ContentModerator).unwrap(), "admin");
        assert_eq!(serde_json::to_value(Role::SuperAdmin).unwrap(), "super_admin");
    }

    #[test]
    fn test_staff_predicates() {
        assert!(!Role::User.is_staff());
        assert!(Role::ContentModerator.is_staff());
        assert!(Role::SuperAdmin.is_staff());
        assert!(!Role::ContentModerator.is_super_admin());
        assert!(Role::SuperAdmin.is_super_admin());
    }

    #[test]
    fn test_landing_pages() {
        assert_eq!(Role::User.landing_page(), "/dashboard.html");
        assert_eq!(Role::SuperAdmin.landing_page(), "/admin.html");
    }

    #[test]
    fn test_admin_role_conversion() {
        assert_eq!(Role::from(AdminRole::ContentModerator), Role::ContentModerator);
        assert_eq!(Role::from(AdminRole::SuperAdmin), Role::SuperAdmin);
    }
}
