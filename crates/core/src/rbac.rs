//! RBAC entities and the snapshot embedded into tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{PermissionId, RoleId};

/// A named role. Role↔permission is many-to-many in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A grantable permission, addressed as `resource.action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// The `"resource.action"` label embedded in token claims.
    pub fn label(&self) -> String {
        format!("{}.{}", self.resource, self.action)
    }
}

/// A role together with its granted permissions (listing endpoints).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// The roles and permissions resolved at token-mint time.
///
/// Ordering is deterministic (roles by name, permissions by resource, action,
/// name) and permissions are deduplicated across roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacSnapshot {
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl RbacSnapshot {
    pub fn new(roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        Self { roles, permissions }
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    /// Collapse the role list to a single label: the first role's name, or
    /// empty if the user has none.
    ///
    /// Kept as an isolated step so single-label token consumers can be
    /// supported without touching the engine.
    pub fn primary_role_name(&self) -> String {
        self.roles.first().map(|r| r.name.clone()).unwrap_or_default()
    }

    pub fn permission_labels(&self) -> Vec<String> {
        self.permissions.iter().map(Permission::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: i64, name: &str) -> Role {
        Role {
            id: RoleId::new(id),
            name: name.to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    fn perm(id: i64, resource: &str, action: &str) -> Permission {
        Permission {
            id: PermissionId::new(id),
            name: format!("{resource}:{action}"),
            resource: resource.to_string(),
            action: action.to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn permission_label_is_resource_dot_action() {
        assert_eq!(perm(1, "users", "read").label(), "users.read");
    }

    #[test]
    fn primary_role_is_first_or_empty() {
        let snapshot = RbacSnapshot::new(vec![role(1, "admin"), role(2, "editor")], vec![]);
        assert_eq!(snapshot.primary_role_name(), "admin");
        assert_eq!(RbacSnapshot::default().primary_role_name(), "");
    }

    #[test]
    fn snapshot_renders_labels() {
        let snapshot = RbacSnapshot::new(
            vec![role(1, "editor")],
            vec![perm(1, "posts", "read"), perm(2, "posts", "write")],
        );
        assert_eq!(snapshot.role_names(), vec!["editor"]);
        assert_eq!(snapshot.permission_labels(), vec!["posts.read", "posts.write"]);
    }
}
