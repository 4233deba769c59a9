//! RBAC snapshot resolution at token-mint time.

use std::sync::Arc;

use userman_core::{RbacSnapshot, RbacStore, StoreError, UserId};

/// Resolves the current roles and permissions for a user.
///
/// Store errors propagate unchanged; the caller decides whether absence of
/// roles matters. It does not here: a user with no roles gets an empty
/// snapshot, not an error.
#[derive(Clone)]
pub struct SnapshotResolver {
    rbac: Arc<dyn RbacStore>,
}

impl SnapshotResolver {
    pub fn new(rbac: Arc<dyn RbacStore>) -> Self {
        Self { rbac }
    }

    pub async fn resolve(&self, user_id: UserId) -> Result<RbacSnapshot, StoreError> {
        let roles = self.rbac.roles_of(user_id).await?;
        let permissions = self.rbac.permissions_of(user_id).await?;
        Ok(RbacSnapshot::new(roles, permissions))
    }
}
