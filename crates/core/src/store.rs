//! Async store contracts consumed by the auth engine.
//!
//! Persistence is an external collaborator; these traits are the only seam
//! the engine sees. Each method is expected to be atomic for its own row —
//! the engine takes no locks of its own.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::id::{RoleId, SessionId, UserId};
use crate::rbac::{Permission, Role, RoleWithPermissions};
use crate::session::{NewSession, Session};
use crate::user::{NewUser, ProfileUpdate, User};

/// User account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update_profile(&self, id: UserId, update: ProfileUpdate)
        -> Result<Option<User>, StoreError>;

    /// Best-effort last-login stamp; callers log failures and move on.
    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, StoreError>;
}

/// Role/permission storage (read side joins `user_roles` and
/// `role_permissions`).
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Roles granted to a user, ordered by name.
    async fn roles_of(&self, user_id: UserId) -> Result<Vec<Role>, StoreError>;

    /// Permissions reachable through the user's roles, deduplicated and
    /// ordered by (resource, action, name).
    async fn permissions_of(&self, user_id: UserId) -> Result<Vec<Permission>, StoreError>;

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;

    async fn create_role(&self, name: &str, description: &str) -> Result<Role, StoreError>;
    async fn update_role(
        &self,
        id: RoleId,
        name: &str,
        description: &str,
    ) -> Result<Option<Role>, StoreError>;
}

/// Session storage. Lookups take `now` explicitly so liveness is decided by
/// the caller's clock, not the store's.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError>;

    /// Excludes revoked rows and rows whose access expiry has passed.
    async fn find_by_access_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Excludes revoked rows and rows whose refresh expiry has passed.
    async fn find_by_refresh_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Overwrites the access hash/expiry and stamps `last_refreshed_at`.
    /// Returns false when the session does not exist.
    async fn update_access_token(
        &self,
        id: SessionId,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Returns false when the session does not exist.
    async fn revoke(&self, id: SessionId) -> Result<bool, StoreError>;

    /// Idempotent; revoking zero sessions is not an error.
    async fn revoke_all(&self, user_id: UserId) -> Result<(), StoreError>;

    /// Deletes rows whose refresh expiry has passed. Best-effort: callers
    /// must never fail their primary operation on an error here.
    async fn sweep_expired(&self, user_id: UserId, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
