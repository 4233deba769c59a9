//! In-memory store implementations (dev/test).
//!
//! Mutex-guarded tables with the same visibility rules as the SQL adapters:
//! revoked or expired sessions are invisible to the hash lookups, permission
//! resolution joins user_roles → role_permissions with dedup and
//! (resource, action, name) ordering.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use userman_core::{
    NewSession, NewUser, Permission, PermissionId, ProfileUpdate, RbacStore, Role, RoleId,
    RoleWithPermissions, Session, SessionId, SessionStore, StoreError, User, UserId, UserStore,
};

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct UserTable {
    rows: Vec<User>,
    next_id: i64,
}

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table.rows.clone())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.inner.lock().unwrap();
        table.next_id += 1;
        let now = Utc::now();
        let row = User {
            id: UserId::new(table.next_id),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut table = self.inner.lock().unwrap();
        let Some(row) = table.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(first_name) = update.first_name {
            row.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            row.last_name = last_name;
        }
        if let Some(phone) = update.phone {
            row.phone = phone;
        }
        if let Some(email) = update.email {
            row.email = email;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut table = self.inner.lock().unwrap();
        if let Some(row) = table.rows.iter_mut().find(|u| u.id == id) {
            row.last_login = Some(at);
        }
        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, StoreError> {
        let mut table = self.inner.lock().unwrap();
        let Some(row) = table.rows.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        row.is_active = active;
        row.updated_at = Utc::now();
        Ok(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RBAC
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RbacTables {
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: Vec<(UserId, RoleId)>,
    role_permissions: Vec<(RoleId, PermissionId)>,
    next_role_id: i64,
    next_permission_id: i64,
}

/// In-memory role/permission store with seed helpers for wiring and tests.
#[derive(Default)]
pub struct InMemoryRbacStore {
    inner: Mutex<RbacTables>,
}

impl InMemoryRbacStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a permission row.
    pub fn add_permission(&self, name: &str, resource: &str, action: &str) -> Permission {
        let mut tables = self.inner.lock().unwrap();
        tables.next_permission_id += 1;
        let permission = Permission {
            id: PermissionId::new(tables.next_permission_id),
            name: name.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            description: String::new(),
            created_at: Utc::now(),
        };
        tables.permissions.push(permission.clone());
        permission
    }

    /// Grant a role to a user.
    pub fn assign_role(&self, user_id: UserId, role_id: RoleId) {
        let mut tables = self.inner.lock().unwrap();
        if !tables.user_roles.contains(&(user_id, role_id)) {
            tables.user_roles.push((user_id, role_id));
        }
    }

    /// Attach a permission to a role.
    pub fn grant_permission(&self, role_id: RoleId, permission_id: PermissionId) {
        let mut tables = self.inner.lock().unwrap();
        if !tables.role_permissions.contains(&(role_id, permission_id)) {
            tables.role_permissions.push((role_id, permission_id));
        }
    }
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn roles_of(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
        let tables = self.inner.lock().unwrap();
        let role_ids: BTreeSet<RoleId> = tables
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();
        let mut roles: Vec<Role> = tables
            .roles
            .iter()
            .filter(|r| role_ids.contains(&r.id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn permissions_of(&self, user_id: UserId) -> Result<Vec<Permission>, StoreError> {
        let tables = self.inner.lock().unwrap();
        let role_ids: BTreeSet<RoleId> = tables
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();
        let permission_ids: BTreeSet<PermissionId> = tables
            .role_permissions
            .iter()
            .filter(|(r, _)| role_ids.contains(r))
            .map(|(_, p)| *p)
            .collect();
        let mut permissions: Vec<Permission> = tables
            .permissions
            .iter()
            .filter(|p| permission_ids.contains(&p.id))
            .cloned()
            .collect();
        permissions.sort_by(|a, b| {
            (&a.resource, &a.action, &a.name).cmp(&(&b.resource, &b.action, &b.name))
        });
        Ok(permissions)
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError> {
        let tables = self.inner.lock().unwrap();
        let mut roles = tables.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles
            .into_iter()
            .map(|role| {
                let permission_ids: BTreeSet<PermissionId> = tables
                    .role_permissions
                    .iter()
                    .filter(|(r, _)| *r == role.id)
                    .map(|(_, p)| *p)
                    .collect();
                let mut permissions: Vec<Permission> = tables
                    .permissions
                    .iter()
                    .filter(|p| permission_ids.contains(&p.id))
                    .cloned()
                    .collect();
                permissions.sort_by(|a, b| {
                    (&a.resource, &a.action, &a.name).cmp(&(&b.resource, &b.action, &b.name))
                });
                RoleWithPermissions { role, permissions }
            })
            .collect())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let tables = self.inner.lock().unwrap();
        let mut permissions = tables.permissions.clone();
        permissions.sort_by(|a, b| {
            (&a.resource, &a.action, &a.name).cmp(&(&b.resource, &b.action, &b.name))
        });
        Ok(permissions)
    }

    async fn create_role(&self, name: &str, description: &str) -> Result<Role, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        if tables.roles.iter().any(|r| r.name == name) {
            return Err(StoreError::new(format!("role '{name}' already exists")));
        }
        tables.next_role_id += 1;
        let role = Role {
            id: RoleId::new(tables.next_role_id),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(
        &self,
        id: RoleId,
        name: &str,
        description: &str,
    ) -> Result<Option<Role>, StoreError> {
        let mut tables = self.inner.lock().unwrap();
        let Some(role) = tables.roles.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        role.name = name.to_string();
        role.description = description.to_string();
        Ok(Some(role.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SessionTable {
    rows: Vec<Session>,
    next_id: i64,
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Mutex<SessionTable>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, including revoked and expired ones.
    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
        let mut table = self.inner.lock().unwrap();
        table.next_id += 1;
        let id = SessionId::new(table.next_id);
        table.rows.push(Session {
            id,
            user_id: session.user_id,
            access_token_hash: session.access_token_hash,
            access_token_expires_at: session.access_token_expires_at,
            refresh_token_hash: session.refresh_token_hash,
            refresh_token_expires_at: session.refresh_token_expires_at,
            created_at: Utc::now(),
            last_refreshed_at: None,
            is_revoked: false,
        });
        Ok(id)
    }

    async fn find_by_access_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .find(|s| s.access_token_hash == hash && s.usable_for_access(now))
            .cloned())
    }

    async fn find_by_refresh_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .find(|s| s.refresh_token_hash == hash && s.usable_for_refresh(now))
            .cloned())
    }

    async fn update_access_token(
        &self,
        id: SessionId,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut table = self.inner.lock().unwrap();
        let Some(row) = table.rows.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        row.access_token_hash = access_token_hash.to_string();
        row.access_token_expires_at = expires_at;
        row.last_refreshed_at = Some(now);
        Ok(true)
    }

    async fn revoke(&self, id: SessionId) -> Result<bool, StoreError> {
        let mut table = self.inner.lock().unwrap();
        let Some(row) = table.rows.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        row.is_revoked = true;
        Ok(true)
    }

    async fn revoke_all(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut table = self.inner.lock().unwrap();
        for row in table.rows.iter_mut().filter(|s| s.user_id == user_id) {
            row.is_revoked = true;
        }
        Ok(())
    }

    async fn sweep_expired(&self, user_id: UserId, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut table = self.inner.lock().unwrap();
        let before = table.rows.len();
        table
            .rows
            .retain(|s| s.user_id != user_id || s.refresh_token_expires_at >= now);
        Ok((before - table.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_session(user_id: i64, access: &str, refresh: &str, now: DateTime<Utc>) -> NewSession {
        NewSession {
            user_id: UserId::new(user_id),
            access_token_hash: access.to_string(),
            access_token_expires_at: now + Duration::minutes(15),
            refresh_token_hash: refresh.to_string(),
            refresh_token_expires_at: now + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn revoked_sessions_disappear_from_lookups() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let id = store.create(new_session(1, "a1", "r1", now)).await.unwrap();

        assert!(store.find_by_access_hash("a1", now).await.unwrap().is_some());
        assert!(store.revoke(id).await.unwrap());
        assert!(store.find_by_access_hash("a1", now).await.unwrap().is_none());
        assert!(store.find_by_refresh_hash("r1", now).await.unwrap().is_none());
        // Second revoke still reports the row as existing.
        assert!(store.revoke(id).await.unwrap());
    }

    #[tokio::test]
    async fn expired_sides_are_independent() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.create(new_session(1, "a1", "r1", now)).await.unwrap();

        let after_access = now + Duration::minutes(16);
        assert!(store
            .find_by_access_hash("a1", after_access)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_refresh_hash("r1", after_access)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn sweep_only_removes_refresh_expired_rows_of_that_user() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store.create(new_session(1, "a1", "r1", now)).await.unwrap();
        store
            .create(new_session(1, "a2", "r2", now - Duration::days(8)))
            .await
            .unwrap();
        store
            .create(new_session(2, "a3", "r3", now - Duration::days(8)))
            .await
            .unwrap();

        let removed = store.sweep_expired(UserId::new(1), now).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn permissions_are_deduplicated_across_roles() {
        let rbac = InMemoryRbacStore::new();
        let admin = rbac.create_role("admin", "").await.unwrap();
        let editor = rbac.create_role("editor", "").await.unwrap();
        let read = rbac.add_permission("posts:read", "posts", "read");
        let write = rbac.add_permission("posts:write", "posts", "write");
        rbac.grant_permission(admin.id, read.id);
        rbac.grant_permission(admin.id, write.id);
        rbac.grant_permission(editor.id, read.id);

        let user = UserId::new(1);
        rbac.assign_role(user, admin.id);
        rbac.assign_role(user, editor.id);

        let permissions = rbac.permissions_of(user).await.unwrap();
        assert_eq!(permissions.len(), 2);
        assert_eq!(permissions[0].action, "read");
        assert_eq!(permissions[1].action, "write");

        let roles = rbac.roles_of(user).await.unwrap();
        assert_eq!(
            roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["admin", "editor"]
        );
    }

    #[tokio::test]
    async fn user_with_no_roles_resolves_empty() {
        let rbac = InMemoryRbacStore::new();
        assert!(rbac.roles_of(UserId::new(9)).await.unwrap().is_empty());
        assert!(rbac.permissions_of(UserId::new(9)).await.unwrap().is_empty());
    }
}
