//! Postgres-backed store implementations (sqlx).
//!
//! Runtime-checked queries; the connection URL is expected to carry a
//! `search_path` pointing at the schema holding `users`, `roles`,
//! `permissions`, `user_roles`, `role_permissions`, and `user_sessions`
//! (see `sql/schema.sql`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use userman_core::{
    NewSession, NewUser, Permission, PermissionId, ProfileUpdate, RbacStore, Role, RoleId,
    RoleWithPermissions, Session, SessionId, SessionStore, StoreError, User, UserId, UserStore,
};

fn store_err(err: sqlx::Error) -> StoreError {
    StoreError::new(err.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: String,
    is_active: bool,
    is_email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            is_active: row.is_active,
            is_email_verified: row.is_email_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login: row.last_login,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: RoleId::new(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: i64,
    name: String,
    resource: String,
    action: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: PermissionId::new(row.id),
            name: row.name,
            resource: row.resource,
            action: row.action,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    user_id: i64,
    access_token_hash: String,
    access_token_expires_at: DateTime<Utc>,
    refresh_token_hash: String,
    refresh_token_expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    last_refreshed_at: Option<DateTime<Utc>>,
    is_revoked: bool,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId::new(row.id),
            user_id: UserId::new(row.user_id),
            access_token_hash: row.access_token_hash,
            access_token_expires_at: row.access_token_expires_at,
            refresh_token_hash: row.refresh_token_hash,
            refresh_token_expires_at: row.refresh_token_expires_at,
            created_at: row.created_at,
            last_refreshed_at: row.last_refreshed_at,
            is_revoked: row.is_revoked,
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone, \
     is_active, is_email_verified, created_at, updated_at, last_login";

const SESSION_COLUMNS: &str = "id, user_id, access_token_hash, access_token_expires_at, \
     refresh_token_hash, refresh_token_expires_at, created_at, last_refreshed_at, is_revoked";

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Postgres user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(User::from))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users \
                 (username, email, password_hash, first_name, last_name, phone, \
                  is_active, is_email_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.is_active)
        .bind(user.is_email_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.into())
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
                 first_name = COALESCE($1, first_name), \
                 last_name  = COALESCE($2, last_name), \
                 phone      = COALESCE($3, phone), \
                 email      = COALESCE($4, email), \
                 updated_at = NOW() \
             WHERE id = $5 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.phone)
        .bind(update.email)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(User::from))
    }

    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RBAC
// ─────────────────────────────────────────────────────────────────────────────

/// Postgres role/permission store.
pub struct PgRbacStore {
    pool: PgPool,
}

impl PgRbacStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RbacStore for PgRbacStore {
    async fn roles_of(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT r.id, r.name, r.description, r.created_at \
             FROM user_roles ur \
             JOIN roles r ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.name",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn permissions_of(&self, user_id: UserId) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT DISTINCT p.id, p.name, p.resource, p.action, p.description, p.created_at \
             FROM user_roles ur \
             JOIN roles r ON ur.role_id = r.id \
             JOIN role_permissions rp ON r.id = rp.role_id \
             JOIN permissions p ON rp.permission_id = p.id \
             WHERE ur.user_id = $1 \
             ORDER BY p.resource, p.action, p.name",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(Permission::from).collect())
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError> {
        let roles = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at FROM roles ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut out = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = sqlx::query_as::<_, PermissionRow>(
                "SELECT p.id, p.name, p.resource, p.action, p.description, p.created_at \
                 FROM role_permissions rp \
                 JOIN permissions p ON rp.permission_id = p.id \
                 WHERE rp.role_id = $1 \
                 ORDER BY p.resource, p.action, p.name",
            )
            .bind(role.id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

            out.push(RoleWithPermissions {
                role: role.into(),
                permissions: permissions.into_iter().map(Permission::from).collect(),
            });
        }
        Ok(out)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT id, name, resource, action, description, created_at \
             FROM permissions ORDER BY resource, action, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(Permission::from).collect())
    }

    async fn create_role(&self, name: &str, description: &str) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "INSERT INTO roles (name, description) VALUES ($1, $2) \
             RETURNING id, name, description, created_at",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.into())
    }

    async fn update_role(
        &self,
        id: RoleId,
        name: &str,
        description: &str,
    ) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "UPDATE roles SET name = $1, description = $2 WHERE id = $3 \
             RETURNING id, name, description, created_at",
        )
        .bind(name)
        .bind(description)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(Role::from))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Postgres session store.
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO user_sessions \
                 (user_id, access_token_hash, access_token_expires_at, \
                  refresh_token_hash, refresh_token_expires_at, is_revoked) \
             VALUES ($1, $2, $3, $4, $5, false) \
             RETURNING id",
        )
        .bind(session.user_id.as_i64())
        .bind(&session.access_token_hash)
        .bind(session.access_token_expires_at)
        .bind(&session.refresh_token_hash)
        .bind(session.refresh_token_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(SessionId::new(id))
    }

    async fn find_by_access_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions \
             WHERE access_token_hash = $1 AND is_revoked = false \
               AND access_token_expires_at > $2"
        ))
        .bind(hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(Session::from))
    }

    async fn find_by_refresh_hash(
        &self,
        hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions \
             WHERE refresh_token_hash = $1 AND is_revoked = false \
               AND refresh_token_expires_at > $2"
        ))
        .bind(hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(Session::from))
    }

    async fn update_access_token(
        &self,
        id: SessionId,
        access_token_hash: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE user_sessions \
             SET access_token_hash = $1, access_token_expires_at = $2, last_refreshed_at = $3 \
             WHERE id = $4",
        )
        .bind(access_token_hash)
        .bind(expires_at)
        .bind(now)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke(&self, id: SessionId) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE user_sessions SET is_revoked = true WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id.as_i64())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn sweep_expired(&self, user_id: UserId, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE user_id = $1 AND refresh_token_expires_at < $2",
        )
        .bind(user_id.as_i64())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}
