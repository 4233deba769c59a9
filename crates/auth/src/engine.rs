//! The auth engine: orchestration of register, login, refresh, logout, and
//! introspect over the credential verifier, token codec, RBAC resolver, and
//! session store.
//!
//! Engine methods hold no state across calls and are safe to invoke
//! concurrently for different sessions; row-level atomicity is the store's
//! responsibility.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use userman_core::{
    AuthError, AuthResult, NewSession, NewUser, RbacSnapshot, RbacStore, SessionId, SessionStore,
    User, UserId, UserStore,
};

use crate::password::{hash_password, verify_password};
use crate::snapshot::SnapshotResolver;
use crate::token::{token_digest, TokenCodec, TokenConfig, TokenKind};

// ─────────────────────────────────────────────────────────────────────────────
// Inputs / outputs
// ─────────────────────────────────────────────────────────────────────────────

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Everything a successful login returns. The raw tokens appear here and
/// nowhere else.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub session_id: SessionId,
    pub roles: Vec<userman_core::Role>,
    pub permissions: Vec<userman_core::Permission>,
    pub user: User,
}

/// Result of exchanging a refresh token: a new access token only.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedAccess {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

/// Introspection verdict. Never an error: every failure mode collapses to
/// `active: false` because this sits on the hot path of every protected
/// request.
#[derive(Debug, Clone, Serialize)]
pub struct Introspection {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Introspection {
    pub fn inactive() -> Self {
        Self {
            active: false,
            user: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication and session-lifecycle orchestrator.
///
/// State machine per login attempt: Anonymous → Authenticated(session) →
/// Revoked/Expired. Sessions are created only by `login`, mutated on the
/// access side only by `refresh_token`, and terminated by `logout` or expiry.
pub struct AuthEngine {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    resolver: SnapshotResolver,
    codec: TokenCodec,
    bcrypt_cost: u32,
}

impl AuthEngine {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        rbac: Arc<dyn RbacStore>,
        token_config: &TokenConfig,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            sessions,
            resolver: SnapshotResolver::new(rbac),
            codec: TokenCodec::new(token_config),
            bcrypt_cost,
        }
    }

    /// Create a new account. The returned user never echoes the password
    /// hash back.
    pub async fn register(&self, req: RegisterRequest) -> AuthResult<User> {
        if self.users.find_by_username(&req.username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(&req.password, self.bcrypt_cost)?;

        let user = self
            .users
            .create(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                is_active: true,
                is_email_verified: false,
            })
            .await?;

        Ok(user.without_password_hash())
    }

    /// Verify credentials and issue an access + refresh token pair backed by
    /// a new session row.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<LoginOutcome> {
        // Unknown email and wrong password are the same error on purpose.
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now();

        // Best-effort: a failed stamp must not fail the login.
        if let Err(err) = self.users.touch_last_login(user.id, now).await {
            tracing::warn!(user_id = %user.id, error = %err, "failed to update last login");
        }

        let snapshot = self.resolver.resolve(user.id).await?;

        let (access_token, access_expires_at) =
            self.codec.mint(&user, TokenKind::Access, &snapshot, now)?;
        let (refresh_token, refresh_expires_at) =
            self.codec.mint(&user, TokenKind::Refresh, &snapshot, now)?;

        let session_id = self
            .sessions
            .create(NewSession {
                user_id: user.id,
                access_token_hash: token_digest(&access_token),
                access_token_expires_at: access_expires_at,
                refresh_token_hash: token_digest(&refresh_token),
                refresh_token_expires_at: refresh_expires_at,
            })
            .await?;

        self.spawn_session_sweep(user.id);

        let RbacSnapshot { roles, permissions } = snapshot;
        Ok(LoginOutcome {
            access_token,
            access_token_expires_at: access_expires_at,
            refresh_token,
            refresh_token_expires_at: refresh_expires_at,
            session_id,
            roles,
            permissions,
            user: user.without_password_hash(),
        })
    }

    /// Exchange a valid refresh token for a new access token. The refresh
    /// token itself is not rotated; the session's access side is overwritten.
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<RefreshedAccess> {
        let now = Utc::now();
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh, now)?;

        let session = self
            .sessions
            .find_by_refresh_hash(&token_digest(refresh_token), now)
            .await?
            .ok_or(AuthError::InvalidRefreshSession)?;

        // A signed token replayed against someone else's session row.
        if session.user_id != claims.user_id() {
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshSession)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        // Re-resolve fresh, so a permission revoked since login takes effect
        // on this refresh rather than only on the next login.
        let snapshot = self.resolver.resolve(user.id).await?;

        let (access_token, access_expires_at) =
            self.codec.mint(&user, TokenKind::Access, &snapshot, now)?;

        let updated = self
            .sessions
            .update_access_token(session.id, &token_digest(&access_token), access_expires_at, now)
            .await?;
        if !updated {
            return Err(AuthError::SessionNotFound);
        }

        Ok(RefreshedAccess {
            access_token,
            access_token_expires_at: access_expires_at,
        })
    }

    /// Revoke the session behind an access token.
    ///
    /// Revocation is idempotent at the store level, but a second logout with
    /// the same token fails at the lookup: revoked rows are excluded from the
    /// access-hash index.
    pub async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let now = Utc::now();
        let claims = self.codec.verify(access_token, TokenKind::Access, now)?;

        let session = self
            .sessions
            .find_by_access_hash(&token_digest(access_token), now)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user_id != claims.user_id() {
            return Err(AuthError::Unauthorized);
        }

        if !self.sessions.revoke(session.id).await? {
            return Err(AuthError::SessionNotFound);
        }

        Ok(())
    }

    /// Validate an access token for the request-authentication middleware.
    pub async fn introspect(&self, access_token: &str) -> Introspection {
        match self.introspect_inner(access_token).await {
            Ok(user) => Introspection {
                active: true,
                user: Some(user),
            },
            Err(err) => {
                tracing::debug!(error = %err, "introspection rejected token");
                Introspection::inactive()
            }
        }
    }

    async fn introspect_inner(&self, access_token: &str) -> AuthResult<User> {
        let now = Utc::now();
        let claims = self.codec.verify(access_token, TokenKind::Access, now)?;

        let session = self
            .sessions
            .find_by_access_hash(&token_digest(access_token), now)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.user_id != claims.user_id() {
            return Err(AuthError::Unauthorized);
        }

        // Reload fresh: a user deactivated since issuance still carries a
        // validly signed token.
        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        Ok(user.without_password_hash())
    }

    /// Revoke every session a user owns (used when an account is
    /// deactivated). Idempotent.
    pub async fn revoke_all_sessions(&self, user_id: UserId) -> AuthResult<()> {
        self.sessions.revoke_all(user_id).await?;
        Ok(())
    }

    /// Fire-and-forget sweep of this user's refresh-expired sessions.
    /// Runs independently of the response path; failure is only logged.
    fn spawn_session_sweep(&self, user_id: UserId) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            if let Err(err) = sessions.sweep_expired(user_id, Utc::now()).await {
                tracing::warn!(user_id = %user_id, error = %err, "failed to sweep expired sessions");
            }
        });
    }
}
