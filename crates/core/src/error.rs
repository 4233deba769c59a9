//! Error taxonomy for the authentication engine.

use thiserror::Error;

/// Result type used across the auth layer.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure of an underlying store operation.
///
/// Deliberately opaque: storage details must not leak through the auth
/// boundary. Adapters wrap their driver errors into this with context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Authentication/authorization error.
///
/// Credential and token failures are intentionally coarse at the boundary:
/// `InvalidCredentials` covers both "no such email" and "wrong password" so
/// the API cannot be used to enumerate accounts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("malformed token")]
    MalformedToken,

    /// The operation needs an access token but was given another kind.
    #[error("access token required")]
    NotAnAccessToken,

    /// The operation needs a refresh token but was given another kind.
    #[error("refresh token required")]
    NotARefreshToken,

    #[error("session not found")]
    SessionNotFound,

    /// Refresh lookup missed: the session is revoked, refresh-expired, or
    /// never existed. Collapsed into one variant so callers cannot tell which.
    #[error("invalid or expired refresh token")]
    InvalidRefreshSession,

    /// The session exists but belongs to a different user than the token
    /// claims (cross-session replay).
    #[error("unauthorized")]
    Unauthorized,

    #[error("failed to hash password")]
    Hashing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether this error must surface as a generic server-side failure
    /// (as opposed to a client fault).
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Store(_) | AuthError::Hashing)
    }
}
