//! Session record: one row per login, holding token digests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{SessionId, UserId};

/// Server-side record correlating a login to the SHA-256 digests of its
/// issued tokens.
///
/// # Invariants
/// - Created only as a side effect of a successful login.
/// - Only the access hash/expiry mutate (on refresh); the refresh side is
///   immutable for the session's lifetime.
/// - `is_revoked` is monotonic: once set it is never cleared.
/// - Usable only while unrevoked and the relevant expiry is in the future;
///   either condition alone invalidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub access_token_hash: String,
    pub access_token_expires_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub is_revoked: bool,
}

impl Session {
    /// Whether the access token side is live at `now`.
    pub fn usable_for_access(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.access_token_expires_at > now
    }

    /// Whether the refresh token side is live at `now`. Access expiry is
    /// irrelevant here.
    pub fn usable_for_refresh(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.refresh_token_expires_at > now
    }
}

/// Input for persisting a session at login time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub user_id: UserId,
    pub access_token_hash: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_hash: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}
