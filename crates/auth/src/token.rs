//! Token codec: signed compact tokens (HS256) and their stored digests.
//!
//! Minting and verification both take `now` explicitly, so expiry decisions
//! have no hidden wall-clock dependency and boundary cases are testable.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use userman_core::{AuthError, AuthResult, RbacSnapshot, User, UserId};

/// `iss` claim stamped into every token.
pub const ISSUER: &str = "user-management-service";

/// Which credential a token represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, proves identity for a single request window.
    Access,
    /// Longer-lived, exchanged for new access tokens without a password.
    Refresh,
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// Typed claim set, validated once at decode time.
///
/// The signature covers every field here, so tampering with the user id,
/// kind, or expiry invalidates the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub token_type: TokenKind,
    /// Role names granted at mint time.
    pub roles: Vec<String>,
    /// Permission labels, each rendered as `resource.action`.
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    /// Random nonce; two tokens minted in the same second still differ, so
    /// session digests never collide.
    pub jti: String,
    pub sub: String,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.user_id)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

/// Codec configuration: the shared signing secret and the two lifetimes.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

/// Mints and verifies HS256 tokens with a process-wide symmetric secret.
///
/// The secret is injected once at construction; there is no global state.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    /// Sign a token for `user` carrying the RBAC snapshot resolved at mint
    /// time. Returns the encoded token and its expiry.
    pub fn mint(
        &self,
        user: &User,
        kind: TokenKind,
        snapshot: &RbacSnapshot,
        now: DateTime<Utc>,
    ) -> AuthResult<(String, DateTime<Utc>)> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now + ttl;

        let claims = Claims {
            user_id: user.id.as_i64(),
            username: user.username.clone(),
            email: user.email.clone(),
            token_type: kind,
            roles: snapshot.role_names(),
            permissions: snapshot.permission_labels(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user.id.to_string(),
            iss: ISSUER.to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::MalformedToken)?;

        Ok((token, expires_at))
    }

    /// Verify signature, expiry (against the explicit `now`), and kind.
    ///
    /// A token whose declared algorithm is not HS256 is rejected outright,
    /// which closes the algorithm-confusion hole.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;
        let claims = data.claims;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        if claims.token_type != expected {
            return Err(match expected {
                TokenKind::Access => AuthError::NotAnAccessToken,
                TokenKind::Refresh => AuthError::NotARefreshToken,
            });
        }

        Ok(claims)
    }
}

/// SHA-256 hex digest of an encoded token.
///
/// Sessions store only this digest, so a leaked session table yields nothing
/// directly replayable.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
