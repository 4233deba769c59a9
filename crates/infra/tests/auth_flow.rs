//! End-to-end engine scenarios over the in-memory stores.

use std::sync::Arc;

use chrono::Utc;

use userman_auth::{token_digest, AuthEngine, RegisterRequest, TokenConfig};
use userman_core::{AuthError, NewSession, RbacStore, SessionStore, UserStore};
use userman_infra::{InMemoryRbacStore, InMemorySessionStore, InMemoryUserStore};

struct Harness {
    engine: AuthEngine,
    users: Arc<InMemoryUserStore>,
    sessions: Arc<InMemorySessionStore>,
    rbac: Arc<InMemoryRbacStore>,
}

fn harness() -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let rbac = Arc::new(InMemoryRbacStore::new());
    let engine = AuthEngine::new(
        users.clone(),
        sessions.clone(),
        rbac.clone(),
        &TokenConfig {
            secret: "test-secret".to_string(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        },
        // Minimum bcrypt cost keeps the suite fast.
        4,
    );
    Harness {
        engine,
        users,
        sessions,
        rbac,
    }
}

fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone: String::new(),
    }
}

#[tokio::test]
async fn register_login_introspect_happy_path() {
    let h = harness();
    let user = h
        .engine
        .register(register_request("alice", "alice@x.com", "Secret123!"))
        .await
        .unwrap();
    assert!(user.is_active);
    assert!(!user.is_email_verified);
    assert!(user.password_hash.is_empty(), "hash must never be echoed");

    let role = h.rbac.create_role("editor", "").await.unwrap();
    let perm = h.rbac.add_permission("posts:write", "posts", "write");
    h.rbac.grant_permission(role.id, perm.id);
    h.rbac.assign_role(user.id, role.id);

    let outcome = h.engine.login("alice@x.com", "Secret123!").await.unwrap();
    assert!(outcome.access_token_expires_at < outcome.refresh_token_expires_at);
    assert_eq!(outcome.roles.len(), 1);
    assert_eq!(outcome.permissions.len(), 1);
    assert_eq!(outcome.user.username, "alice");

    // A session row exists and matches the issued tokens' digests.
    let now = Utc::now();
    let session = h
        .sessions
        .find_by_access_hash(&token_digest(&outcome.access_token), now)
        .await
        .unwrap()
        .expect("session should be live");
    assert_eq!(session.user_id, user.id);
    assert_eq!(session.refresh_token_hash, token_digest(&outcome.refresh_token));
    assert!(!session.is_revoked);

    // Last-login was stamped.
    let reloaded = h.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(reloaded.last_login.is_some());

    let introspection = h.engine.introspect(&outcome.access_token).await;
    assert!(introspection.active);
    assert_eq!(introspection.user.unwrap().username, "alice");
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials_and_creates_no_session() {
    let h = harness();
    h.engine
        .register(register_request("bob", "bob@x.com", "Right1!"))
        .await
        .unwrap();

    let err = h.engine.login("bob@x.com", "Wrong1!").await.unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(h.sessions.session_count(), 0);
}

#[tokio::test]
async fn unknown_email_is_the_same_error_as_wrong_password() {
    let h = harness();
    let err = h.engine.login("nobody@x.com", "whatever").await.unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let h = harness();
    h.engine
        .register(register_request("carol", "carol@x.com", "pw"))
        .await
        .unwrap();

    assert_eq!(
        h.engine
            .register(register_request("carol", "other@x.com", "pw"))
            .await
            .unwrap_err(),
        AuthError::DuplicateUsername
    );
    assert_eq!(
        h.engine
            .register(register_request("other", "carol@x.com", "pw"))
            .await
            .unwrap_err(),
        AuthError::DuplicateEmail
    );
}

#[tokio::test]
async fn zero_roles_means_empty_snapshot_not_an_error() {
    let h = harness();
    h.engine
        .register(register_request("dave", "dave@x.com", "pw"))
        .await
        .unwrap();

    let outcome = h.engine.login("dave@x.com", "pw").await.unwrap();
    assert!(outcome.roles.is_empty());
    assert!(outcome.permissions.is_empty());
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_rotates_access_only() {
    let h = harness();
    h.engine
        .register(register_request("erin", "erin@x.com", "pw"))
        .await
        .unwrap();
    let outcome = h.engine.login("erin@x.com", "pw").await.unwrap();

    // Wrong kind.
    assert_eq!(
        h.engine.refresh_token(&outcome.access_token).await.unwrap_err(),
        AuthError::NotARefreshToken
    );

    let refreshed = h.engine.refresh_token(&outcome.refresh_token).await.unwrap();
    assert_ne!(refreshed.access_token, outcome.access_token);

    let now = Utc::now();
    // The old access hash no longer resolves; the new one does.
    assert!(h
        .sessions
        .find_by_access_hash(&token_digest(&outcome.access_token), now)
        .await
        .unwrap()
        .is_none());
    let session = h
        .sessions
        .find_by_access_hash(&token_digest(&refreshed.access_token), now)
        .await
        .unwrap()
        .unwrap();
    assert!(session.last_refreshed_at.is_some());
    // Refresh side untouched.
    assert_eq!(session.refresh_token_hash, token_digest(&outcome.refresh_token));

    // The same refresh token keeps working (no rotation on use).
    assert!(h.engine.refresh_token(&outcome.refresh_token).await.is_ok());
}

#[tokio::test]
async fn logout_is_single_shot_per_token() {
    let h = harness();
    h.engine
        .register(register_request("frank", "frank@x.com", "pw"))
        .await
        .unwrap();
    let outcome = h.engine.login("frank@x.com", "pw").await.unwrap();

    // Refresh tokens are not acceptable for logout.
    assert_eq!(
        h.engine.logout(&outcome.refresh_token).await.unwrap_err(),
        AuthError::NotAnAccessToken
    );

    h.engine.logout(&outcome.access_token).await.unwrap();
    // The revoked session is invisible to the second lookup.
    assert_eq!(
        h.engine.logout(&outcome.access_token).await.unwrap_err(),
        AuthError::SessionNotFound
    );

    assert!(!h.engine.introspect(&outcome.access_token).await.active);
}

#[tokio::test]
async fn revoked_session_blocks_refresh_too() {
    let h = harness();
    h.engine
        .register(register_request("gina", "gina@x.com", "pw"))
        .await
        .unwrap();
    let outcome = h.engine.login("gina@x.com", "pw").await.unwrap();

    h.engine.logout(&outcome.access_token).await.unwrap();
    assert_eq!(
        h.engine.refresh_token(&outcome.refresh_token).await.unwrap_err(),
        AuthError::InvalidRefreshSession
    );
}

#[tokio::test]
async fn deactivation_mid_session_kills_refresh_and_introspection() {
    let h = harness();
    let user = h
        .engine
        .register(register_request("henry", "henry@x.com", "pw"))
        .await
        .unwrap();
    let outcome = h.engine.login("henry@x.com", "pw").await.unwrap();

    assert!(h.users.set_active(user.id, false).await.unwrap());

    // The refresh token's signature is still valid; the fresh user reload
    // catches the deactivation.
    assert_eq!(
        h.engine.refresh_token(&outcome.refresh_token).await.unwrap_err(),
        AuthError::AccountDeactivated
    );
    assert!(!h.engine.introspect(&outcome.access_token).await.active);

    // And a new login is refused outright.
    assert_eq!(
        h.engine.login("henry@x.com", "pw").await.unwrap_err(),
        AuthError::AccountDeactivated
    );
}

#[tokio::test]
async fn cross_session_replay_is_unauthorized() {
    let h = harness();
    let victim = h
        .engine
        .register(register_request("ivy", "ivy@x.com", "pw"))
        .await
        .unwrap();
    let outcome = h.engine.login("ivy@x.com", "pw").await.unwrap();

    // Simulate a session row whose refresh hash matches ivy's token but is
    // owned by someone else, then retire ivy's own row.
    let legit = h
        .sessions
        .find_by_refresh_hash(&token_digest(&outcome.refresh_token), Utc::now())
        .await
        .unwrap()
        .unwrap();
    h.sessions.revoke(legit.id).await.unwrap();
    h.sessions
        .create(NewSession {
            user_id: userman_core::UserId::new(victim.id.as_i64() + 1),
            access_token_hash: "x".repeat(64),
            access_token_expires_at: legit.access_token_expires_at,
            refresh_token_hash: legit.refresh_token_hash.clone(),
            refresh_token_expires_at: legit.refresh_token_expires_at,
        })
        .await
        .unwrap();

    assert_eq!(
        h.engine.refresh_token(&outcome.refresh_token).await.unwrap_err(),
        AuthError::Unauthorized
    );
}

#[tokio::test]
async fn revoke_all_sessions_invalidates_every_login() {
    let h = harness();
    let user = h
        .engine
        .register(register_request("jack", "jack@x.com", "pw"))
        .await
        .unwrap();
    let first = h.engine.login("jack@x.com", "pw").await.unwrap();
    let second = h.engine.login("jack@x.com", "pw").await.unwrap();
    assert_ne!(first.session_id, second.session_id);

    h.engine.revoke_all_sessions(user.id).await.unwrap();
    assert!(!h.engine.introspect(&first.access_token).await.active);
    assert!(!h.engine.introspect(&second.access_token).await.active);
    // Idempotent.
    h.engine.revoke_all_sessions(user.id).await.unwrap();
}

#[tokio::test]
async fn garbage_tokens_never_panic_introspection() {
    let h = harness();
    assert!(!h.engine.introspect("").await.active);
    assert!(!h.engine.introspect("not.a.token").await.active);
    assert!(!h.engine.introspect("a.b.c").await.active);
}
