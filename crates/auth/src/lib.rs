//! `userman-auth` — the authentication and session-lifecycle engine.
//!
//! This crate is intentionally decoupled from HTTP and storage: it talks to
//! persistence only through the `userman-core` store contracts and exposes
//! the five operations the API wires up (register, login, refresh, logout,
//! introspect).

pub mod engine;
pub mod password;
pub mod snapshot;
pub mod token;

pub use engine::{AuthEngine, Introspection, LoginOutcome, RefreshedAccess, RegisterRequest};
pub use password::{hash_password, verify_password};
pub use snapshot::SnapshotResolver;
pub use token::{token_digest, Claims, TokenCodec, TokenConfig, TokenKind, ISSUER};
