//! `userman-infra` — store adapters behind the `userman-core` contracts.
//!
//! Two backends, the way the API wires them: in-memory (always built, used
//! for dev and tests) and Postgres via sqlx (behind the `postgres` feature).

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{InMemoryRbacStore, InMemorySessionStore, InMemoryUserStore};

#[cfg(feature = "postgres")]
pub use postgres::{PgRbacStore, PgSessionStore, PgUserStore};
