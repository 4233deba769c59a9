//! Store and engine wiring.
//!
//! Two backends: in-memory (default build, dev/test) and Postgres (with the
//! `postgres` feature). Both sit behind the same store contracts, so the
//! rest of the app never knows which one it got.

use std::sync::Arc;

use userman_auth::AuthEngine;
use userman_core::{RbacStore, SessionStore, UserStore};

use crate::config::Config;

/// Everything the handlers need.
pub struct AppServices {
    pub engine: Arc<AuthEngine>,
    pub users: Arc<dyn UserStore>,
    pub rbac: Arc<dyn RbacStore>,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        rbac: Arc<dyn RbacStore>,
        config: &Config,
    ) -> Self {
        let engine = Arc::new(AuthEngine::new(
            users.clone(),
            sessions,
            rbac.clone(),
            &config.token_config(),
            config.bcrypt_cost,
        ));
        Self {
            engine,
            users,
            rbac,
        }
    }
}

/// Wire the in-memory backend.
pub fn build_in_memory_services(config: &Config) -> AppServices {
    use userman_infra::{InMemoryRbacStore, InMemorySessionStore, InMemoryUserStore};

    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let rbac: Arc<dyn RbacStore> = Arc::new(InMemoryRbacStore::new());

    AppServices::new(users, sessions, rbac, config)
}

/// Wire the backend selected at build time.
#[cfg(not(feature = "postgres"))]
pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    tracing::warn!("postgres feature disabled; using in-memory stores");
    Ok(build_in_memory_services(config))
}

/// Wire the backend selected at build time.
#[cfg(feature = "postgres")]
pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    use userman_infra::{PgRbacStore, PgSessionStore, PgUserStore};

    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    tracing::info!("connected to database");

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool.clone()));
    let rbac: Arc<dyn RbacStore> = Arc::new(PgRbacStore::new(pool));

    Ok(AppServices::new(users, sessions, rbac, config))
}
