//! HTTP routes, one module per area.

use axum::routing::{get, post, put};
use axum::Router;

mod auth;
mod rbac;
mod system;
mod users;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/introspect", get(auth::introspect))
}

/// Routes behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(users::me))
        .route("/users", get(users::list))
        .route("/users/id/:id", get(users::get_by_id))
        .route("/users/username/:username", get(users::get_by_username))
        .route("/users/email/:email", get(users::get_by_email))
        .route("/users/:id", put(users::update_profile))
        .route("/users/:id/deactivate", put(users::deactivate))
        .route("/users/:id/toggle", put(users::toggle_active))
        .route("/roles", get(rbac::list_roles).post(rbac::create_role))
        .route("/roles/:id", put(rbac::update_role))
        .route("/permissions", get(rbac::list_permissions))
}
