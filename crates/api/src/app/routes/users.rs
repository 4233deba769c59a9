//! User lookup and profile management. All behind the auth middleware.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use userman_core::{ProfileUpdate, StoreError, User, UserId};

use crate::app::errors::json_error;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub async fn me(Extension(current): Extension<CurrentUser>) -> Response {
    Json(current.user().clone()).into_response()
}

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.users.list().await {
        Ok(users) => {
            let users: Vec<User> = users.into_iter().map(User::without_password_hash).collect();
            Json(users).into_response()
        }
        Err(e) => store_error_response(e),
    }
}

pub async fn get_by_id(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> Response {
    user_response(services.users.find_by_id(UserId::from(id)).await)
}

pub async fn get_by_username(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    user_response(services.users.find_by_username(&username).await)
}

pub async fn get_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> Response {
    user_response(services.users.find_by_email(&email).await)
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    user_response(
        services
            .users
            .update_profile(UserId::from(id), update)
            .await,
    )
}

/// Deactivation also revokes every live session the account owns, so the
/// account is locked out immediately rather than at next token expiry.
pub async fn deactivate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> Response {
    let id = UserId::from(id);
    match services.users.set_active(id, false).await {
        Ok(true) => {}
        Ok(false) => return json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return store_error_response(e),
    }

    if let Err(e) = services.engine.revoke_all_sessions(id).await {
        tracing::error!(user_id = %id, error = %e, "failed to revoke sessions on deactivation");
    }

    Json(serde_json::json!({ "message": "user deactivated" })).into_response()
}

pub async fn toggle_active(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
) -> Response {
    let id = UserId::from(id);
    let user = match services.users.find_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return store_error_response(e),
    };

    let next = !user.is_active;
    match services.users.set_active(id, next).await {
        Ok(true) => {}
        Ok(false) => return json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return store_error_response(e),
    }

    if !next {
        if let Err(e) = services.engine.revoke_all_sessions(id).await {
            tracing::error!(user_id = %id, error = %e, "failed to revoke sessions on deactivation");
        }
    }

    Json(serde_json::json!({ "is_active": next })).into_response()
}

fn user_response(result: Result<Option<User>, StoreError>) -> Response {
    match result {
        Ok(Some(user)) => Json(user.without_password_hash()).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => store_error_response(e),
    }
}

fn store_error_response(err: StoreError) -> Response {
    tracing::error!(error = %err, "store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        "internal server error",
    )
}
