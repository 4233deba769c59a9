//! Role and permission management. All behind the auth middleware.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use userman_core::{RoleId, StoreError};

use crate::app::dto::RoleBody;
use crate::app::errors::json_error;
use crate::app::services::AppServices;

pub async fn list_roles(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.rbac.list_roles().await {
        Ok(roles) => Json(roles).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RoleBody>,
) -> Response {
    if body.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "invalid_request", "name is required");
    }

    match services.rbac.create_role(&body.name, &body.description).await {
        Ok(role) => (StatusCode::CREATED, Json(role)).into_response(),
        Err(e) => store_error_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<i64>,
    Json(body): Json<RoleBody>,
) -> Response {
    if body.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "invalid_request", "name is required");
    }

    match services
        .rbac
        .update_role(RoleId::from(id), &body.name, &body.description)
        .await
    {
        Ok(Some(role)) => Json(role).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "role not found"),
        Err(e) => store_error_response(e),
    }
}

pub async fn list_permissions(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.rbac.list_permissions().await {
        Ok(permissions) => Json(permissions).into_response(),
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
