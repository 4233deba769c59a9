//! Authentication endpoints.

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use userman_auth::{Introspection, RegisterRequest};

use crate::app::dto::{LoginBody, RefreshBody, RegisterBody};
use crate::app::errors::{auth_error_response, json_error};
use crate::app::services::AppServices;
use crate::middleware::extract_bearer;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterBody>,
) -> Response {
    if body.username.trim().is_empty() || body.email.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "username and email are required",
        );
    }
    if body.password.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "password is required",
        );
    }

    let req = RegisterRequest {
        username: body.username,
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
    };

    match services.engine.register(req).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => auth_error_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginBody>,
) -> Response {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "email and password are required",
        );
    }

    match services.engine.login(&body.email, &body.password).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => auth_error_response(e),
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RefreshBody>,
) -> Response {
    if body.refresh_token.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "refresh_token is required",
        );
    }

    match services.engine.refresh_token(&body.refresh_token).await {
        Ok(refreshed) => Json(refreshed).into_response(),
        Err(e) => auth_error_response(e),
    }
}

/// Revokes the session behind the bearer token on the request itself.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let Ok(token) = extract_bearer(&headers) else {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing bearer token");
    };

    match services.engine.logout(token).await {
        Ok(()) => Json(serde_json::json!({ "message": "logged out" })).into_response(),
        Err(e) => auth_error_response(e),
    }
}

/// Token validity check. Always 200; a bad or absent token is simply
/// `active: false`.
pub async fn introspect(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let verdict = match extract_bearer(&headers) {
        Ok(token) => services.engine.introspect(token).await,
        Err(_) => Introspection::inactive(),
    };
    Json(verdict).into_response()
}
