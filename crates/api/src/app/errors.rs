//! Consistent JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use userman_core::AuthError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map an engine error onto the wire. Internal failures are logged here and
/// never leak their detail to the client.
pub fn auth_error_response(err: AuthError) -> Response {
    if err.is_internal() {
        tracing::error!(error = %err, "internal error");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error",
        );
    }

    match &err {
        AuthError::DuplicateUsername | AuthError::DuplicateEmail => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        AuthError::AccountDeactivated => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        _ => json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string()),
    }
}
