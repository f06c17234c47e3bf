use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use petstore_auth::AuthError;
use petstore_core::DomainError;
use petstore_infra::repository::RepoError;
use petstore_infra::storage::StorageError;

use crate::app::dto::ApiResponse;

/// Status messages, success or failure, share one envelope.
pub fn api_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::new(status, message))).into_response()
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    api_response(status, message)
}

pub fn invalid_id() -> Response {
    json_error(StatusCode::BAD_REQUEST, "Invalid ID supplied")
}

pub fn server_error(err: impl std::fmt::Display) -> Response {
    error!(error = %err, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
}

/// Map a repository failure; `not_found` is the message for a missing row.
pub fn repo_error_to_response(err: RepoError, not_found: &str) -> Response {
    match err {
        RepoError::NotFound(_) => json_error(StatusCode::NOT_FOUND, not_found),
        RepoError::Duplicate("username") => {
            json_error(StatusCode::BAD_REQUEST, "Username is already in use")
        }
        RepoError::Duplicate("email") => json_error(StatusCode::BAD_REQUEST, "Email is already in use"),
        RepoError::Duplicate(what) => json_error(StatusCode::BAD_REQUEST, format!("{what} already exists")),
        RepoError::Database(e) => server_error(e),
    }
}

/// Validation failures on a write body answer 405 (invalid input).
pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::METHOD_NOT_ALLOWED, msg),
        DomainError::InvalidId(_) => invalid_id(),
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    match err {
        AuthError::NoCredential | AuthError::NotAuthenticated => {
            json_error(StatusCode::UNAUTHORIZED, err.to_string())
        }
        AuthError::TtlOutOfRange | AuthError::Signing(_) | AuthError::Hash(_) => server_error(err),
    }
}

pub fn storage_error_to_response(err: StorageError) -> Response {
    match err {
        StorageError::InvalidName(name) => {
            json_error(StatusCode::BAD_REQUEST, format!("invalid file name {name}"))
        }
        other => server_error(other),
    }
}
