use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use petstore_auth::{IssuedToken, User};
use petstore_infra::repository::{RepoError, UserRepository};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SessionContext;
use crate::middleware::{extract_token, TOKEN_COOKIE};

const USER_NOT_FOUND: &str = "User not found";
pub const EXPIRES_HEADER: &str = "x-expires-after";

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<User>, JsonRejection>,
) -> Response {
    let Ok(Json(user)) = body else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid input");
    };
    let user = match prepare_new_user(services.users.as_ref(), user, services.bcrypt_cost).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match services.users.create(user).await {
        Ok(user) => {
            info!(username = %user.username, "user created");
            (StatusCode::CREATED, Json(user)).into_response()
        }
        Err(e) => errors::repo_error_to_response(e, USER_NOT_FOUND),
    }
}

/// Shared by `createWithArray` and `createWithList`; all users or none are stored.
pub async fn create_users(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Vec<User>>, JsonRejection>,
) -> Response {
    let Ok(Json(users)) = body else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid input");
    };

    let mut prepared = Vec::with_capacity(users.len());
    for user in users {
        if prepared.iter().any(|u: &User| u.username == user.username) {
            return errors::json_error(StatusCode::BAD_REQUEST, "Username is already in use");
        }
        if prepared.iter().any(|u: &User| !u.email.is_empty() && u.email == user.email) {
            return errors::json_error(StatusCode::BAD_REQUEST, "Email is already in use");
        }
        match prepare_new_user(services.users.as_ref(), user, services.bcrypt_cost).await {
            Ok(user) => prepared.push(user),
            Err(resp) => return resp,
        }
    }

    match services.users.create_many(prepared).await {
        Ok(users) => {
            info!(count = users.len(), "users created");
            (StatusCode::CREATED, Json(users)).into_response()
        }
        Err(e) => errors::repo_error_to_response(e, USER_NOT_FOUND),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Query(query): Query<dto::LoginQuery>,
) -> Response {
    let (Some(username), Some(password)) = (query.username, query.password) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid username/password supplied");
    };
    if username.is_empty() || password.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid username/password supplied");
    }

    let user = match services.users.find_by_username(&username).await {
        Ok(user) => user,
        Err(RepoError::NotFound(_)) => {
            warn!(%username, "login rejected");
            return errors::json_error(StatusCode::BAD_REQUEST, "Wrong credentials");
        }
        Err(e) => return errors::repo_error_to_response(e, USER_NOT_FOUND),
    };
    let user = match verify_off_runtime(user, password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(%username, "login rejected");
            return errors::json_error(StatusCode::BAD_REQUEST, "Wrong credentials");
        }
        Err(resp) => return resp,
    };

    let current = extract_token(&headers);
    match services.sessions.authenticate(current.as_deref(), user) {
        Ok(issued) => {
            info!(%username, "user logged in");
            with_session_cookie(errors::api_response(StatusCode::OK, "Logged in"), &issued)
        }
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    if let Err(e) = services.sessions.deauthenticate(Some(session.token())) {
        return errors::auth_error_to_response(e);
    }
    info!(username = %session.user().username, "user logged out");

    let mut resp = errors::api_response(StatusCode::OK, "Logged out");
    let expired = format!("{TOKEN_COOKIE}=; Expires={}; Path=/; HttpOnly", http_date(DateTime::UNIX_EPOCH));
    if let Ok(value) = HeaderValue::from_str(&expired) {
        resp.headers_mut().insert(header::SET_COOKIE, value);
    }
    resp
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    match services.sessions.refresh(Some(session.token())) {
        Ok(issued) => with_session_cookie(errors::api_response(StatusCode::OK, "Session refreshed"), &issued),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.find_by_username(&username).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::repo_error_to_response(e, USER_NOT_FOUND),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
    body: Result<Json<User>, JsonRejection>,
) -> Response {
    let Ok(Json(user)) = body else {
        return errors::json_error(StatusCode::BAD_REQUEST, "Invalid input");
    };

    let existing = match services.users.find_by_username(&username).await {
        Ok(existing) => existing,
        Err(e) => return errors::repo_error_to_response(e, USER_NOT_FOUND),
    };
    if user.username != existing.username {
        if let Err(resp) = ensure_username_free(services.users.as_ref(), &user.username).await {
            return resp;
        }
    }
    if user.email != existing.email {
        if let Err(resp) = ensure_email_free(services.users.as_ref(), &user.email).await {
            return resp;
        }
    }
    if let Err(e) = user.validate() {
        return errors::domain_error_to_response(e);
    }
    let user = match hash_off_runtime(user, services.bcrypt_cost).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    match services.users.update_by_username(&username, user).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => errors::repo_error_to_response(e, USER_NOT_FOUND),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.delete_by_username(&username).await {
        Ok(()) => {
            info!(%username, "user deleted");
            errors::api_response(StatusCode::OK, "User deleted")
        }
        Err(e) => errors::repo_error_to_response(e, USER_NOT_FOUND),
    }
}

/// Uniqueness checks, validation and hashing for a user about to be created.
async fn prepare_new_user(repo: &dyn UserRepository, user: User, cost: u32) -> Result<User, Response> {
    ensure_username_free(repo, &user.username).await?;
    ensure_email_free(repo, &user.email).await?;
    user.validate()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    hash_off_runtime(user, cost).await
}

/// bcrypt is CPU-bound; run it on the blocking pool.
async fn hash_off_runtime(mut user: User, cost: u32) -> Result<User, Response> {
    tokio::task::spawn_blocking(move || user.hash_password(cost).map(|()| user))
        .await
        .map_err(errors::server_error)?
        .map_err(errors::auth_error_to_response)
}

/// The user back when `password` matches, `None` otherwise.
async fn verify_off_runtime(user: User, password: String) -> Result<Option<User>, Response> {
    tokio::task::spawn_blocking(move || user.password_matches(&password).then_some(user))
        .await
        .map_err(errors::server_error)
}

async fn ensure_username_free(repo: &dyn UserRepository, username: &str) -> Result<(), Response> {
    match repo.find_by_username(username).await {
        Err(RepoError::NotFound(_)) => Ok(()),
        Ok(_) => Err(errors::json_error(StatusCode::BAD_REQUEST, "Username is already in use")),
        Err(e) => Err(errors::repo_error_to_response(e, USER_NOT_FOUND)),
    }
}

async fn ensure_email_free(repo: &dyn UserRepository, email: &str) -> Result<(), Response> {
    if email.is_empty() {
        return Ok(());
    }
    match repo.find_by_email(email).await {
        Err(RepoError::NotFound(_)) => Ok(()),
        Ok(_) => Err(errors::json_error(StatusCode::BAD_REQUEST, "Email is already in use")),
        Err(e) => Err(errors::repo_error_to_response(e, USER_NOT_FOUND)),
    }
}

fn with_session_cookie(mut resp: Response, issued: &IssuedToken) -> Response {
    let cookie = format!(
        "{TOKEN_COOKIE}={}; Expires={}; Path=/; HttpOnly",
        issued.token,
        http_date(issued.expires_at)
    );
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers.insert(EXPIRES_HEADER, HeaderValue::from(issued.expires_at.timestamp()));
    resp
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
