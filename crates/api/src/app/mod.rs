//! HTTP application wiring (Axum router + services).
//!
//! - `services.rs`: repositories, object storage and the session store
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: request bodies and the status envelope
//! - `errors.rs`: mapping of failures onto status envelopes

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        sessions: Arc::clone(&services.sessions),
    };

    let protected = routes::protected().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .merge(routes::public())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
