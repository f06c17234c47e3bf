use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod pets;
pub mod store;
pub mod system;
pub mod users;

/// Endpoints reachable without a session.
pub fn public() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/pet/findByStatus", get(pets::find_by_status))
        .route("/pet/findByTags", get(pets::find_by_tags))
        .route("/pet/:id", get(pets::get_pet))
        .route("/store/inventory", get(store::inventory))
        .route("/store/order/:id", get(store::get_order))
        .route("/user", post(users::create_user))
        .route("/user/createWithArray", post(users::create_users))
        .route("/user/createWithList", post(users::create_users))
        .route("/user/login", get(users::login))
        .route("/user/:username", get(users::get_user))
}

/// Endpoints behind the session middleware.
pub fn protected() -> Router {
    Router::new()
        .route("/pet", post(pets::create_pet).put(pets::update_pet))
        .route("/pet/:id", post(pets::update_pet_with_form).delete(pets::delete_pet))
        .route("/pet/:id/uploadImage", post(pets::upload_image))
        .route("/store/order", post(store::place_order))
        .route("/store/order/:id", delete(store::delete_order))
        .route("/user/logout", get(users::logout))
        .route("/user/refresh", get(users::refresh))
        .route("/user/:username", axum::routing::put(users::update_user).delete(users::delete_user))
}
