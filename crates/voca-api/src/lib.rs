//! REST surface of Voca: registration, login (token chain), profile edits
//! and group-scoped messages.

pub mod auth;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod validation;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::require_user;

/// All REST routes. Routes that carry their tokens in the body or headers
/// resolve them in the handler; `/edit` and `/me` go through `require_user`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/messages/send", post(messages::send_message))
        .route("/messages", get(messages::latest_message))
        .route("/messages/all", get(messages::list_messages));

    let protected_routes = Router::new()
        .route("/edit", post(auth::edit_profile))
        .route("/me", get(auth::me))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
