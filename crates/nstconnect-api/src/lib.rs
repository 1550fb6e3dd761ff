pub mod auth;
pub mod error;
pub mod friends;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod users;

mod convert;
mod extract;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tracing::error;

use nstconnect_db::Database;

use crate::error::ApiError;
use crate::middleware::require_auth;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// The whole `/api` surface. Everything except signup/login sits behind
/// `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users/profile", get(users::get_profile).put(users::update_profile))
        .route("/users/search", get(users::search_users))
        .route("/users/{id}", get(users::get_user))
        .route("/posts", post(posts::create_post).get(posts::get_feed))
        .route("/posts/{id}", get(posts::get_post).delete(posts::delete_post))
        .route("/posts/{id}/like", post(posts::toggle_like))
        .route("/posts/{id}/comment", post(posts::add_comment))
        .route("/posts/{id}/comments", get(posts::get_comments))
        .route("/friends", get(friends::get_friends))
        .route("/friends/requests", get(friends::get_requests))
        .route("/friends/request/{receiver_id}", post(friends::send_request))
        .route("/friends/accept/{request_id}", post(friends::accept_request))
        .route("/friends/reject/{request_id}", post(friends::reject_request))
        .route("/friends/{friend_id}", delete(friends::remove_friend))
        .route("/messages", post(messages::send_message))
        .route("/messages/conversations", get(messages::get_conversations))
        .route("/messages/{user_id}", get(messages::get_thread))
        .route("/messages/{user_id}/read", put(messages::mark_thread_read))
        .route("/notifications", get(notifications::get_notifications))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
}
