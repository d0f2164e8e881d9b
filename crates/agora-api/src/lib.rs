pub mod error;
pub mod friends;
pub mod groups;
pub mod middleware;
pub mod moderation;
pub mod points;
pub mod state;
pub mod votes;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};

pub use error::AppError;
pub use state::{AppState, AppStateInner};

/// Every route the server exposes, in one table. All of them need a caller
/// identity.
pub fn router(state: AppState) -> Router {
    Router::new()
        // -- Friends --
        .route("/friends", get(friends::get_friends))
        .route("/friends/{friend}", delete(friends::remove_friend))
        .route("/friend/requests", get(friends::get_requests))
        .route("/friend/requests/{to}", post(friends::send_request))
        .route("/friend/requests/{to}", delete(friends::remove_request))
        .route("/friend/accept/{from}", put(friends::accept_request))
        .route("/friend/reject/{from}", put(friends::reject_request))
        // -- Groups --
        .route("/groups", post(groups::create_group))
        .route("/groups", get(groups::get_all_groups))
        .route("/group", get(groups::get_user_groups))
        .route("/groups/{id}", get(groups::get_group))
        .route("/groups/{id}", delete(groups::delete_group))
        .route("/groups/{id}/residents/{user}", patch(groups::invite))
        .route("/groups/{id}/residents/{user}", delete(groups::delete_user))
        .route("/groups/{id}/owner/{user}", post(groups::give_ownership))
        .route("/groups/{id}/privacy", patch(groups::change_privacy))
        // -- Points --
        .route("/points", post(points::initialize_points))
        .route("/points", get(points::get_points))
        .route("/points/streak", patch(points::refresh_streak))
        .route("/points/{amount}", patch(points::update_points))
        .route("/points/transfer/{to}", patch(points::send_points))
        // -- Moderation --
        .route("/wordlists", post(moderation::create_list))
        .route("/wordlists/{id}", get(moderation::get_list))
        .route("/wordlists/{id}", delete(moderation::delete_list))
        .route("/wordlists/{id}/add", patch(moderation::add_word))
        .route("/wordlists/{id}/delete", patch(moderation::delete_word))
        .route("/wordlists/{id}/check", post(moderation::check_text))
        .route("/categories", post(moderation::create_category))
        .route("/categories/{id}", get(moderation::get_category))
        .route("/categories/{id}", delete(moderation::delete_category))
        .route("/categories/{id}/items/{item}", patch(moderation::add_element))
        .route("/categories/{id}/items/{item}", delete(moderation::delete_element))
        // -- Votes --
        .route("/votes", post(votes::create_vote))
        .route("/votes", get(votes::get_all_votes))
        .route("/votes/{id}", get(votes::get_vote))
        .route("/votes/{id}/yes", patch(votes::vote_yes))
        .route("/votes/{id}/check", get(votes::check_vote))
        .layer(axum_middleware::from_fn(middleware::require_user))
        .with_state(state)
}
