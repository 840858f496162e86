pub mod domains;
pub mod health;
pub mod recipe;
pub mod session;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session Gate
        .route(
            "/api/v1/session",
            get(session::handle_get_session)
                .post(session::handle_sign_in)
                .delete(session::handle_sign_out),
        )
        .route(
            "/api/v1/session/events",
            get(session::handle_session_events),
        )
        // Domains
        .route("/api/v1/domains", get(domains::handle_list_domains))
        .route("/api/v1/command", post(domains::handle_command))
        .route(
            "/api/v1/domains/:domain",
            get(domains::handle_select_domain),
        )
        .route(
            "/api/v1/domains/:domain/profile",
            patch(domains::handle_update_field),
        )
        .route(
            "/api/v1/domains/:domain/generate",
            post(domains::handle_generate),
        )
        .route("/api/v1/domains/:domain/reset", post(domains::handle_reset))
        // Recipe overlay (nutrition)
        .route(
            "/api/v1/recipe",
            get(recipe::handle_get_recipe)
                .post(recipe::handle_open_recipe)
                .delete(recipe::handle_close_recipe),
        )
        .with_state(state)
}
