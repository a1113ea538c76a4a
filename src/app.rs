use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/favorites", get(handlers::favorites_page))
        .route("/api/coupons", get(handlers::get_coupons))
        .route("/api/favorites", get(handlers::get_favorites))
        .route("/api/favorites/toggle", post(handlers::toggle_favorite))
        .route("/api/favorites/remove", post(handlers::remove_favorite))
        .route("/api/favorites/:id/status", get(handlers::favorite_status))
        .with_state(state)
}
