pub mod customize;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod schedule;
pub mod state;

pub use middleware::require_auth;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds every `/api` route. All of them require a signed-in caller.
pub fn router(app_state: Arc<AppState>) -> Router {
    let captions = Router::new()
        .route("/api/captions", get(rest::list_captions_handler))
        .route("/api/captions/generate", post(rest::generate_caption_handler))
        .route("/api/captions/recent", get(rest::recent_captions_handler))
        .route("/api/captions/{id}", delete(rest::delete_caption_handler))
        .route("/api/captions/{id}/favorite", patch(rest::set_favorite_handler))
        .route("/api/niches", get(rest::list_niches_handler))
        .route("/api/usage", get(rest::usage_handler))
        .route(
            "/api/ai-configuration",
            get(customize::get_configuration_handler).put(customize::save_configuration_handler),
        );

    let calendar = Router::new()
        .route(
            "/api/schedule",
            get(schedule::list_posts_handler).post(schedule::create_post_handler),
        )
        .route("/api/schedule/content-mix", get(schedule::content_mix_handler))
        .route(
            "/api/schedule/{id}",
            put(schedule::update_post_handler).delete(schedule::delete_post_handler),
        );

    Router::new()
        .merge(captions)
        .merge(calendar)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
