use crate::application::validators::MAX_ATTACHMENT_BYTES;
use crate::interface::app_state::AppState;
use crate::interface::http_handlers::{
    analytics_handler, create_complaint_handler, delete_complaint_handler,
    external_login_handler, health_handler, list_complaints_handler, login_handler,
    my_complaints_handler, register_handler, update_complaint_handler,
};
use crate::interface::websocket::ws_handler;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart framing and text fields around the largest attachment.
const UPLOAD_BODY_LIMIT: usize = MAX_ATTACHMENT_BYTES + 1024 * 1024;

/// Assembles the full HTTP surface over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/google-mock", post(external_login_handler));

    let complaint_routes = Router::new()
        .route(
            "/",
            post(create_complaint_handler)
                .get(list_complaints_handler)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/my", get(my_complaints_handler))
        .route("/analytics", get(analytics_handler))
        .route(
            "/{id}",
            put(update_complaint_handler).delete(delete_complaint_handler),
        );

    Router::new()
        .route("/", get(health_handler))
        .route("/ws", get(ws_handler))
        .nest("/api/auth", auth_routes)
        .nest("/api/complaints", complaint_routes)
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
