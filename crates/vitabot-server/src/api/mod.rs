pub mod chat;
pub mod error;
pub mod state;

use crate::static_assets;
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use state::AppState;
use tower_http::cors::CorsLayer;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "vitabot is working!".to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat::chat))
        .fallback(static_assets::static_handler)
        .layer(cors)
        .with_state(state)
}
