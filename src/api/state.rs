use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::service::QueryService;

use super::handlers::{get_omdb_exact, get_rating, healthz, home, top_ten};

#[derive(Clone)]
pub struct AppState {
    pub(crate) service: Arc<QueryService>,
}

impl AppState {
    pub fn new(service: QueryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/api/get_rating", post(get_rating))
        .route("/api/get_omdb_exact", post(get_omdb_exact))
        .route("/api/top_ten", get(top_ten))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
