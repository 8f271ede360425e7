use axum::Json;
use axum::extract::{Query, State};
use tracing::{debug, instrument};

use crate::models::{RatingRecord, RemoteDetail, TopRatedEntry};

use super::state::AppState;
use super::types::{ApiError, TitleRequest, TopTenParams};

pub async fn home() -> &'static str {
    "movie ratings service"
}

pub async fn healthz() -> &'static str {
    "ok"
}

#[instrument(skip_all)]
pub async fn get_rating(
    State(state): State<AppState>,
    Json(request): Json<TitleRequest>,
) -> Result<Json<Vec<RatingRecord>>, ApiError> {
    if request.title.trim().is_empty() {
        debug!("blank title, returning no records");
        return Ok(Json(Vec::new()));
    }

    let records = state.service.get_rating(&request.title).await?;
    Ok(Json(records))
}

#[instrument(skip_all)]
pub async fn get_omdb_exact(
    State(state): State<AppState>,
    Json(request): Json<TitleRequest>,
) -> Json<Vec<RemoteDetail>> {
    Json(state.service.get_suggestions(&request.title).await)
}

#[instrument(skip_all)]
pub async fn top_ten(
    State(state): State<AppState>,
    Query(params): Query<TopTenParams>,
) -> Result<Json<Vec<TopRatedEntry>>, ApiError> {
    let entries = state.service.top_rated(params.effective_limit()).await?;
    Ok(Json(entries))
}
