use std::sync::Arc;

use axum::Router;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode, header};
use movie_ratings::api::types::ErrorBody;
use movie_ratings::api::{AppState, router};
use movie_ratings::catalog::{CatalogHandle, LocalCatalog};
use movie_ratings::error::RemoteError;
use movie_ratings::models::{RatingRecord, RemoteDetail, TopRatedEntry};
use movie_ratings::remote::{
    OmdbRating, OmdbSearch, OmdbTitle, RatingsApi, RemoteCache, RemoteProvider,
};
use movie_ratings::service::QueryService;
use serde_json::from_slice;
use tower::ServiceExt;

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Knows exactly one title and never returns search results.
struct SingleTitleApi {
    title: &'static str,
    imdb: &'static str,
}

#[async_trait::async_trait]
impl RatingsApi for SingleTitleApi {
    async fn lookup_title(&self, title: &str) -> Result<OmdbTitle, RemoteError> {
        if !title.eq_ignore_ascii_case(self.title) {
            return Ok(OmdbTitle {
                response: "False".to_string(),
                error: Some("Movie not found!".to_string()),
                ..OmdbTitle::default()
            });
        }
        Ok(OmdbTitle {
            response: "True".to_string(),
            title: Some(self.title.to_string()),
            year: Some("2010".to_string()),
            ratings: vec![OmdbRating {
                source: "Internet Movie Database".to_string(),
                value: self.imdb.to_string(),
            }],
            ..OmdbTitle::default()
        })
    }

    async fn lookup_id(&self, _id: &str) -> Result<OmdbTitle, RemoteError> {
        Err(RemoteError::Status(404))
    }

    async fn search(&self, _query: &str) -> Result<OmdbSearch, RemoteError> {
        Ok(OmdbSearch {
            response: "False".to_string(),
            error: Some("Movie not found!".to_string()),
            ..OmdbSearch::default()
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn build_app(catalog: CatalogHandle) -> Router {
    let api = SingleTitleApi {
        title: "Inception",
        imdb: "8.8/10",
    };
    let remote = RemoteProvider::new(Arc::new(api), RemoteCache::unbounded());
    router(AppState::new(QueryService::new(catalog, remote)))
}

fn sample_catalog() -> CatalogHandle {
    CatalogHandle::ready(LocalCatalog::from_joined_rows([
        ("Toy Story (1995)", 4.0),
        ("Toy Story (1995)", 5.0),
        ("GoldenEye (1995)", 3.0),
        ("Four Rooms (1995)", 2.0),
    ]))
}

fn post_json(uri: &str, body: &str) -> TestResult<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn healthz_reports_ok() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"ok");
    Ok(())
}

#[tokio::test]
async fn get_rating_returns_local_matches() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(post_json("/api/get_rating", r#"{"title": "toy story"}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: Vec<RatingRecord> = from_slice(&bytes)?;
    assert_eq!(parsed, vec![RatingRecord::local("Toy Story (1995)", Some(4.5))]);
    Ok(())
}

#[tokio::test]
async fn get_rating_serializes_source_tag() -> TestResult<()> {
    let app = build_app(CatalogHandle::ready(LocalCatalog::default()));

    let response = app
        .oneshot(post_json("/api/get_rating", r#"{"title": "inception"}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let raw: serde_json::Value = from_slice(&bytes)?;
    assert_eq!(raw[0]["source"], "remote");
    assert_eq!(raw[0]["title"], "Inception");
    assert_eq!(raw[0]["average_rating"], 8.8);
    assert_eq!(raw[0]["ratings_by_source"]["imdb"], "8.8/10");
    Ok(())
}

#[tokio::test]
async fn get_rating_reports_not_found() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(post_json("/api/get_rating", r#"{"title": " Zzyzx Road "}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: Vec<RatingRecord> = from_slice(&bytes)?;
    assert_eq!(parsed, vec![RatingRecord::not_found("Zzyzx Road")]);
    Ok(())
}

#[tokio::test]
async fn blank_title_returns_empty_list() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(post_json("/api/get_rating", r#"{"title": "   "}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: Vec<RatingRecord> = from_slice(&bytes)?;
    assert!(parsed.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_dataset_is_internal_error() -> TestResult<()> {
    let dir = tempfile::tempdir()?;
    let app = build_app(CatalogHandle::from_data_dir(dir.path()));

    let response = app
        .oneshot(post_json("/api/get_rating", r#"{"title": "heat"}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: ErrorBody = from_slice(&bytes)?;
    assert!(parsed.error.starts_with("failed to get combined ratings"));
    Ok(())
}

#[tokio::test]
async fn omdb_exact_returns_remote_details() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(post_json("/api/get_omdb_exact", r#"{"title": "inception"}"#)?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: Vec<RemoteDetail> = from_slice(&bytes)?;
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].year.as_deref(), Some("2010"));
    assert_eq!(parsed[0].average_rating, Some(8.8));
    Ok(())
}

#[tokio::test]
async fn top_ten_ranks_local_catalog() -> TestResult<()> {
    let app = build_app(sample_catalog());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/top_ten?limit=2")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await?;
    let parsed: Vec<TopRatedEntry> = from_slice(&bytes)?;
    let titles: Vec<&str> = parsed.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, vec!["Toy Story (1995)", "GoldenEye (1995)"]);
    assert_eq!(parsed[0].rating_count, 2);
    Ok(())
}
