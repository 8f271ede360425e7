use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const NOT_FOUND_MESSAGE: &str = "Movie not found";

/// Where a record came from; doubles as the serialized `source` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSource {
    Local,
    Remote,
    NotFound,
}

/// Average of every local rating event recorded for one raw title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRating {
    pub title: String,
    pub average_rating: Option<f64>,
}

/// Full record assembled from the remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDetail {
    pub title: String,
    pub average_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    /// Raw rating strings keyed by normalized provider name (`imdb`, ...).
    pub ratings_by_source: BTreeMap<String, String>,
}

impl RemoteDetail {
    pub fn new(
        title: String,
        year: Option<String>,
        plot: Option<String>,
        poster_url: Option<String>,
        ratings_by_source: BTreeMap<String, String>,
    ) -> Self {
        let average_rating = ratings_by_source
            .get("imdb")
            .and_then(|value| parse_imdb_rating(value));
        Self {
            title,
            average_rating,
            year,
            plot,
            poster_url,
            ratings_by_source,
        }
    }
}

/// One entry of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RatingRecord {
    Local(LocalRating),
    Remote(RemoteDetail),
    NotFound {
        title: String,
        message: String,
        average_rating: Option<f64>,
    },
}

impl RatingRecord {
    pub fn local(title: impl Into<String>, average_rating: Option<f64>) -> Self {
        RatingRecord::Local(LocalRating {
            title: title.into(),
            average_rating,
        })
    }

    pub fn not_found(title: impl Into<String>) -> Self {
        RatingRecord::NotFound {
            title: title.into(),
            message: NOT_FOUND_MESSAGE.to_string(),
            average_rating: None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            RatingRecord::Local(rating) => &rating.title,
            RatingRecord::Remote(detail) => &detail.title,
            RatingRecord::NotFound { title, .. } => title,
        }
    }

    pub fn average_rating(&self) -> Option<f64> {
        match self {
            RatingRecord::Local(rating) => rating.average_rating,
            RatingRecord::Remote(detail) => detail.average_rating,
            RatingRecord::NotFound { .. } => None,
        }
    }

    pub fn source(&self) -> RatingSource {
        match self {
            RatingRecord::Local(_) => RatingSource::Local,
            RatingRecord::Remote(_) => RatingSource::Remote,
            RatingRecord::NotFound { .. } => RatingSource::NotFound,
        }
    }
}

impl From<RemoteDetail> for RatingRecord {
    fn from(detail: RemoteDetail) -> Self {
        RatingRecord::Remote(detail)
    }
}

/// A row of the full-catalog ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRatedEntry {
    pub title: String,
    pub average_rating: f64,
    pub rating_count: usize,
}

/// Parses the numeric part of an IMDb rating such as `7.8/10`.
pub fn parse_imdb_rating(value: &str) -> Option<f64> {
    let numeric = value.split('/').next()?.trim();
    numeric.parse::<f64>().ok().filter(|rating| rating.is_finite())
}
