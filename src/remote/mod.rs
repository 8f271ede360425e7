//! Remote ratings provider (OMDb).
//!
//! The HTTP client sits behind [`RatingsApi`] so the provider logic, caching
//! and failure absorption can be exercised without the network.

mod cache;
mod omdb;
mod provider;

use serde::Deserialize;

use crate::error::RemoteError;

pub use cache::RemoteCache;
pub use omdb::OmdbClient;
pub use provider::{DEFAULT_FUZZY_LIMIT, RemoteProvider, normalize_provider_name, title_case};

/// Keyed-lookup and search endpoints of the remote ratings API.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingsApi: Send + Sync {
    /// Exact lookup by (title-cased) title.
    async fn lookup_title(&self, title: &str) -> Result<OmdbTitle, RemoteError>;

    /// Lookup by the provider's unique identifier.
    async fn lookup_id(&self, id: &str) -> Result<OmdbTitle, RemoteError>;

    /// Free-text search returning lightweight candidates.
    async fn search(&self, query: &str) -> Result<OmdbSearch, RemoteError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Detail payload of an exact or id lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbTitle {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub ratings: Vec<OmdbRating>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OmdbTitle {
    pub fn is_success(&self) -> bool {
        self.response.eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbRating {
    pub source: String,
    pub value: String,
}

/// Payload of a free-text search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbSearch {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub search: Vec<OmdbSearchHit>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OmdbSearch {
    pub fn is_success(&self) -> bool {
        self.response.eq_ignore_ascii_case("true")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchHit {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
}
