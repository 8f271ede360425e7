use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use super::{OmdbSearchHit, OmdbTitle, RatingsApi, RemoteCache};
use crate::error::RemoteError;
use crate::models::RemoteDetail;

/// Default number of search candidates expanded into full details.
pub const DEFAULT_FUZZY_LIMIT: usize = 5;
/// Detail requests in flight at once during a fuzzy search.
const DETAIL_FAN_OUT: usize = 4;

/// Exact and fuzzy lookups against the remote ratings API.
///
/// Transport, status and parse failures are logged and turned into empty
/// results; nothing here returns an error to the caller.
pub struct RemoteProvider {
    api: Option<Arc<dyn RatingsApi>>,
    provider_name: &'static str,
    cache: RemoteCache,
    fuzzy_limit: usize,
}

impl RemoteProvider {
    pub fn new(api: Arc<dyn RatingsApi>, cache: RemoteCache) -> Self {
        let provider_name = api.name();
        Self {
            api: Some(api),
            provider_name,
            cache,
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
        }
    }

    /// A provider with no backing API; every lookup is empty.
    pub fn disabled() -> Self {
        Self {
            api: None,
            provider_name: "disabled",
            cache: RemoteCache::unbounded(),
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
        }
    }

    pub fn with_fuzzy_limit(mut self, limit: usize) -> Self {
        self.fuzzy_limit = limit;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    pub fn cache(&self) -> &RemoteCache {
        &self.cache
    }

    /// Exact-title lookup, cached per lowercased title including misses.
    #[instrument(skip(self))]
    pub async fn lookup_exact(&self, raw_title: &str) -> Option<RemoteDetail> {
        let api = self.api.as_ref()?;
        let key = RemoteCache::key_for(raw_title);
        if key.is_empty() {
            return None;
        }

        self.cache
            .get_or_fetch(&key, || async move {
                let query = title_case(raw_title);
                match api.lookup_title(&query).await.and_then(into_detail) {
                    Ok(detail) => {
                        debug!(title = %detail.title, "exact match found");
                        Some(detail)
                    }
                    Err(RemoteError::Provider(reason)) => {
                        debug!(query = %query, reason = %reason, "no exact match");
                        None
                    }
                    Err(err) => {
                        warn!(
                            query = %query,
                            error = %err,
                            provider = self.provider_name,
                            "exact lookup failed"
                        );
                        None
                    }
                }
            })
            .await
    }

    /// Free-text search followed by one detail request per candidate.
    ///
    /// Keeps the provider's ranking. Candidates whose detail request fails are
    /// skipped.
    #[instrument(skip(self))]
    pub async fn search_fuzzy(&self, query: &str, limit: usize) -> Vec<RemoteDetail> {
        let Some(api) = self.api.as_ref() else {
            return Vec::new();
        };
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let search = match api.search(query).await {
            Ok(search) if search.is_success() => search,
            Ok(search) => {
                debug!(
                    query = %query,
                    reason = search.error.as_deref().unwrap_or("unsuccessful response"),
                    "no search results"
                );
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    query = %query,
                    error = %err,
                    provider = self.provider_name,
                    "search failed"
                );
                return Vec::new();
            }
        };

        let candidates: Vec<OmdbSearchHit> = search.search.into_iter().take(limit).collect();
        let details: Vec<Option<RemoteDetail>> = stream::iter(candidates)
            .map(|hit| self.fetch_detail(api.as_ref(), hit))
            .buffered(DETAIL_FAN_OUT)
            .collect()
            .await;

        let details: Vec<RemoteDetail> = details.into_iter().flatten().collect();
        info!(query = %query, results = details.len(), "fuzzy search completed");
        details
    }

    /// Exact match first (when any), then fuzzy candidates with a title not
    /// already present.
    #[instrument(skip(self))]
    pub async fn get_suggestions(&self, raw_title: &str) -> Vec<RemoteDetail> {
        if !self.is_enabled() || raw_title.trim().is_empty() {
            return Vec::new();
        }

        let (exact, fuzzy) = tokio::join!(
            self.lookup_exact(raw_title),
            self.search_fuzzy(raw_title, self.fuzzy_limit)
        );

        let mut results: Vec<RemoteDetail> = exact.into_iter().collect();
        let existing: HashSet<String> = results.iter().map(|detail| detail.title.clone()).collect();
        results.extend(
            fuzzy
                .into_iter()
                .filter(|detail| !existing.contains(&detail.title)),
        );
        results
    }

    async fn fetch_detail(&self, api: &dyn RatingsApi, hit: OmdbSearchHit) -> Option<RemoteDetail> {
        match api.lookup_id(&hit.imdb_id).await.and_then(into_detail) {
            Ok(detail) => Some(detail),
            Err(err) => {
                warn!(
                    id = %hit.imdb_id,
                    title = hit.title.as_deref().unwrap_or_default(),
                    error = %err,
                    provider = self.provider_name,
                    "skipping search candidate"
                );
                None
            }
        }
    }
}

fn into_detail(payload: OmdbTitle) -> Result<RemoteDetail, RemoteError> {
    if !payload.is_success() {
        return Err(RemoteError::Provider(
            payload
                .error
                .unwrap_or_else(|| "unsuccessful response".to_string()),
        ));
    }

    let title = payload
        .title
        .filter(|title| !title.trim().is_empty())
        .ok_or_else(|| RemoteError::Provider("response without a title".to_string()))?;

    let ratings: BTreeMap<String, String> = payload
        .ratings
        .into_iter()
        .map(|rating| (normalize_provider_name(&rating.source), rating.value))
        .collect();

    Ok(RemoteDetail::new(
        title,
        present(payload.year),
        present(payload.plot),
        present(payload.poster),
        ratings,
    ))
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty() && value != "N/A")
}

/// Maps a provider's rating source to a stable key.
pub fn normalize_provider_name(source: &str) -> String {
    let lowered = source.to_lowercase();
    if lowered.contains("internet movie database") {
        "imdb".to_string()
    } else if lowered.contains("rotten tomatoes") {
        "rotten_tomatoes".to_string()
    } else if lowered.contains("metacritic") {
        "metacritic".to_string()
    } else {
        lowered.replace(' ', "_")
    }
}

/// Upper-cases the first letter of each whitespace-separated token and
/// lower-cases the rest, joining tokens with single spaces.
///
/// Only the token's first character is raised. Letters after a digit or an
/// apostrophe stay lower-case on purpose: `se7en` becomes `Se7en`, not the
/// `Se7En` that word-boundary title casing would produce.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
