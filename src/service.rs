use anyhow::Context;
use tokio::task;
use tracing::{debug, info, instrument};

use crate::catalog::CatalogHandle;
use crate::error::{QueryError, QueryResult};
use crate::merge::merge_results;
use crate::models::{RatingRecord, RemoteDetail, TopRatedEntry};
use crate::normalize::normalize_title;
use crate::remote::{DEFAULT_FUZZY_LIMIT, RemoteProvider};

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 90.0;

/// Public entry point: resolves a raw title against the local catalog and
/// the remote provider and reconciles the two.
pub struct QueryService {
    catalog: CatalogHandle,
    remote: RemoteProvider,
    fuzzy_limit: usize,
    fuzzy_threshold: f64,
}

impl QueryService {
    pub fn new(catalog: CatalogHandle, remote: RemoteProvider) -> Self {
        Self {
            catalog,
            remote,
            fuzzy_limit: DEFAULT_FUZZY_LIMIT,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn with_fuzzy(mut self, limit: usize, threshold: f64) -> Self {
        self.fuzzy_limit = limit;
        self.fuzzy_threshold = threshold;
        self
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn remote(&self) -> &RemoteProvider {
        &self.remote
    }

    /// Ranked, deduplicated records for `raw_title`.
    ///
    /// Never empty on success: a miss on both sources yields the single
    /// not-found placeholder carrying the trimmed input.
    #[instrument(skip(self))]
    pub async fn get_rating(&self, raw_title: &str) -> QueryResult<Vec<RatingRecord>> {
        let title = raw_title.trim();
        if title.is_empty() {
            return Err(QueryError::InvalidInput(
                "movie title cannot be empty".to_string(),
            ));
        }

        let key = normalize_title(title);
        let (local, remote) = tokio::join!(
            self.search_local(key),
            self.remote.get_suggestions(title)
        );
        let (exact, fuzzy) = local.map_err(QueryError::ProviderFailure)?;

        debug!(
            exact = exact.len(),
            fuzzy = fuzzy.len(),
            remote = remote.len(),
            "collected candidates"
        );

        let merged = merge_results(exact, fuzzy, remote);
        if merged.is_empty() {
            info!(title = %title, "no match in either source");
            return Ok(vec![RatingRecord::not_found(title)]);
        }
        Ok(merged)
    }

    /// First record of [`get_rating`](Self::get_rating), the best candidate.
    pub async fn best_match(&self, raw_title: &str) -> QueryResult<RatingRecord> {
        let records = self.get_rating(raw_title).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| {
                QueryError::ProviderFailure(anyhow::anyhow!("no info found for '{raw_title}'"))
            })
    }

    /// Remote-only suggestions; empty for blank input or on any failure.
    pub async fn get_suggestions(&self, raw_title: &str) -> Vec<RemoteDetail> {
        let title = raw_title.trim();
        if title.is_empty() {
            return Vec::new();
        }
        self.remote.get_suggestions(title).await
    }

    /// Highest average ratings across the whole local catalog.
    pub async fn top_rated(&self, limit: usize) -> QueryResult<Vec<TopRatedEntry>> {
        let catalog = self
            .catalog
            .get()
            .await
            .map_err(QueryError::ProviderFailure)?;
        Ok(catalog.top_rated(limit))
    }

    async fn search_local(
        &self,
        key: String,
    ) -> anyhow::Result<(Vec<RatingRecord>, Vec<RatingRecord>)> {
        let catalog = self.catalog.get().await.context("loading local catalog")?;
        let (limit, threshold) = (self.fuzzy_limit, self.fuzzy_threshold);

        task::spawn_blocking(move || {
            let exact = catalog.search_exact(&key);
            let fuzzy = catalog.search_fuzzy(&key, limit, threshold);
            (exact, fuzzy)
        })
        .await
        .context("joining local catalog search")
    }
}
