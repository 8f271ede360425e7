use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use csv::{ByteRecord, ReaderBuilder};
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{debug, info, warn};

use crate::datasets::{self, DatasetPaths};
use crate::models::{RatingRecord, TopRatedEntry};
use crate::normalize::normalize_title;
use crate::scoring::weighted_ratio;

const ITEM_ID_COLUMNS: &[&str] = &["item_id", "itemId", "movie_id"];
const TITLE_ID_COLUMNS: &[&str] = &["movie_id", "itemId", "item_id"];
const TITLE_TEXT_COLUMNS: &[&str] = &["movie_title", "titleText", "title"];
const RATING_COLUMNS: &[&str] = &["rating"];

#[derive(Debug, Clone)]
struct CatalogTitle {
    title: String,
    rating_sum: f64,
    rating_count: usize,
}

impl CatalogTitle {
    fn average(&self) -> Option<f64> {
        if self.rating_count == 0 {
            return None;
        }
        let mean = self.rating_sum / self.rating_count as f64;
        Some((mean * 100.0).round() / 100.0)
    }
}

/// In-memory index over the joined `{title, rating}` view of the local dataset.
///
/// Titles keep the order in which they first appear in the rating events; fuzzy
/// ties resolve in that order.
#[derive(Debug, Clone, Default)]
pub struct LocalCatalog {
    titles: Vec<CatalogTitle>,
    by_normalized: HashMap<String, Vec<usize>>,
    normalized_keys: Vec<String>,
}

impl LocalCatalog {
    /// Builds the catalog from already joined `(raw title, rating)` rows.
    pub fn from_joined_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut catalog = LocalCatalog::default();
        let mut index_by_title: HashMap<String, usize> = HashMap::new();

        for (title, rating) in rows {
            let title = title.into();
            let idx = match index_by_title.get(&title) {
                Some(idx) => *idx,
                None => {
                    let idx = catalog.titles.len();
                    let normalized = normalize_title(&title);
                    let entries = catalog.by_normalized.entry(normalized.clone()).or_default();
                    if entries.is_empty() {
                        catalog.normalized_keys.push(normalized);
                    }
                    entries.push(idx);
                    index_by_title.insert(title.clone(), idx);
                    catalog.titles.push(CatalogTitle {
                        title,
                        rating_sum: 0.0,
                        rating_count: 0,
                    });
                    idx
                }
            };

            let entry = &mut catalog.titles[idx];
            entry.rating_sum += rating;
            entry.rating_count += 1;
        }

        catalog
    }

    /// Reads both dataset tables and joins rating events to titles on item id.
    pub fn load(paths: &DatasetPaths) -> Result<Self> {
        let titles = load_title_map(&paths.titles)?;
        info!(count = titles.len(), "loaded title table");

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&paths.ratings)
            .with_context(|| format!("opening {}", paths.ratings.display()))?;
        let headers = reader
            .byte_headers()
            .with_context(|| format!("reading headers of {}", paths.ratings.display()))?
            .clone();
        let item_col = column_index(&headers, ITEM_ID_COLUMNS, &paths.ratings)?;
        let rating_col = column_index(&headers, RATING_COLUMNS, &paths.ratings)?;

        let mut rows = Vec::new();
        let mut orphaned = 0usize;
        let mut skipped = 0usize;

        for result in reader.byte_records() {
            let record = result.with_context(|| format!("reading {}", paths.ratings.display()))?;
            let (Some(item_id), Some(rating)) = (
                parse_field::<u64>(&record, item_col),
                parse_field::<f64>(&record, rating_col),
            ) else {
                skipped += 1;
                continue;
            };
            match titles.get(&item_id) {
                Some(title) => rows.push((title.as_str(), rating)),
                None => orphaned += 1,
            }
        }

        if orphaned > 0 {
            warn!(orphaned, "dropped rating events without a matching title");
        }
        if skipped > 0 {
            debug!(skipped, "skipped unparsable rating rows");
        }

        let catalog = LocalCatalog::from_joined_rows(rows);
        info!(
            events = catalog.titles.iter().map(|t| t.rating_count).sum::<usize>(),
            titles = catalog.len(),
            "local catalog ready"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Every raw title whose normalized form equals `key`, sorted by raw title.
    pub fn search_exact(&self, key: &str) -> Vec<RatingRecord> {
        let Some(indices) = self.by_normalized.get(key) else {
            return Vec::new();
        };

        let mut matches: Vec<&CatalogTitle> = indices.iter().map(|idx| &self.titles[*idx]).collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        matches
            .into_iter()
            .map(|entry| RatingRecord::local(entry.title.clone(), entry.average()))
            .collect()
    }

    /// Up to `limit` normalized titles scoring at least `threshold` against
    /// `key`, best first. Each maps to the first raw title seen for it.
    pub fn search_fuzzy(&self, key: &str, limit: usize, threshold: f64) -> Vec<RatingRecord> {
        if limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &str)> = self
            .normalized_keys
            .iter()
            .map(|candidate| (weighted_ratio(key, candidate), candidate.as_str()))
            .filter(|(score, _)| *score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        scored
            .into_iter()
            .filter_map(|(_, normalized)| {
                let first = *self.by_normalized.get(normalized)?.first()?;
                let entry = &self.titles[first];
                Some(RatingRecord::local(entry.title.clone(), entry.average()))
            })
            .collect()
    }

    /// Highest averages across the whole catalog; ties go to the title with
    /// more ratings, then alphabetical order.
    pub fn top_rated(&self, limit: usize) -> Vec<TopRatedEntry> {
        let mut entries: Vec<TopRatedEntry> = self
            .titles
            .iter()
            .filter_map(|entry| {
                Some(TopRatedEntry {
                    title: entry.title.clone(),
                    average_rating: entry.average()?,
                    rating_count: entry.rating_count,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.average_rating
                .partial_cmp(&a.average_rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.rating_count.cmp(&a.rating_count))
                .then_with(|| a.title.cmp(&b.title))
        });
        entries.truncate(limit);
        entries
    }
}

/// Shared, lazily loaded catalog. A failed load is retried on the next call.
#[derive(Debug)]
pub struct CatalogHandle {
    data_dir: Option<PathBuf>,
    cell: OnceCell<Arc<LocalCatalog>>,
}

impl CatalogHandle {
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            cell: OnceCell::new(),
        }
    }

    pub fn ready(catalog: LocalCatalog) -> Self {
        Self {
            data_dir: None,
            cell: OnceCell::new_with(Some(Arc::new(catalog))),
        }
    }

    pub async fn get(&self) -> Result<Arc<LocalCatalog>> {
        let catalog = self
            .cell
            .get_or_try_init(|| async {
                let data_dir = self
                    .data_dir
                    .clone()
                    .ok_or_else(|| anyhow!("no dataset directory configured"))?;
                let catalog = task::spawn_blocking(move || {
                    let paths = datasets::prepare_datasets(&data_dir)?;
                    LocalCatalog::load(&paths)
                })
                .await
                .context("joining catalog load task")??;
                Ok::<_, anyhow::Error>(Arc::new(catalog))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }
}

fn load_title_map(path: &Path) -> Result<HashMap<u64, String>> {
    let mut map = HashMap::new();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader
        .byte_headers()
        .with_context(|| format!("reading headers of {}", path.display()))?
        .clone();
    let id_col = column_index(&headers, TITLE_ID_COLUMNS, path)?;
    let title_col = column_index(&headers, TITLE_TEXT_COLUMNS, path)?;

    for result in reader.byte_records() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        let Some(item_id) = parse_field::<u64>(&record, id_col) else {
            continue;
        };
        let Some(raw_title) = record.get(title_col) else {
            continue;
        };
        let title = String::from_utf8_lossy(raw_title).trim().to_string();
        if title.is_empty() {
            continue;
        }
        map.insert(item_id, title);
    }

    Ok(map)
}

fn column_index(headers: &ByteRecord, candidates: &[&str], path: &Path) -> Result<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|header| header == name.as_bytes()))
        .ok_or_else(|| {
            anyhow!(
                "{} is missing a column named one of {:?}",
                path.display(),
                candidates
            )
        })
}

fn parse_field<T: std::str::FromStr>(record: &ByteRecord, idx: usize) -> Option<T> {
    let raw = std::str::from_utf8(record.get(idx)?).ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}
