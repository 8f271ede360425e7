use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Application configuration driven by environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub omdb_api_key: Option<String>,
    pub omdb_base_url: String,
    pub remote_timeout: Duration,
    pub cache_max_entries: Option<usize>,
    pub cache_ttl: Option<Duration>,
    pub fuzzy_limit: usize,
    pub fuzzy_threshold: f64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env::var("RATINGS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dataset"));

        let bind_addr: SocketAddr = env::var("RATINGS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .context("parsing RATINGS_BIND_ADDR")?;

        let omdb_api_key = env::var("OMDB_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let omdb_base_url = env::var("OMDB_BASE_URL")
            .unwrap_or_else(|_| "https://www.omdbapi.com/".to_string());

        let remote_timeout =
            Duration::from_secs(parse_var("RATINGS_REMOTE_TIMEOUT_SECS")?.unwrap_or(5));
        let cache_max_entries = parse_var("RATINGS_CACHE_MAX_ENTRIES")?;
        let cache_ttl = parse_var::<u64>("RATINGS_CACHE_TTL_SECS")?.map(Duration::from_secs);
        let fuzzy_limit = parse_var("RATINGS_FUZZY_LIMIT")?.unwrap_or(5);
        let fuzzy_threshold = parse_var("RATINGS_FUZZY_THRESHOLD")?.unwrap_or(90.0);

        Ok(Self {
            data_dir,
            bind_addr,
            omdb_api_key,
            omdb_base_url,
            remote_timeout,
            cache_max_entries,
            cache_ttl,
            fuzzy_limit,
            fuzzy_threshold,
        })
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("parsing {name}")),
        _ => Ok(None),
    }
}
