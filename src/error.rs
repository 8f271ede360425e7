/// Classified failures surfaced by the query service.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to get combined ratings: {0:#}")]
    ProviderFailure(#[source] anyhow::Error),
}

/// Failures talking to the remote ratings provider.
///
/// These never leave the remote module; the provider logs them and degrades
/// to an empty result.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider error: {0}")]
    Provider(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
