use thiserror::Error;

/// Caller misuse of the extraction entry point.
///
/// Environment failures (lookup or fetch) never surface here; they are
/// reported inside a `success = false` [`CitationResult`](crate::CitationResult).
#[derive(Debug, Error)]
pub enum CitationError {
    #[error("article number must be positive, got {0}")]
    InvalidArticle(u32),

    #[error("cannot parse article reference: {0:?}")]
    UnparsableArticle(String),

    #[error("{0} must not be empty")]
    MissingField(&'static str),
}

/// Failure reported by a [`LawSource`](crate::LawSource) collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no site sequence id found for {0}")]
    SiteSeqNotFound(String),

    #[error("upstream returned {status}")]
    Status { status: u16 },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("empty response body")]
    EmptyBody,

    #[error("{0}")]
    Other(String),
}
