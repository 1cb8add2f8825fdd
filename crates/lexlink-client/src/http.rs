//! HTTP client for the law.go.kr web pages citation extraction needs.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use lexlink_core::{ArticleRef, LawSource, SourceError};
use regex::Regex;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info, warn};

static LSI_SEQ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lsiSeq=(\d+)").expect("valid regex"));

/// Longest slice of an error response body kept in [`ClientError::Server`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Accepted request timeout range, in seconds.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 5..=60;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request to law.go.kr timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("no lsiSeq found on the law page for {0}")]
    SiteSeqMissing(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Actionable suggestions for the caller, keyed on the failure.
    pub fn hints(&self) -> Vec<&'static str> {
        match self {
            Self::Timeout { .. } => vec![
                "The upstream service may be slow or unavailable",
                "Retry after a few seconds",
                "Consider increasing the timeout",
            ],
            Self::Server { status, .. } => match status {
                403 => vec![
                    "Check that the request is allowed from this network",
                    "Check if your IP is blocked by law.go.kr",
                ],
                404 => vec![
                    "Verify the law name and article exist",
                    "Search for the law first to get its exact name",
                ],
                429 => vec![
                    "Rate limit exceeded - too many requests",
                    "Wait a few seconds before retrying",
                    "Increase the request delay",
                ],
                500 => vec!["law.go.kr internal error", "Retry after a few seconds"],
                502 => vec![
                    "law.go.kr gateway error - service may be down",
                    "Retry after a minute",
                ],
                503 => vec![
                    "law.go.kr service unavailable",
                    "Service may be undergoing maintenance",
                ],
                _ => vec!["Unexpected HTTP status - check logs for details"],
            },
            Self::SiteSeqMissing(_) => vec![
                "Check the exact law name (e.g. 민법, not 민법전)",
                "The law page layout may have changed",
            ],
            Self::Http(_) | Self::InvalidUrl(_) | Self::InvalidConfig(_) => Vec::new(),
        }
    }
}

impl From<ClientError> for SourceError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Timeout { secs } => SourceError::Timeout(secs),
            ClientError::Server { status, .. } => SourceError::Status { status },
            ClientError::SiteSeqMissing(name) => SourceError::SiteSeqNotFound(name),
            other => SourceError::Other(other.to_string()),
        }
    }
}

/// Connection settings for [`LawClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root, e.g. `https://www.law.go.kr`.
    pub base_url: String,
    /// Per-request timeout in seconds, within [`TIMEOUT_RANGE`].
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.law.go.kr".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Client for the law page and article side panel of law.go.kr.
pub struct LawClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl LawClient {
    /// Build a client. Trailing slashes on the base URL are dropped.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if !TIMEOUT_RANGE.contains(&config.timeout_secs) {
            return Err(ClientError::InvalidConfig(format!(
                "timeout must be between {} and {} seconds, got {}",
                TIMEOUT_RANGE.start(),
                TIMEOUT_RANGE.end(),
                config.timeout_secs
            )));
        }
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
        })
    }

    /// `{base}/법령/{law_name}`, with the name as one encoded path segment.
    pub fn law_page_url(&self, law_name: &str) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("법령")
            .push(law_name);
        Ok(url)
    }

    /// Side-panel URL for one article: `joNo` is 4 digits, `joBrNo` 2.
    pub fn article_url(&self, site_seq: &str, article: ArticleRef) -> Result<Url, ClientError> {
        Url::parse_with_params(
            &format!("{}/LSW/lsSideInfoP.do", self.base_url),
            &[
                ("lsiSeq", site_seq),
                ("joNo", article.padded_number().as_str()),
                ("joBrNo", article.padded_branch().as_str()),
                ("docCls", "jo"),
                ("urlMode", "lsScJoRltInfoR"),
            ],
        )
        .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    /// Look up the `lsiSeq` of a law from its public page.
    pub async fn fetch_site_seq(&self, law_name: &str) -> Result<String, ClientError> {
        let url = self.law_page_url(law_name)?;
        info!(url = %url, "fetching law page");
        let html = self.get_text(url).await?;
        extract_site_seq(&html).ok_or_else(|| ClientError::SiteSeqMissing(law_name.to_string()))
    }

    /// Fetch the side-panel HTML of one article.
    pub async fn fetch_article_html(
        &self,
        site_seq: &str,
        article: ArticleRef,
    ) -> Result<String, ClientError> {
        let url = self.article_url(site_seq, article)?;
        info!(url = %url, article = %article, "fetching article html");
        self.get_text(url).await
    }

    async fn get_text(&self, url: Url) -> Result<String, ClientError> {
        let resp = self.client.get(url).send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        let text = resp.text().await.map_err(|e| self.classify(e))?;
        debug!(status = status.as_u16(), bytes = text.len(), "response received");
        Ok(text)
    }

    fn classify(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ClientError::Http(e)
        }
    }
}

/// Collapse whitespace and cap an upstream error page for logs and messages.
fn truncate_body(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

/// First `lsiSeq=NNN` on a law page (iframe src or inline script).
pub fn extract_site_seq(html: &str) -> Option<String> {
    LSI_SEQ.captures(html).map(|c| c[1].to_string())
}

#[async_trait]
impl LawSource for LawClient {
    async fn site_sequence_id(&self, law_name: &str, law_id: &str) -> Result<String, SourceError> {
        self.fetch_site_seq(law_name).await.map_err(|e| {
            warn!(law_id, law_name, error = %e, hints = ?e.hints(), "law page lookup failed");
            e.into()
        })
    }

    async fn article_html(
        &self,
        site_seq: &str,
        article: ArticleRef,
    ) -> Result<String, SourceError> {
        self.fetch_article_html(site_seq, article).await.map_err(|e| {
            warn!(site_seq, article = %article, error = %e, hints = ?e.hints(), "article fetch failed");
            e.into()
        })
    }
}
