//! Article citation extraction pipeline.
//!
//! law.go.kr identifies a law by its MST (법령일련번호) in the Open API but by
//! a separate `lsiSeq` on its web pages, and the article side panel only
//! accepts the latter. Extraction therefore:
//!
//! 1. resolves the `lsiSeq` ("site sequence id") for the law, memoised;
//! 2. waits a short courtesy delay, then fetches the article's HTML;
//! 3. scans and classifies the citation anchors;
//! 4. consolidates the fragments and wraps them in a [`CitationResult`].
//!
//! Lookup and fetch failures are reported inside the result, never returned
//! as `Err`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::anchor::parse_citations;
use crate::article::ArticleRef;
use crate::citation::CitationResult;
use crate::consolidate::consolidate;
use crate::{CitationError, SourceError};

/// The two upstream calls extraction depends on.
#[async_trait]
pub trait LawSource: Send + Sync {
    /// Resolve the site sequence id of a law from its name and MST.
    async fn site_sequence_id(&self, law_name: &str, law_id: &str) -> Result<String, SourceError>;

    /// Fetch the side-panel HTML of one article.
    async fn article_html(
        &self,
        site_seq: &str,
        article: ArticleRef,
    ) -> Result<String, SourceError>;
}

/// Memo of law id to site sequence id.
///
/// Entries are never updated or evicted. The number of distinct laws an
/// agent touches in one process is small, so growth is left unbounded.
#[derive(Debug, Default)]
pub struct SiteSeqCache {
    entries: Mutex<HashMap<String, String>>,
}

impl SiteSeqCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, law_id: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(law_id)
            .cloned()
    }

    /// Insert unless present; returns the value now cached for `law_id`.
    pub fn insert_if_absent(&self, law_id: &str, site_seq: String) -> String {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(law_id.to_string())
            .or_insert(site_seq)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Pause between the lookup and the article fetch, to stay under
    /// law.go.kr's rate limits.
    pub request_delay: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Extracts consolidated citations from statute articles.
///
/// Cheap to share behind an `Arc`; concurrent extractions only contend on
/// the site sequence cache.
pub struct CitationExtractor<S> {
    source: S,
    cache: SiteSeqCache,
    config: ExtractorConfig,
}

impl<S: LawSource> CitationExtractor<S> {
    pub fn new(source: S, config: ExtractorConfig) -> Self {
        Self {
            source,
            cache: SiteSeqCache::new(),
            config,
        }
    }

    pub fn cache(&self) -> &SiteSeqCache {
        &self.cache
    }

    /// Extract all citations from one article of a law.
    ///
    /// `law_id` is the MST code; `law_name` is used for the site lookup and
    /// to resolve "이 법" references. Returns `Err` only for invalid
    /// arguments.
    pub async fn extract(
        &self,
        law_id: &str,
        law_name: &str,
        article: ArticleRef,
    ) -> Result<CitationResult, CitationError> {
        if law_id.trim().is_empty() {
            return Err(CitationError::MissingField("law_id"));
        }
        if law_name.trim().is_empty() {
            return Err(CitationError::MissingField("law_name"));
        }
        article.validate()?;

        let start = Instant::now();
        let article_label = article.to_string();
        let elapsed_ms = |start: Instant| start.elapsed().as_secs_f64() * 1000.0;

        let site_seq = match self.resolve_site_seq(law_id, law_name).await {
            Ok(seq) => seq,
            Err(e) => {
                warn!(law_id, law_name, error = %e, "site sequence lookup failed");
                return Ok(CitationResult::failed(
                    law_id,
                    law_name,
                    article_label,
                    format!(
                        "Could not get site sequence id for {law_name}. \
                         Law may not exist or name may be incorrect. ({e})"
                    ),
                    elapsed_ms(start),
                ));
            }
        };

        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        let html = match self.source.article_html(&site_seq, article).await {
            Ok(html) if !html.trim().is_empty() => html,
            result => {
                let e = result.err().unwrap_or(SourceError::EmptyBody);
                warn!(law_id, article = %article_label, error = %e, "article fetch failed");
                return Ok(CitationResult::failed(
                    law_id,
                    law_name,
                    article_label.clone(),
                    format!("Could not fetch HTML for {article_label}. Article may not exist. ({e})"),
                    elapsed_ms(start),
                ));
            }
        };

        let fragments = parse_citations(&html, law_name);
        let fragment_count = fragments.len();
        let citations = consolidate(fragments);

        let result =
            CitationResult::found(law_id, law_name, article_label, citations, elapsed_ms(start));
        info!(
            law_id,
            article = %result.article,
            fragments = fragment_count,
            citations = result.citation_count,
            internal = result.internal_count,
            external = result.external_count,
            "extracted citations"
        );
        Ok(result)
    }

    async fn resolve_site_seq(&self, law_id: &str, law_name: &str) -> Result<String, SourceError> {
        if let Some(seq) = self.cache.get(law_id) {
            debug!(law_id, site_seq = %seq, "site sequence cache hit");
            return Ok(seq);
        }
        let seq = self.source.site_sequence_id(law_name, law_id).await?;
        debug!(law_id, site_seq = %seq, "resolved site sequence id");
        Ok(self.cache.insert_if_absent(law_id, seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::Scope;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ARTICLE_HTML: &str = r#"
        <div class="pty1_p4">
          ① <a class="link sfon1" onclick="fncLsLawPop('001692','ALLJO','')">「형법」</a>
          <a class="link sfon2" onclick="fncLsLawPop('001692','JO','')">제20조</a>
          <a class="link sfon3" onclick="fncLsLawPop('001692','JO','')">제1항</a>에 따른
          <a class="link sfon2" onclick="fncLsLawPop('268611','JO','')">제3조</a>
          <a class="link sfon3" onclick="fncLsLawPop('268611','JO','')">제1항</a> 및
          <a class="link sfon3" onclick="fncLsLawPop('268611','JO','')">제3항</a>
        </div>"#;

    /// In-memory source that counts calls.
    #[derive(Default)]
    struct FakeSource {
        site_seq: Option<String>,
        html: Option<String>,
        lookups: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn serving(html: &str) -> Self {
            Self {
                site_seq: Some("2118".into()),
                html: Some(html.into()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl LawSource for FakeSource {
        async fn site_sequence_id(
            &self,
            law_name: &str,
            _law_id: &str,
        ) -> Result<String, SourceError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.site_seq
                .clone()
                .ok_or_else(|| SourceError::SiteSeqNotFound(law_name.to_string()))
        }

        async fn article_html(
            &self,
            site_seq: &str,
            _article: ArticleRef,
        ) -> Result<String, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            assert_eq!(Some(site_seq), self.site_seq.as_deref());
            self.html.clone().ok_or(SourceError::Status { status: 404 })
        }
    }

    fn extractor(source: FakeSource) -> CitationExtractor<FakeSource> {
        CitationExtractor::new(
            source,
            ExtractorConfig {
                request_delay: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn extracts_and_consolidates() {
        let ex = extractor(FakeSource::serving(ARTICLE_HTML));
        let result = ex
            .extract("268611", "민법", ArticleRef::new(37, 2))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.article, "제37조의2");
        assert_eq!(result.citation_count, 3);
        assert_eq!(result.external_count, 1);
        assert_eq!(result.internal_count, 2);

        let ext = &result.citations[0];
        assert_eq!(ext.scope, Scope::External);
        assert_eq!(ext.law_name.as_deref(), Some("형법"));
        assert_eq!(ext.article, Some(20));
        assert_eq!(ext.paragraph, Some(1));

        assert_eq!(result.citations[1].article, Some(3));
        assert_eq!(result.citations[1].paragraph, Some(1));
        assert_eq!(result.citations[2].article, Some(3));
        assert_eq!(result.citations[2].paragraph, Some(3));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn no_citations_is_success() {
        let ex = extractor(FakeSource::serving("<p>이 조에는 인용이 없다.</p>"));
        let result = ex.extract("268611", "민법", ArticleRef::new(1, 0)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.citation_count, 0);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_reported_in_envelope() {
        let ex = extractor(FakeSource::default());
        let result = ex.extract("1", "없는법", ArticleRef::new(3, 0)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.citation_count, 0);
        assert_eq!(result.article, "제3조");
        assert!(result.errors[0].contains("Could not get site sequence id for 없는법"));
        assert_eq!(ex.source.fetches.load(Ordering::SeqCst), 0);
        assert!(ex.cache().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_reported_in_envelope() {
        let ex = extractor(FakeSource {
            site_seq: Some("2118".into()),
            ..Default::default()
        });
        let result = ex.extract("268611", "민법", ArticleRef::new(999, 0)).await.unwrap();
        assert!(!result.success);
        assert!(result.citations.is_empty());
        assert!(result.errors[0].contains("Could not fetch HTML for 제999조"));
        assert!(result.errors[0].contains("404"));
    }

    #[tokio::test]
    async fn empty_body_is_a_fetch_failure() {
        let ex = extractor(FakeSource::serving("   "));
        let result = ex.extract("268611", "민법", ArticleRef::new(2, 0)).await.unwrap();
        assert!(!result.success);
        assert!(result.errors[0].contains("empty response body"));
    }

    #[tokio::test]
    async fn cache_skips_second_lookup() {
        let ex = extractor(FakeSource::serving(ARTICLE_HTML));
        ex.extract("268611", "민법", ArticleRef::new(1, 0)).await.unwrap();
        ex.extract("268611", "민법", ArticleRef::new(2, 0)).await.unwrap();
        assert_eq!(ex.source.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(ex.source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(ex.cache().get("268611").as_deref(), Some("2118"));
    }

    #[tokio::test]
    async fn concurrent_extractions_share_cache() {
        let ex = Arc::new(extractor(FakeSource::serving(ARTICLE_HTML)));
        let calls = (1..=8).map(|n| {
            let ex = Arc::clone(&ex);
            async move { ex.extract("268611", "민법", ArticleRef::new(n, 0)).await }
        });
        let results = futures::future::join_all(calls).await;
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|r| r.success)));
        assert_eq!(ex.cache().len(), 1);
    }

    #[tokio::test]
    async fn invalid_arguments_rejected() {
        let ex = extractor(FakeSource::serving(ARTICLE_HTML));
        assert!(matches!(
            ex.extract("268611", "민법", ArticleRef::new(0, 0)).await,
            Err(CitationError::InvalidArticle(0))
        ));
        assert!(matches!(
            ex.extract(" ", "민법", ArticleRef::new(1, 0)).await,
            Err(CitationError::MissingField("law_id"))
        ));
        assert!(matches!(
            ex.extract("268611", "", ArticleRef::new(1, 0)).await,
            Err(CitationError::MissingField("law_name"))
        ));
        assert_eq!(ex.source.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_request_delay_before_fetch() {
        let ex = CitationExtractor::new(
            FakeSource::serving(ARTICLE_HTML),
            ExtractorConfig {
                request_delay: Duration::from_millis(500),
            },
        );
        let start = tokio::time::Instant::now();
        let result = ex.extract("268611", "민법", ArticleRef::new(3, 0)).await.unwrap();
        assert!(result.success);
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(ex.source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_lookup_skips_delay() {
        let ex = CitationExtractor::new(
            FakeSource::default(),
            ExtractorConfig {
                request_delay: Duration::from_secs(5),
            },
        );
        let start = tokio::time::Instant::now();
        let result = ex.extract("1", "없는법", ArticleRef::new(3, 0)).await.unwrap();
        assert!(!result.success);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cache_insert_if_absent_keeps_first() {
        let cache = SiteSeqCache::new();
        assert_eq!(cache.insert_if_absent("1", "a".into()), "a");
        assert_eq!(cache.insert_if_absent("1", "b".into()), "a");
        assert_eq!(cache.len(), 1);
    }
}
