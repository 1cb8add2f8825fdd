//! Citation extraction and relevance ranking for Korean statutes (law.go.kr).

pub mod anchor;
pub mod article;
pub mod citation;
pub mod consolidate;
mod error;
pub mod extract;
pub mod ranking;

pub use anchor::{Anchor, classify, parse_citations, scan_anchors};
pub use article::{ArticleRef, format_article};
pub use citation::{Citation, CitationResult, Marker, Scope};
pub use consolidate::{ConsolidationState, consolidate};
pub use error::{CitationError, SourceError};
pub use extract::{CitationExtractor, ExtractorConfig, LawSource, SiteSeqCache};
pub use ranking::{
    Language, Record, choose_name_field, detect_language, rank, rank_if_applicable, should_rank,
};
