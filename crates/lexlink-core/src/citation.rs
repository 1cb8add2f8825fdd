//! Citation records and the extraction result envelope.

use serde::Serialize;

/// Whether a citation points inside the statute being read or at another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Internal,
    External,
    #[default]
    Unknown,
}

/// The `sfon` CSS class that produced a fragment.
///
/// law.go.kr marks each piece of a citation with its own anchor:
/// `sfon1` law name, `sfon2` article, `sfon3` paragraph, `sfon4` item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    LawName,
    Article,
    Paragraph,
    Item,
}

impl Marker {
    /// Map an `sfonN` class name to its marker.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "sfon1" => Some(Self::LawName),
            "sfon2" => Some(Self::Article),
            "sfon3" => Some(Self::Paragraph),
            "sfon4" => Some(Self::Item),
            _ => None,
        }
    }

    pub fn as_class(&self) -> &'static str {
        match self {
            Self::LawName => "sfon1",
            Self::Article => "sfon2",
            Self::Paragraph => "sfon3",
            Self::Item => "sfon4",
        }
    }
}

/// One citation, either a raw fragment from a single anchor or a
/// consolidated record built from several.
///
/// Serialises with the response field names and omits every unset
/// optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    #[serde(rename = "raw_text")]
    pub display_text: String,
    #[serde(rename = "ref_id")]
    pub reference_id: String,
    /// `ALLJO` (whole law) or `JO` (article), as given by the popup directive.
    #[serde(skip)]
    pub reference_kind: String,

    #[serde(rename = "target_law_name", skip_serializing_if = "Option::is_none")]
    pub law_name: Option<String>,
    #[serde(rename = "target_article", skip_serializing_if = "Option::is_none")]
    pub article: Option<u32>,
    #[serde(rename = "target_article_branch", skip_serializing_if = "Option::is_none")]
    pub article_branch: Option<u32>,
    #[serde(rename = "target_paragraph", skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<u32>,
    #[serde(rename = "target_item", skip_serializing_if = "Option::is_none")]
    pub item: Option<u32>,
    #[serde(rename = "target_subitem", skip_serializing_if = "Option::is_none")]
    pub subitem: Option<String>,

    #[serde(rename = "type")]
    pub scope: Scope,
    #[serde(skip)]
    pub marker: Marker,
}

impl Citation {
    /// A fragment with only the anchor-level fields set.
    pub fn fragment(
        display_text: impl Into<String>,
        reference_id: impl Into<String>,
        reference_kind: impl Into<String>,
        marker: Marker,
    ) -> Self {
        Self {
            display_text: display_text.into(),
            reference_id: reference_id.into(),
            reference_kind: reference_kind.into(),
            law_name: None,
            article: None,
            article_branch: None,
            paragraph: None,
            item: None,
            subitem: None,
            scope: Scope::Unknown,
            marker,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.scope == Scope::Internal
    }

    pub fn is_external(&self) -> bool {
        self.scope == Scope::External
    }
}

/// Result of extracting the citations of one article.
///
/// `success = true` with zero citations means the article cites nothing;
/// `success = false` means the article could not be fetched and `errors`
/// says why.
#[derive(Debug, Clone, Serialize)]
pub struct CitationResult {
    pub success: bool,
    pub law_id: String,
    pub law_name: String,
    /// Display form, e.g. "제3조" or "제37조의2".
    pub article: String,
    pub citation_count: usize,
    pub citations: Vec<Citation>,
    pub internal_count: usize,
    pub external_count: usize,
    pub extraction_method: &'static str,
    pub processing_time_ms: f64,
    pub errors: Vec<String>,
}

impl CitationResult {
    /// Envelope for a successful extraction.
    pub fn found(
        law_id: &str,
        law_name: &str,
        article: String,
        citations: Vec<Citation>,
        processing_time_ms: f64,
    ) -> Self {
        let internal_count = citations.iter().filter(|c| c.is_internal()).count();
        let external_count = citations.iter().filter(|c| c.is_external()).count();
        Self {
            success: true,
            law_id: law_id.to_string(),
            law_name: law_name.to_string(),
            article,
            citation_count: citations.len(),
            citations,
            internal_count,
            external_count,
            extraction_method: "html",
            processing_time_ms: round_ms(processing_time_ms),
            errors: Vec::new(),
        }
    }

    /// Envelope for a lookup or fetch failure.
    pub fn failed(
        law_id: &str,
        law_name: &str,
        article: String,
        error: String,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            success: false,
            law_id: law_id.to_string(),
            law_name: law_name.to_string(),
            article,
            citation_count: 0,
            citations: Vec::new(),
            internal_count: 0,
            external_count: 0,
            extraction_method: "html",
            processing_time_ms: round_ms(processing_time_ms),
            errors: vec![error],
        }
    }
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
