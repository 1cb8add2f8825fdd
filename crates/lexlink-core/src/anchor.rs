//! Citation anchors in law.go.kr article HTML.
//!
//! law.go.kr pre-links every citation in an article's side panel. Each piece
//! of a citation gets its own `<a>` element:
//!
//! ```html
//! <a class="link sfon1" onclick="fncLsLawPop('1234','ALLJO','')">「형법」</a>
//! <a class="link sfon2" onclick="fncLsLawPop('1234','JO','')">제20조</a>
//! <a class="link sfon3" onclick="fncLsLawPop('1234','JO','')">제1항</a>
//! ```
//!
//! [`scan_anchors`] recovers the raw anchors in document order and
//! [`classify`] turns one anchor into a typed [`Citation`] fragment. Merging
//! fragments into complete citations is [`consolidate`](crate::consolidate)'s job.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::citation::{Citation, Marker, Scope};

static POPUP_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"fncLsLawPop\s*\(\s*['"](\d+)['"].*?['"](\w+)['"]"#).expect("valid regex")
});
static LAW_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"「([^」]+)」").expect("valid regex"));
static ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"제(\d+)조(?:의(\d+))?").expect("valid regex"));
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"제(\d+)항").expect("valid regex"));
static ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"제(\d+)호").expect("valid regex"));
/// Sub-item letters run 가 to 하; the letter directly follows `제N호` or
/// stands alone, so words such as 각목 or 항목 do not match.
static SUBITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^가-힣]|\d호)([가나다라마바사아자차카타파하])목").expect("valid regex")
});

/// Phrases that refer back to the statute being read.
const SAME_LAW_PHRASES: &[&str] = &["같은 법", "이 법"];

/// A raw hyperlink as it appears in the article HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Visible text, trimmed.
    pub text: String,
    /// The `onclick` popup directive.
    pub directive: String,
    /// CSS classes in attribute order.
    pub classes: Vec<String>,
}

impl Anchor {
    pub fn new(text: impl Into<String>, directive: impl Into<String>, classes: &[&str]) -> Self {
        Self {
            text: text.into(),
            directive: directive.into(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The first `sfon*` class, if any.
    fn sfon_class(&self) -> Option<&str> {
        self.classes
            .iter()
            .map(String::as_str)
            .find(|c| c.starts_with("sfon"))
    }
}

/// Find every citation anchor in `html`, in document order.
///
/// An anchor qualifies when its class attribute mentions both `link` and
/// `sfon`. Whether it is actually a citation is decided later by [`classify`].
pub fn scan_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_fragment(html);
    let selector = match Selector::parse("a[class]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let class_attr = el.value().attr("class")?;
            if !(class_attr.contains("link") && class_attr.contains("sfon")) {
                return None;
            }
            Some(Anchor {
                text: el.text().map(str::trim).collect(),
                directive: el.value().attr("onclick").unwrap_or_default().to_string(),
                classes: class_attr.split_whitespace().map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Turn one anchor into a citation fragment.
///
/// Returns `None` when the anchor carries no `fncLsLawPop('id','kind',..)`
/// directive or no recognised `sfon1`..`sfon4` class. A recognised anchor
/// whose text lacks the expected number still yields a fragment, with the
/// structural field left unset.
///
/// `source_law_name` is the statute being read; "이 법" and "같은 법"
/// resolve to it.
pub fn classify(anchor: &Anchor, source_law_name: &str) -> Option<Citation> {
    let caps = POPUP_DIRECTIVE.captures(&anchor.directive)?;
    let reference_id = &caps[1];
    let reference_kind = &caps[2];

    let Some(marker) = anchor.sfon_class().and_then(Marker::from_class) else {
        debug!(text = %anchor.text, classes = ?anchor.classes, "anchor has no citation marker");
        return None;
    };

    let text = anchor.text.as_str();
    let mut citation = Citation::fragment(text, reference_id, reference_kind, marker);

    match marker {
        Marker::LawName => {
            if let Some(m) = LAW_NAME.captures(text) {
                citation.law_name = Some(m[1].to_string());
                citation.scope = Scope::External;
            } else if SAME_LAW_PHRASES.iter().any(|p| text.contains(p)) {
                citation.law_name = Some(source_law_name.to_string());
                citation.scope = Scope::Internal;
            } else {
                citation.law_name = Some(text.to_string());
                citation.scope = Scope::External;
            }
        }
        Marker::Article => {
            citation.scope = Scope::Internal;
            if let Some(m) = ARTICLE.captures(text) {
                citation.article = parse_number(m.get(1).map(|g| g.as_str()));
                if citation.article.is_some() {
                    citation.article_branch = parse_number(m.get(2).map(|g| g.as_str()));
                }
            }
        }
        Marker::Paragraph => {
            citation.scope = Scope::Internal;
            citation.paragraph = PARAGRAPH
                .captures(text)
                .and_then(|m| parse_number(m.get(1).map(|g| g.as_str())));
        }
        Marker::Item => {
            citation.scope = Scope::Internal;
            citation.item = ITEM
                .captures(text)
                .and_then(|m| parse_number(m.get(1).map(|g| g.as_str())));
            citation.subitem = SUBITEM.captures(text).map(|m| m[1].to_string());
        }
    }

    Some(citation)
}

/// Scan `html` and classify every anchor, skipping the ones that are not
/// citations. The result is the unconsolidated fragment list.
pub fn parse_citations(html: &str, source_law_name: &str) -> Vec<Citation> {
    scan_anchors(html)
        .iter()
        .filter_map(|a| classify(a, source_law_name))
        .collect()
}

/// Positive integer or nothing. Overflowing digit runs count as absent.
fn parse_number(digits: Option<&str>) -> Option<u32> {
    digits?.parse::<u32>().ok().filter(|n| *n > 0)
}
