//! Sequential consolidation of citation fragments.
//!
//! law.go.kr links each part of a citation separately, so
//! "「형법」 제20조제1항" arrives as three fragments. [`consolidate`] folds the
//! fragments, in document order, into complete citation records.
//!
//! # Rules
//!
//! - A law-name fragment always starts a new record and a new context.
//! - An article right after an external law name (that has no article yet)
//!   completes that law's record. Any other article is a new internal record.
//! - A paragraph or item completes the current external record, or failing
//!   that the last internal article. If the record already carries the same
//!   kind of value ("제1항 및 제3항"), the fragment becomes a sibling record
//!   with the same law and article instead of overwriting it.
//! - With no context, a paragraph or item stands alone as internal.

use crate::citation::{Citation, Marker, Scope};

/// Context carried from one fragment to the next during a fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationState {
    /// Law name of the external record that articles, paragraphs and items
    /// may still attach to.
    pub pending_external_law: Option<String>,
    /// Output index of the standalone internal article that paragraphs and
    /// items may still attach to.
    pub pending_internal_index: Option<usize>,
}

/// Merge an ordered fragment list into complete citations.
///
/// Deterministic, and idempotent on its own output.
pub fn consolidate(fragments: impl IntoIterator<Item = Citation>) -> Vec<Citation> {
    let (consolidated, _) = fragments.into_iter().fold(
        (Vec::new(), ConsolidationState::default()),
        |(mut out, mut state), fragment| {
            state.apply(&mut out, fragment);
            (out, state)
        },
    );
    consolidated
}

impl ConsolidationState {
    /// Fold one fragment into `out`.
    pub fn apply(&mut self, out: &mut Vec<Citation>, fragment: Citation) {
        match fragment.marker {
            Marker::LawName => self.apply_law_name(out, fragment),
            Marker::Article => self.apply_article(out, fragment),
            Marker::Paragraph | Marker::Item => self.apply_detail(out, fragment),
        }
    }

    fn apply_law_name(&mut self, out: &mut Vec<Citation>, fragment: Citation) {
        self.pending_internal_index = None;
        self.pending_external_law = if fragment.is_external() {
            fragment.law_name.clone()
        } else {
            None
        };
        out.push(fragment);
    }

    fn apply_article(&mut self, out: &mut Vec<Citation>, mut fragment: Citation) {
        if let Some(last) = self.external_target(out)
            && out[last].article.is_none()
        {
            let target = &mut out[last];
            target.article = fragment.article;
            target.article_branch = fragment.article_branch;
            append_text(target, &fragment.display_text);
            self.pending_internal_index = None;
            return;
        }

        self.pending_external_law = None;
        fragment.scope = Scope::Internal;
        out.push(fragment);
        self.pending_internal_index = Some(out.len() - 1);
    }

    fn apply_detail(&mut self, out: &mut Vec<Citation>, mut fragment: Citation) {
        let target = self
            .external_target(out)
            .map(|idx| (idx, Scope::External))
            .or_else(|| self.internal_target(out).map(|idx| (idx, Scope::Internal)));

        let Some((idx, scope)) = target else {
            fragment.scope = Scope::Internal;
            out.push(fragment);
            return;
        };

        let existing = &out[idx];
        let collides = (fragment.paragraph.is_some() && existing.paragraph.is_some())
            || (fragment.item.is_some() && existing.item.is_some())
            || (fragment.subitem.is_some() && existing.subitem.is_some());

        if collides {
            let sibling = sibling_of(existing, fragment, scope);
            out.push(sibling);
        } else {
            let target = &mut out[idx];
            if fragment.paragraph.is_some() {
                target.paragraph = fragment.paragraph;
            }
            if fragment.item.is_some() {
                target.item = fragment.item;
            }
            if fragment.subitem.is_some() {
                target.subitem = fragment.subitem;
            }
            append_text(target, &fragment.display_text);
        }
    }

    /// The last output entry, if it is the external record of the pending law.
    fn external_target(&self, out: &[Citation]) -> Option<usize> {
        let law = self.pending_external_law.as_ref()?;
        let idx = out.len().checked_sub(1)?;
        let last = &out[idx];
        (last.is_external() && last.law_name.as_ref() == Some(law)).then_some(idx)
    }

    fn internal_target(&self, out: &[Citation]) -> Option<usize> {
        self.pending_internal_index
            .filter(|&idx| out.get(idx).is_some_and(Citation::is_internal))
    }
}

/// A second paragraph or item under the same law and article as `target`.
///
/// Law and article come from the target unless the fragment already names
/// its own, which only happens when re-consolidating consolidated records.
/// A bare sub-item ("나목") also stays under the target's paragraph and item.
fn sibling_of(target: &Citation, fragment: Citation, scope: Scope) -> Citation {
    let (article, article_branch) = match fragment.article {
        Some(_) => (fragment.article, fragment.article_branch),
        None => (target.article, target.article_branch),
    };
    let (paragraph, item) = if fragment.subitem.is_some()
        && fragment.item.is_none()
        && fragment.paragraph.is_none()
    {
        (target.paragraph, target.item)
    } else {
        (fragment.paragraph, fragment.item)
    };
    Citation {
        law_name: fragment.law_name.or_else(|| target.law_name.clone()),
        article,
        article_branch,
        paragraph,
        item,
        scope,
        ..fragment
    }
}

fn append_text(target: &mut Citation, text: &str) {
    target.display_text.push(' ');
    target.display_text.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn law(text: &str, name: &str, scope: Scope) -> Citation {
        let mut c = Citation::fragment(text, "100", "ALLJO", Marker::LawName);
        c.law_name = Some(name.into());
        c.scope = scope;
        c
    }

    fn external_law(name: &str) -> Citation {
        law(&format!("「{name}」"), name, Scope::External)
    }

    fn article(n: u32) -> Citation {
        let mut c = Citation::fragment(format!("제{n}조"), "100", "JO", Marker::Article);
        c.article = Some(n);
        c.scope = Scope::Internal;
        c
    }

    fn article_branch(n: u32, b: u32) -> Citation {
        let mut c = article(n);
        c.display_text = format!("제{n}조의{b}");
        c.article_branch = Some(b);
        c
    }

    fn paragraph(n: u32) -> Citation {
        let mut c = Citation::fragment(format!("제{n}항"), "100", "JO", Marker::Paragraph);
        c.paragraph = Some(n);
        c.scope = Scope::Internal;
        c
    }

    fn item(n: u32) -> Citation {
        let mut c = Citation::fragment(format!("제{n}호"), "100", "JO", Marker::Item);
        c.item = Some(n);
        c.scope = Scope::Internal;
        c
    }

    #[test]
    fn empty_input() {
        assert!(consolidate(Vec::new()).is_empty());
    }

    #[test]
    fn external_law_article_paragraph_merge() {
        let out = consolidate(vec![external_law("형법"), article(20), paragraph(1)]);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.law_name.as_deref(), Some("형법"));
        assert_eq!(c.article, Some(20));
        assert_eq!(c.paragraph, Some(1));
        assert_eq!(c.scope, Scope::External);
        assert_eq!(c.display_text, "「형법」 제20조 제1항");
    }

    #[test]
    fn external_branch_article_merges() {
        let out = consolidate(vec![external_law("민법"), article_branch(37, 2)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].article, Some(37));
        assert_eq!(out[0].article_branch, Some(2));
    }

    #[test]
    fn internal_paragraphs_fork() {
        let out = consolidate(vec![article(20), paragraph(1), paragraph(3)]);
        assert_eq!(out.len(), 2);
        for c in &out {
            assert_eq!(c.scope, Scope::Internal);
            assert_eq!(c.article, Some(20));
        }
        assert_eq!(out[0].paragraph, Some(1));
        assert_eq!(out[1].paragraph, Some(3));
        assert_eq!(out[0].display_text, "제20조 제1항");
        assert_eq!(out[1].display_text, "제3항");
    }

    #[test]
    fn external_paragraphs_fork() {
        let out = consolidate(vec![
            external_law("형법"),
            article(20),
            paragraph(1),
            paragraph(3),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].law_name.as_deref(), Some("형법"));
        assert_eq!(out[1].article, Some(20));
        assert_eq!(out[1].paragraph, Some(3));
        assert_eq!(out[1].scope, Scope::External);
        assert_eq!(out[0].paragraph, Some(1));
    }

    #[test]
    fn item_after_external_fork_attaches_to_fork() {
        let out = consolidate(vec![
            external_law("형법"),
            article(20),
            paragraph(1),
            paragraph(3),
            item(2),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item, None);
        assert_eq!(out[1].paragraph, Some(3));
        assert_eq!(out[1].item, Some(2));
    }

    #[test]
    fn paragraph_then_item_merge_into_internal_article() {
        let out = consolidate(vec![article(5), paragraph(2), item(1)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].article, Some(5));
        assert_eq!(out[0].paragraph, Some(2));
        assert_eq!(out[0].item, Some(1));
    }

    #[test]
    fn items_fork_under_internal_article() {
        let out = consolidate(vec![article(5), item(1), item(2), item(3)]);
        assert_eq!(out.len(), 3);
        let items: Vec<_> = out.iter().map(|c| c.item).collect();
        assert_eq!(items, vec![Some(1), Some(2), Some(3)]);
        assert!(out.iter().all(|c| c.article == Some(5)));
    }

    #[test]
    fn subitem_follows_item() {
        let mut sub = item(3);
        sub.subitem = Some("가".into());
        let out = consolidate(vec![article(2), sub]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].item, Some(3));
        assert_eq!(out[0].subitem.as_deref(), Some("가"));
    }

    #[test]
    fn second_subitem_forks_under_same_item() {
        let mut first = item(2);
        first.display_text = "제2호가목".into();
        first.subitem = Some("가".into());
        let mut second = Citation::fragment("나목", "100", "JO", Marker::Item);
        second.subitem = Some("나".into());
        second.scope = Scope::Internal;

        let out = consolidate(vec![article(5), first, second]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].display_text, "제5조 제2호가목");
        assert_eq!(out[0].subitem.as_deref(), Some("가"));
        assert_eq!(out[1].display_text, "나목");
        assert_eq!(out[1].article, Some(5));
        assert_eq!(out[1].item, Some(2));
        assert_eq!(out[1].subitem.as_deref(), Some("나"));
        assert_eq!(consolidate(out.clone()), out);
    }

    #[test]
    fn second_article_after_external_is_internal() {
        let out = consolidate(vec![external_law("형법"), article(20), article(21)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].article, Some(20));
        assert_eq!(out[1].article, Some(21));
        assert_eq!(out[1].scope, Scope::Internal);
        assert_eq!(out[1].law_name, None);
    }

    #[test]
    fn law_name_resets_context() {
        let out = consolidate(vec![
            article(3),
            external_law("형법"),
            paragraph(1),
            law("이 법", "민법", Scope::Internal),
            paragraph(2),
        ]);
        // 제1항 belongs to 형법, 제2항 has no article to attach to.
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].paragraph, None);
        assert_eq!(out[1].paragraph, Some(1));
        assert_eq!(out[1].law_name.as_deref(), Some("형법"));
        assert_eq!(out[2].paragraph, None);
        assert_eq!(out[3].paragraph, Some(2));
        assert_eq!(out[3].article, None);
        assert_eq!(out[3].scope, Scope::Internal);
    }

    #[test]
    fn internal_law_name_does_not_capture_article() {
        let out = consolidate(vec![law("같은 법", "민법", Scope::Internal), article(7)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].article, None);
        assert_eq!(out[1].article, Some(7));
    }

    #[test]
    fn standalone_paragraph_is_internal() {
        let mut p = paragraph(4);
        p.scope = Scope::Unknown;
        let out = consolidate(vec![p]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].scope, Scope::Internal);
    }

    #[test]
    fn unparsed_fragments_still_merge() {
        let mut same_article = article(1);
        same_article.article = None;
        same_article.display_text = "같은 조".into();
        let mut prior_paragraph = paragraph(1);
        prior_paragraph.paragraph = None;
        prior_paragraph.display_text = "전항".into();

        let out = consolidate(vec![external_law("형법"), same_article, prior_paragraph]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].display_text, "「형법」 같은 조 전항");
        assert_eq!(out[0].article, None);
        assert_eq!(out[0].paragraph, None);
    }

    #[test]
    fn idempotent_on_own_output() {
        let inputs = vec![
            vec![external_law("형법"), article(20), paragraph(1)],
            vec![article(20), paragraph(1), paragraph(3), item(2)],
            vec![
                external_law("형법"),
                article(20),
                paragraph(1),
                paragraph(3),
                item(2),
                law("이 법", "민법", Scope::Internal),
                article(4),
                item(1),
                item(5),
            ],
            vec![external_law("형법"), paragraph(1), paragraph(3), article(20)],
            vec![paragraph(1), external_law("민법"), article(3), article(4)],
        ];
        for input in inputs {
            let once = consolidate(input);
            let twice = consolidate(once.clone());
            assert_eq!(twice, once);
        }
    }
}
