//! Article references for Korean statutes.
//!
//! Korean statutes number articles as 제N조. Articles inserted by amendment
//! between two existing ones take a branch suffix: 제37조의2 sits between
//! 제37조 and 제38조.
//!
//! # Forms accepted by [`ArticleRef::from_str`]
//!
//! - Bare number: "3"
//! - Number with branch: "37-2", "37의2"
//! - Display form: "제3조", "제37조의2"

use std::fmt;
use std::str::FromStr;

use crate::CitationError;

/// An article number plus optional branch (조가지번호). A branch of 0 means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArticleRef {
    pub number: u32,
    pub branch: u32,
}

impl ArticleRef {
    pub fn new(number: u32, branch: u32) -> Self {
        Self { number, branch }
    }

    /// Article number as the side-panel endpoint expects it: 4 digits, "0003".
    pub fn padded_number(&self) -> String {
        format!("{:04}", self.number)
    }

    /// Branch as the side-panel endpoint expects it: 2 digits, "02" for 조의2.
    pub fn padded_branch(&self) -> String {
        format!("{:02}", self.branch)
    }

    /// Reject article 0, which no statute has.
    pub fn validate(&self) -> Result<(), CitationError> {
        if self.number == 0 {
            return Err(CitationError::InvalidArticle(self.number));
        }
        Ok(())
    }
}

/// "제3조" for branch 0, "제37조의2" otherwise.
impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "제{}조", self.number)?;
        if self.branch > 0 {
            write!(f, "의{}", self.branch)?;
        }
        Ok(())
    }
}

/// Format an article number and branch for display.
pub fn format_article(number: u32, branch: u32) -> String {
    ArticleRef::new(number, branch).to_string()
}

impl FromStr for ArticleRef {
    type Err = CitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CitationError::UnparsableArticle(s.to_string());

        let trimmed = s.trim();
        let body = trimmed.strip_prefix('제').unwrap_or(trimmed);

        // "37조의2" / "37의2" / "37-2" / "37"
        let (number_part, branch_part) = match body.split_once('조') {
            Some((n, rest)) => {
                let rest = rest.trim();
                if rest.is_empty() {
                    (n, None)
                } else {
                    (n, Some(rest.strip_prefix('의').ok_or_else(invalid)?))
                }
            }
            None => match body.split_once(['의', '-']) {
                Some((n, b)) => (n, Some(b)),
                None => (body, None),
            },
        };

        let number: u32 = number_part.trim().parse().map_err(|_| invalid())?;
        let branch: u32 = match branch_part {
            Some(b) => b.trim().parse().map_err(|_| invalid())?,
            None => 0,
        };

        let article = ArticleRef::new(number, branch);
        article.validate()?;
        Ok(article)
    }
}
