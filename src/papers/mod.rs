//! Article listing, link lookup, reconciliation and download for one journal issue
//!
//! Flow per run:
//! 1. `articles` asks the model for the issue's table of contents
//! 2. `links` asks the model for a working-paper URL per article
//! 3. `resolver` pairs each article with a link record
//! 4. `download` fetches each resolved URL into the issue folder
//! 5. `report` writes the Markdown table next to the downloads

pub mod articles;
pub mod links;
pub mod response;
pub mod resolver;
pub mod download;
pub mod report;

use std::path::{Path, PathBuf};

use crate::utils::sanitize_filename;

/// Literal the model uses (and we use) when no accessible link exists
pub const NOT_FOUND: &str = "Not found";

pub const UNKNOWN_TITLE: &str = "Unknown title";
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// One article of the issue as listed by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub author: String,
}

/// One entry of the model's link list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub article_name: String,
    pub working_paper_link: String,
}

impl LinkRecord {
    pub fn has_link(&self) -> bool {
        self.working_paper_link != NOT_FOUND
    }
}

/// Result of downloading (or skipping) one article
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub article: ArticleRecord,
    pub succeeded: bool,
    pub saved_path: Option<PathBuf>,
}

/// Journal name and issue label, as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub journal: String,
    pub issue: String,
}

impl IssueRef {
    pub fn new(journal: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            journal: journal.into(),
            issue: issue.into(),
        }
    }

    /// `{root}/{journal}/{issue}` with both components sanitized
    pub fn issue_dir(&self, root: &Path) -> PathBuf {
        root.join(sanitize_filename(&self.journal))
            .join(sanitize_filename(&self.issue))
    }

    /// Sanitized base name (no extension) for an article's file
    pub fn file_stem(&self, article: &ArticleRecord) -> String {
        sanitize_filename(&format!(
            "{} - {} - {} {}",
            article.title, article.author, self.journal, self.issue
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_dir_sanitizes_components() {
        let issue = IssueRef::new("Journal: of Things?", "2025/4");
        assert_eq!(
            issue.issue_dir(Path::new("downloads")),
            Path::new("downloads").join("Journal of Things").join("20254")
        );
    }

    #[test]
    fn test_file_stem_layout() {
        let issue = IssueRef::new("JPE", "2025, Issue 4");
        let article = ArticleRecord {
            title: "A Study of X".to_string(),
            author: "Smith".to_string(),
        };
        assert_eq!(issue.file_stem(&article), "A Study of X - Smith - JPE 2025, Issue 4");
    }

    #[test]
    fn test_link_record_sentinel() {
        let found = LinkRecord {
            article_name: "A".to_string(),
            working_paper_link: "http://example.com/a.pdf".to_string(),
        };
        let missing = LinkRecord {
            article_name: "B".to_string(),
            working_paper_link: NOT_FOUND.to_string(),
        };
        assert!(found.has_link());
        assert!(!missing.has_link());
    }
}
