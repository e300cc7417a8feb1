//! Markdown report of an issue's articles and their links

use crate::error::Result;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use super::resolver::resolve;
use super::{ArticleRecord, IssueRef, LinkRecord};

pub const REPORT_FILE: &str = "articles_table.md";

/// Escape pipes so cell text cannot split a table row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Render the article table. Every article gets exactly one row, with the
/// link chosen by the same `resolve` the downloader uses.
pub fn build_markdown_table(issue: &IssueRef, articles: &[ArticleRecord], links: &[LinkRecord]) -> String {
    let mut markdown = format!("# {} {} Articles\n\n", issue.journal, issue.issue);
    markdown.push_str(&format!("_Generated {}_\n\n", Local::now().format("%Y-%m-%d %H:%M")));
    markdown.push_str("| Title | Author | Paper Link |\n");
    markdown.push_str("|------|------|----------|\n");

    for article in articles {
        let link = resolve(&article.title, links);
        markdown.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&article.title),
            escape_cell(&article.author),
            link
        ));
    }

    markdown
}

/// Write the report to `{root}/{journal}/{issue}/articles_table.md`
pub fn write_report(root: &Path, issue: &IssueRef, markdown: &str) -> Result<PathBuf> {
    let save_dir = issue.issue_dir(root);
    fs::create_dir_all(&save_dir)?;

    let path = save_dir.join(REPORT_FILE);
    fs::write(&path, markdown)?;

    tracing::info!("[Report] Article table saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::NOT_FOUND;

    fn article(title: &str, author: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[test]
    fn test_table_rows() {
        let issue = IssueRef::new("JPE", "2025, Issue 4");
        let articles = vec![article("A Study of X", "Smith"), article("Unlinked", "Jones")];
        let links = vec![LinkRecord {
            article_name: "A Study of X".to_string(),
            working_paper_link: "http://example.com/x.pdf".to_string(),
        }];

        let table = build_markdown_table(&issue, &articles, &links);

        assert!(table.starts_with("# JPE 2025, Issue 4 Articles\n"));
        assert!(table.contains("| Title | Author | Paper Link |\n|------|------|----------|\n"));
        assert!(table.contains("| A Study of X | Smith | http://example.com/x.pdf |\n"));
        assert!(table.contains(&format!("| Unlinked | Jones | {} |\n", NOT_FOUND)));
    }

    #[test]
    fn test_pipes_are_escaped() {
        let issue = IssueRef::new("JPE", "1");
        let articles = vec![article("Either | Or", "A|B")];
        let table = build_markdown_table(&issue, &articles, &[]);
        assert!(table.contains("| Either \\| Or | A\\|B | Not found |"));
    }

    #[test]
    fn test_one_row_per_article_even_duplicates() {
        let issue = IssueRef::new("JPE", "1");
        let articles = vec![article("Same", "A"), article("Same", "B")];
        let table = build_markdown_table(&issue, &articles, &[]);
        let rows = table.lines().filter(|l| l.starts_with("| Same |")).count();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueRef::new("Journal: Of Tests", "2025?");
        let path = write_report(dir.path(), &issue, "# table\n").unwrap();

        assert_eq!(path, dir.path().join("Journal Of Tests").join("2025").join(REPORT_FILE));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# table\n");
    }
}
