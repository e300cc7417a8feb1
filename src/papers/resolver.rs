//! Link Resolver - pairs article titles with the model's link records
//!
//! Tries rules in order, first hit wins:
//! 1. Exact title match
//! 2. Substring match in either direction (first record in list order)
//! 3. "Not found"
//!
//! Titles are compared verbatim. No case folding, whitespace or punctuation
//! normalization is done, so a title the model reworded between the two
//! queries will not match.

use super::{ArticleRecord, LinkRecord, NOT_FOUND};

/// Find the link for `title` among `links`, in priority order
pub fn resolve<'a>(title: &str, links: &'a [LinkRecord]) -> &'a str {
    // 1. Exact match anywhere in the list beats any substring match
    if let Some(record) = links.iter().find(|l| l.article_name == title) {
        return &record.working_paper_link;
    }

    // 2. First record containing the title, or contained in it
    if let Some(record) = links
        .iter()
        .find(|l| l.article_name.contains(title) || title.contains(l.article_name.as_str()))
    {
        return &record.working_paper_link;
    }

    NOT_FOUND
}

/// An article together with the link `resolve` picked for it
#[derive(Debug, Clone, Copy)]
pub struct ResolvedArticle<'a> {
    pub article: &'a ArticleRecord,
    pub link: &'a str,
}

impl ResolvedArticle<'_> {
    pub fn has_link(&self) -> bool {
        self.link != NOT_FOUND
    }
}

/// Resolve every article, preserving article order (one entry per article)
pub fn resolve_all<'a>(articles: &'a [ArticleRecord], links: &'a [LinkRecord]) -> Vec<ResolvedArticle<'a>> {
    articles
        .iter()
        .map(|article| ResolvedArticle {
            article,
            link: resolve(&article.title, links),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, url: &str) -> LinkRecord {
        LinkRecord {
            article_name: name.to_string(),
            working_paper_link: url.to_string(),
        }
    }

    #[test]
    fn test_exact_match() {
        let links = vec![link("A Study of X", "http://example.com/x.pdf")];
        assert_eq!(resolve("A Study of X", &links), "http://example.com/x.pdf");
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let links = vec![
            link("A Study of X and Y", "http://example.com/xy.pdf"),
            link("A Study of X", "http://example.com/x.pdf"),
        ];
        assert_eq!(resolve("A Study of X", &links), "http://example.com/x.pdf");
    }

    #[test]
    fn test_substring_match_both_directions() {
        let links = vec![link("Markets", "http://example.com/m.pdf")];
        // Link name contained in the title
        assert_eq!(resolve("Markets and Morals", &links), "http://example.com/m.pdf");

        let links = vec![link("Markets and Morals: A Reply", "http://example.com/r.pdf")];
        // Title contained in the link name
        assert_eq!(resolve("Markets and Morals", &links), "http://example.com/r.pdf");
    }

    #[test]
    fn test_first_substring_match_wins() {
        let links = vec![
            link("Growth Theory Revisited", "http://example.com/1.pdf"),
            link("Growth Theory Revisited Again", "http://example.com/2.pdf"),
        ];
        assert_eq!(resolve("Growth Theory", &links), "http://example.com/1.pdf");
    }

    #[test]
    fn test_no_normalization() {
        let links = vec![link("a study of x", "http://example.com/x.pdf")];
        assert_eq!(resolve("A Study of X", &links), NOT_FOUND);
    }

    #[test]
    fn test_no_links() {
        assert_eq!(resolve("Anything", &[]), NOT_FOUND);
    }

    #[test]
    fn test_exact_match_with_sentinel_value() {
        let links = vec![
            link("A Study of X", NOT_FOUND),
            link("A Study of X, Extended", "http://example.com/x2.pdf"),
        ];
        assert_eq!(resolve("A Study of X", &links), NOT_FOUND);
    }

    #[test]
    fn test_resolve_all_keeps_every_article() {
        let articles = vec![
            ArticleRecord { title: "One".into(), author: "A".into() },
            ArticleRecord { title: "Two".into(), author: "B".into() },
            ArticleRecord { title: "One".into(), author: "C".into() },
        ];
        let links = vec![link("One", "http://example.com/1.pdf")];
        let resolved = resolve_all(&articles, &links);

        assert_eq!(resolved.len(), 3);
        assert!(resolved[0].has_link());
        assert!(!resolved[1].has_link());
        assert_eq!(resolved[2].article.author, "C");
        assert_eq!(resolved[2].link, "http://example.com/1.pdf");
    }
}
