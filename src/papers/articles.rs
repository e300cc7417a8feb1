//! Article list retrieval
//!
//! Asks the model (with web search) which articles appeared in an issue.

use crate::ai_client::{GenerationOptions, LanguageModel};

use super::response::{parse_articles, strip_code_fence, ModelReply};
use super::{ArticleRecord, IssueRef};

const ARTICLES_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 1.0,
    web_search: true,
};

/// What the article query produced
#[derive(Debug, Clone)]
pub struct ArticleListing {
    pub reply: ModelReply<Vec<ArticleRecord>>,
    /// Text passed on to the link query: the fence-stripped JSON when it
    /// parsed, otherwise the model's reply as-is
    pub raw_text: String,
}

impl ArticleListing {
    pub fn articles(&self) -> &[ArticleRecord] {
        self.reply.parsed().map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn build_articles_prompt(issue: &IssueRef) -> String {
    format!(
        r#"Find the articles published in {journal} {issue} and return them as JSON with the fields article_title and author.

Make sure article_title is the complete title of the article.
Make sure author is the main author, or the full author list if available.
The JSON must have this shape:
{{
  "articles": [
    {{
      "article_title": "Example title 1",
      "author": "Author A"
    }},
    {{
      "article_title": "Example title 2",
      "author": "Author B, Author C"
    }}
  ]
}}
Follow this JSON structure exactly and do not add any explanatory text outside the JSON. Start the JSON output directly."#,
        journal = issue.journal,
        issue = issue.issue,
    )
}

/// Query the model for the issue's articles.
///
/// Never fails: a transport error or a malformed reply comes back as
/// `ModelReply::Invalid`, which callers treat as "no articles".
pub async fn retrieve_articles<M: LanguageModel>(
    model: &M,
    issue: &IssueRef,
    on_text: &mut dyn FnMut(&str),
) -> ArticleListing {
    let prompt = build_articles_prompt(issue);

    let full = match model.stream_completion(&prompt, ARTICLES_OPTIONS, on_text).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("[Articles] Model request failed: {}", e);
            return ArticleListing {
                reply: ModelReply::Invalid {
                    error: e.to_string(),
                    raw_response: String::new(),
                },
                raw_text: String::new(),
            };
        }
    };

    let reply = parse_articles(&full);
    let raw_text = match &reply {
        ModelReply::Parsed(articles) => {
            tracing::info!("[Articles] Parsed {} articles", articles.len());
            strip_code_fence(&full).to_string()
        }
        ModelReply::Invalid { error, .. } => {
            tracing::error!("[Articles] Could not parse reply as an article list: {}", error);
            full.clone()
        }
    };

    ArticleListing { reply, raw_text }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::cell::RefCell;

    /// Replays canned replies in order and records every prompt it sees
    pub(crate) struct ScriptedModel {
        pub replies: RefCell<Vec<Result<Vec<String>>>>,
        pub prompts: RefCell<Vec<(String, GenerationOptions)>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<Vec<String>>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for ScriptedModel {
        async fn stream_completion(
            &self,
            prompt: &str,
            options: GenerationOptions,
            on_text: &mut dyn FnMut(&str),
        ) -> Result<String> {
            self.prompts.borrow_mut().push((prompt.to_string(), options));
            let next = self.replies.borrow_mut().remove(0);
            let chunks = next?;
            let mut full = String::new();
            for chunk in &chunks {
                on_text(chunk);
                full.push_str(chunk);
            }
            Ok(full)
        }
    }

    pub(crate) fn chunks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn issue() -> IssueRef {
        IssueRef::new("Journal of Political Economy", "2025, Issue 4")
    }

    #[test]
    fn test_prompt_mentions_issue_and_shape() {
        let prompt = build_articles_prompt(&issue());
        assert!(prompt.contains("Journal of Political Economy 2025, Issue 4"));
        assert!(prompt.contains("\"articles\""));
        assert!(prompt.contains("\"article_title\""));
    }

    #[tokio::test]
    async fn test_retrieve_streams_and_parses() {
        let model = ScriptedModel::new(vec![Ok(chunks(&[
            "```json\n{\"articles\": [",
            "{\"article_title\": \"A Study of X\", \"author\": \"Smith\"}",
            "]}\n```",
        ]))]);
        let mut streamed = String::new();
        let listing = retrieve_articles(&model, &issue(), &mut |t: &str| streamed.push_str(t)).await;

        assert_eq!(listing.articles().len(), 1);
        assert_eq!(listing.articles()[0].title, "A Study of X");
        assert!(streamed.starts_with("```json"));
        assert!(listing.raw_text.starts_with('{'));
        assert!(listing.raw_text.ends_with('}'));

        let prompts = model.prompts.borrow();
        assert_eq!(prompts[0].1, ARTICLES_OPTIONS);
    }

    #[tokio::test]
    async fn test_retrieve_malformed_reply() {
        let model = ScriptedModel::new(vec![Ok(chunks(&["not json ", "at all"]))]);
        let listing = retrieve_articles(&model, &issue(), &mut |_: &str| {}).await;

        assert!(listing.articles().is_empty());
        assert_eq!(listing.raw_text, "not json at all");
        match listing.reply {
            ModelReply::Invalid { raw_response, .. } => assert_eq!(raw_response, "not json at all"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retrieve_model_failure_is_not_fatal() {
        let model = ScriptedModel::new(vec![Err(Error::Model("API error 503".to_string()))]);
        let listing = retrieve_articles(&model, &issue(), &mut |_: &str| {}).await;
        assert!(listing.articles().is_empty());
        assert!(!listing.reply.is_parsed());
    }
}
