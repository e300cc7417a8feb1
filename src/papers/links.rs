//! Working-paper link lookup
//!
//! The article list is handed back to the model verbatim (not re-serialized)
//! so the second prompt sees exactly the titles the first reply contained.

use crate::ai_client::{GenerationOptions, LanguageModel};

use super::response::{parse_links, ModelReply};
use super::{LinkRecord, NOT_FOUND};

const LINKS_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.0,
    web_search: true,
};

pub fn build_links_prompt(articles_text: &str) -> String {
    format!(
        r#"I need you to find accessible, free, working paper or pre-print links for the following list of academic articles. Please structure your response in JSON format. The main JSON object should contain a key called "article_links", which is an array of objects. Each object in this array should represent an article and have two keys: "article_name" (the title of the article I provide) and "working_paper_link" (the URL to the accessible paper you find). If you cannot find an accessible link for a particular article, please use the string "{not_found}" for its "working_paper_link". Here is the list of articles:

{articles}

Please begin your JSON output now."#,
        not_found = NOT_FOUND,
        articles = articles_text,
    )
}

/// Query the model for a working-paper link per article.
///
/// Like `retrieve_articles`, failures come back as `ModelReply::Invalid`.
pub async fn find_article_links<M: LanguageModel>(
    model: &M,
    articles_text: &str,
    on_text: &mut dyn FnMut(&str),
) -> ModelReply<Vec<LinkRecord>> {
    let prompt = build_links_prompt(articles_text);

    let full = match model.stream_completion(&prompt, LINKS_OPTIONS, on_text).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("[Links] Model request failed: {}", e);
            return ModelReply::Invalid {
                error: e.to_string(),
                raw_response: String::new(),
            };
        }
    };

    let reply = parse_links(&full);
    match &reply {
        ModelReply::Parsed(links) => {
            let found = links.iter().filter(|l| l.has_link()).count();
            tracing::info!("[Links] {} link records, {} with a link", links.len(), found);
        }
        ModelReply::Invalid { error, .. } => {
            tracing::error!("[Links] Could not parse reply as a link list: {}", error);
        }
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::papers::articles::tests::{chunks, ScriptedModel};

    #[test]
    fn test_prompt_embeds_articles_verbatim() {
        let articles = "{\"articles\": [{\"article_title\": \"A Study of X\", \"author\": \"Smith\"}]}";
        let prompt = build_links_prompt(articles);
        assert!(prompt.contains(articles));
        assert!(prompt.contains("\"Not found\""));
        assert!(prompt.contains("\"article_links\""));
    }

    #[tokio::test]
    async fn test_find_links_uses_zero_temperature() {
        let model = ScriptedModel::new(vec![Ok(chunks(&[
            "{\"article_links\": [{\"article_name\": \"A Study of X\", ",
            "\"working_paper_link\": \"http://example.com/x.pdf\"}]}",
        ]))]);
        let reply = find_article_links(&model, "{}", &mut |_: &str| {}).await;

        let links = reply.into_parsed_or_default();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].working_paper_link, "http://example.com/x.pdf");
        let prompts = model.prompts.borrow();
        assert_eq!(prompts[0].1.temperature, 0.0);
        assert!(prompts[0].1.web_search);
    }

    #[tokio::test]
    async fn test_find_links_malformed_reply() {
        let model = ScriptedModel::new(vec![Ok(chunks(&["Sorry, no links."]))]);
        let reply = find_article_links(&model, "{}", &mut |_: &str| {}).await;
        match reply {
            ModelReply::Invalid { raw_response, .. } => assert_eq!(raw_response, "Sorry, no links."),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
