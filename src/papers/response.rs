//! Parsing of model replies
//!
//! The model is asked for a specific JSON shape but nothing guarantees it
//! complies, so every reply is validated here and turned into either typed
//! records or an `Invalid` value that keeps the raw text for diagnostics.

use serde_json::Value;

use super::{ArticleRecord, LinkRecord, NOT_FOUND, UNKNOWN_AUTHOR, UNKNOWN_TITLE};

/// A model reply after validation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply<T> {
    Parsed(T),
    /// The reply was not the requested JSON; `raw_response` is the model text verbatim
    Invalid { error: String, raw_response: String },
}

impl<T> ModelReply<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ModelReply::Parsed(_))
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            ModelReply::Parsed(value) => Some(value),
            ModelReply::Invalid { .. } => None,
        }
    }
}

impl<T: Default> ModelReply<T> {
    /// Parsed records, or the empty default when the reply was invalid
    pub fn into_parsed_or_default(self) -> T {
        match self {
            ModelReply::Parsed(value) => value,
            ModelReply::Invalid { .. } => T::default(),
        }
    }
}

/// Strip a Markdown code fence (```` ```json ```` or ```` ``` ````) around a reply
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse the fence-stripped reply and fetch the array stored under `key`
fn array_field(raw: &str, key: &str) -> Result<Vec<Value>, String> {
    let json: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| format!("Invalid JSON response: {}", e))?;

    match json.get(key) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(format!("\"{}\" is not an array", key)),
        None => Err(format!("Missing \"{}\" array", key)),
    }
}

/// Authors come back either as one string or as a list of names
fn author_field(entry: &Value) -> Option<String> {
    match entry.get("author")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(names) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            if names.is_empty() { None } else { Some(names.join(", ")) }
        }
        _ => None,
    }
}

/// Validate an `{"articles": [...]}` reply
pub fn parse_articles(raw: &str) -> ModelReply<Vec<ArticleRecord>> {
    let items = match array_field(raw, "articles") {
        Ok(items) => items,
        Err(error) => {
            return ModelReply::Invalid {
                error,
                raw_response: raw.to_string(),
            }
        }
    };

    let mut articles = Vec::with_capacity(items.len());
    for item in &items {
        if !item.is_object() {
            tracing::warn!("[Articles] Skipping non-object entry: {}", item);
            continue;
        }
        articles.push(ArticleRecord {
            title: item
                .get("article_title")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_TITLE)
                .to_string(),
            author: author_field(item).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        });
    }

    ModelReply::Parsed(articles)
}

/// Validate an `{"article_links": [...]}` reply
pub fn parse_links(raw: &str) -> ModelReply<Vec<LinkRecord>> {
    let items = match array_field(raw, "article_links") {
        Ok(items) => items,
        Err(error) => {
            return ModelReply::Invalid {
                error,
                raw_response: raw.to_string(),
            }
        }
    };

    let mut links = Vec::with_capacity(items.len());
    for item in &items {
        let Some(name) = item.get("article_name").and_then(Value::as_str) else {
            tracing::warn!("[Links] Skipping entry without article_name: {}", item);
            continue;
        };
        let link = item
            .get("working_paper_link")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(NOT_FOUND);

        links.push(LinkRecord {
            article_name: name.to_string(),
            working_paper_link: link.to_string(),
        });
    }

    ModelReply::Parsed(links)
}
