//! Gemini API client with streamed, search-grounded completions
//!
//! The rest of the crate only sees the `LanguageModel` trait: a prompt goes in,
//! text comes back in pieces, and the full text is returned at the end.

use crate::error::{Error, Result};
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::pin;
use std::time::Duration;

/// Knobs for a single completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Ground the answer in web search results
    pub web_search: bool,
}

/// A text-completion service that streams its output.
///
/// `on_text` receives each fragment as it arrives; the returned string is the
/// concatenation of all fragments.
#[allow(async_fn_in_trait)]
pub trait LanguageModel {
    async fn stream_completion(
        &self,
        prompt: &str,
        options: GenerationOptions,
        on_text: &mut dyn FnMut(&str),
    ) -> Result<String>;
}

/// Gemini API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

/// One server-sent event from `streamGenerateContent`
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl StreamChunk {
    /// Text of the first candidate, with all of its parts joined
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}

fn build_request(prompt: &str, options: GenerationOptions) -> GeminiRequest {
    let tools = if options.web_search {
        vec![Tool { google_search: GoogleSearch {} }]
    } else {
        Vec::new()
    };

    GeminiRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![RequestPart { text: prompt.to_string() }],
        }],
        tools,
        generation_config: GenerationConfig {
            temperature: options.temperature,
            response_mime_type: "text/plain".to_string(),
        },
    }
}

/// Drain a `text/event-stream` body, handing each event's text to `on_text`.
///
/// Event framing (including chunks split inside an event or a UTF-8
/// sequence) is left to `eventsource_stream`.
async fn read_event_stream<S, B, E>(body: S, on_text: &mut dyn FnMut(&str)) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut events = pin!(body.eventsource());
    let mut full = String::new();

    while let Some(event) = events.next().await {
        let event = event.map_err(|e| Error::Model(format!("Event stream error: {}", e)))?;
        handle_event(&event.data, &mut full, on_text);
    }

    Ok(full)
}

/// Decode one event payload and hand its text to the caller
fn handle_event(data: &str, full: &mut String, on_text: &mut dyn FnMut(&str)) {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let text = chunk.text();
            if !text.is_empty() {
                on_text(&text);
                full.push_str(&text);
            }
        }
        Err(e) => {
            tracing::warn!("[Gemini] Skipping undecodable stream event: {}", e);
        }
    }
}

/// Gemini client for `streamGenerateContent`
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

impl LanguageModel for GeminiClient {
    async fn stream_completion(
        &self,
        prompt: &str,
        options: GenerationOptions,
        on_text: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let request = build_request(prompt, options);
        tracing::debug!(
            "[Gemini] Request to {} (temperature {}, web search {})",
            self.model, options.temperature, options.web_search
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("API error {}: {}", status, body)));
        }

        read_event_stream(response.bytes_stream(), on_text).await
    }
}
