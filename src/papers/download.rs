//! Working-paper download
//!
//! One GET per article, redirects followed. The file extension comes from the
//! Content-Type header, then the final URL, then defaults to `.pdf`. The body
//! is streamed straight to disk so large files never sit in memory.

use crate::error::{Error, Result};
use futures::StreamExt;
use reqwest::Client;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::{ArticleRecord, DownloadOutcome, IssueRef, NOT_FOUND};

const DEFAULT_EXTENSION: &str = ".pdf";

/// Longest URL suffix (dot included) accepted as an extension
const MAX_URL_EXTENSION_CHARS: usize = 5;

/// Content-Type fragments and the extension each implies, checked in order
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("pdf", ".pdf"),
    ("application/msword", ".doc"),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", ".docx"),
];

/// Extension implied by a Content-Type header, if any
pub fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    let lower = content_type.to_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, ext)| *ext)
}

/// Suffix of the (percent-decoded) URL path, e.g. `.pdf`, if short enough
pub fn extension_from_url(url: &Url) -> Option<String> {
    let path = urlencoding::decode(url.path())
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| url.path().to_string());

    let ext = Path::new(&path).extension()?.to_str()?;
    let ext = format!(".{}", ext);
    if ext.len() > 1 && ext.chars().count() <= MAX_URL_EXTENSION_CHARS {
        Some(ext)
    } else {
        None
    }
}

/// Pick the extension for a downloaded file
pub fn infer_extension(content_type: Option<&str>, final_url: &Url) -> String {
    content_type
        .and_then(extension_from_content_type)
        .map(str::to_string)
        .or_else(|| extension_from_url(final_url))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Sequential HTTP downloader for working papers
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("Mozilla/5.0 (compatible; journal-harvest/", env!("CARGO_PKG_VERSION"), ")"))
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()? })
    }

    /// Download one article's working paper into `{root}/{journal}/{issue}/`.
    ///
    /// Never returns an error: the "Not found" sentinel, HTTP failures and
    /// filesystem failures are all logged and reported as `succeeded: false`.
    /// `on_progress` receives `(bytes_written, content_length_or_0)`.
    pub async fn download(
        &self,
        url: &str,
        article: &ArticleRecord,
        issue: &IssueRef,
        root: &Path,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> DownloadOutcome {
        if url == NOT_FOUND {
            tracing::warn!("[Download] No download link found for \"{}\"", article.title);
            return DownloadOutcome {
                article: article.clone(),
                succeeded: false,
                saved_path: None,
            };
        }

        match self.try_download(url, article, issue, root, on_progress).await {
            Ok(path) => {
                tracing::info!("[Download] Saved: {}", path.display());
                DownloadOutcome {
                    article: article.clone(),
                    succeeded: true,
                    saved_path: Some(path),
                }
            }
            Err(e) => {
                tracing::error!("[Download] Failed to download \"{}\": {}", article.title, e);
                DownloadOutcome {
                    article: article.clone(),
                    succeeded: false,
                    saved_path: None,
                }
            }
        }
    }

    async fn try_download(
        &self,
        url: &str,
        article: &ArticleRecord,
        issue: &IssueRef,
        root: &Path,
        on_progress: &mut dyn FnMut(u64, u64),
    ) -> Result<PathBuf> {
        let save_dir = issue.issue_dir(root);
        fs::create_dir_all(&save_dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {}", save_dir.display(), e),
            ))
        })?;

        let response = self
            .client
            .get(url)
            .header("Accept", "application/pdf, application/msword, application/vnd.openxmlformats-officedocument.wordprocessingml.document, */*")
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ext = infer_extension(content_type.as_deref(), response.url());
        let total = response.content_length().unwrap_or(0);

        let path = save_dir.join(format!("{}{}", issue.file_stem(article), ext));
        tracing::info!("[Download] Downloading: {}{}", article.title, ext);

        if let Err(e) = write_body(response, &path, total, on_progress).await {
            // Leave no truncated file behind
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        Ok(path)
    }
}

async fn write_body(
    response: reqwest::Response,
    path: &Path,
    total: u64,
    on_progress: &mut dyn FnMut(u64, u64),
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk)?;
        written += chunk.len() as u64;
        on_progress(written, total);
    }

    writer.flush()?;
    Ok(())
}
