//! End-to-end harvest of one journal issue
//!
//! Article query → link query → per-article resolve + download → report.
//! Each stage degrades to "nothing found" instead of aborting the run.

use std::path::{Path, PathBuf};

use crate::ai_client::LanguageModel;
use crate::papers::articles::retrieve_articles;
use crate::papers::download::Downloader;
use crate::papers::links::find_article_links;
use crate::papers::report::{build_markdown_table, write_report};
use crate::papers::resolver::{resolve_all, ResolvedArticle};
use crate::papers::{ArticleRecord, DownloadOutcome, IssueRef, LinkRecord};

/// Hooks for console feedback during a run. All methods default to no-ops.
pub trait HarvestProgress {
    /// A new stage of the run begins
    fn on_stage(&mut self, _stage: &str) {}

    /// A fragment of streamed model output
    fn on_model_text(&mut self, _text: &str) {}

    /// Called before each article's download starts
    fn on_article(&mut self, _resolved: &ResolvedArticle<'_>) {}

    fn on_download_progress(&mut self, _bytes: u64, _total: u64) {}

    fn on_article_done(&mut self, _outcome: &DownloadOutcome) {}
}

/// Progress sink that ignores everything
pub struct Silent;

impl HarvestProgress for Silent {}

#[derive(Debug, Clone, Copy)]
pub struct HarvestOptions {
    /// When false, articles and links are only listed and reported
    pub download: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self { download: true }
    }
}

/// Counts printed at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub articles: usize,
    /// Link records that carry a URL rather than "Not found"
    pub links_available: usize,
    pub downloaded: usize,
}

impl std::fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} articles, found working-paper links for {}, downloaded {}",
            self.articles, self.links_available, self.downloaded
        )
    }
}

#[derive(Debug)]
pub struct HarvestResult {
    pub articles: Vec<ArticleRecord>,
    pub links: Vec<LinkRecord>,
    pub outcomes: Vec<DownloadOutcome>,
    pub report_path: Option<PathBuf>,
}

impl HarvestResult {
    pub fn summary(&self) -> HarvestSummary {
        HarvestSummary {
            articles: self.articles.len(),
            links_available: self.links.iter().filter(|l| l.has_link()).count(),
            downloaded: self.outcomes.iter().filter(|o| o.succeeded).count(),
        }
    }
}

/// Download every article's resolved link, one after another
pub async fn process_and_download(
    downloader: &Downloader,
    issue: &IssueRef,
    articles: &[ArticleRecord],
    links: &[LinkRecord],
    root: &Path,
    progress: &mut dyn HarvestProgress,
) -> Vec<DownloadOutcome> {
    let mut outcomes = Vec::with_capacity(articles.len());

    for resolved in resolve_all(articles, links) {
        progress.on_article(&resolved);
        let outcome = downloader
            .download(resolved.link, resolved.article, issue, root, &mut |bytes, total| {
                progress.on_download_progress(bytes, total)
            })
            .await;
        progress.on_article_done(&outcome);
        outcomes.push(outcome);
    }

    outcomes
}

/// Run the whole pipeline for one issue
pub async fn run_harvest<M: LanguageModel>(
    model: &M,
    downloader: &Downloader,
    issue: &IssueRef,
    root: &Path,
    options: HarvestOptions,
    progress: &mut dyn HarvestProgress,
) -> HarvestResult {
    tracing::info!("[Harvest] Listing articles of {} {}", issue.journal, issue.issue);
    progress.on_stage("Article list");
    let listing = retrieve_articles(model, issue, &mut |text: &str| progress.on_model_text(text)).await;
    let articles = listing.articles().to_vec();

    let links = if articles.is_empty() {
        tracing::warn!("[Harvest] No articles retrieved, skipping link search");
        Vec::new()
    } else {
        tracing::info!("[Harvest] Searching working-paper links for {} articles", articles.len());
        progress.on_stage("Working-paper links");
        find_article_links(model, &listing.raw_text, &mut |text: &str| progress.on_model_text(text))
            .await
            .into_parsed_or_default()
    };

    progress.on_stage("Articles and links");
    let outcomes = if options.download {
        process_and_download(downloader, issue, &articles, &links, root, progress).await
    } else {
        for resolved in resolve_all(&articles, &links) {
            progress.on_article(&resolved);
        }
        Vec::new()
    };

    let markdown = build_markdown_table(issue, &articles, &links);
    let report_path = match write_report(root, issue, &markdown) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::error!("[Report] Failed to write article table: {}", e);
            None
        }
    };

    HarvestResult {
        articles,
        links,
        outcomes,
        report_path,
    }
}
