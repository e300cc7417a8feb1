//! journal-harvest CLI
//!
//! Usage: journal-harvest [OPTIONS]
//!
//! Lists the articles of a journal issue through Gemini, looks up free
//! working-paper links, downloads them and writes a Markdown table.

use clap::Parser;
use journal_harvest_lib::ai_client::GeminiClient;
use journal_harvest_lib::harvest::{run_harvest, HarvestOptions, HarvestProgress};
use journal_harvest_lib::papers::download::Downloader;
use journal_harvest_lib::papers::resolver::ResolvedArticle;
use journal_harvest_lib::papers::{DownloadOutcome, IssueRef};
use journal_harvest_lib::settings::{self, Settings};
use journal_harvest_lib::Error;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "journal-harvest")]
#[command(version, about = "Find and download working papers for a journal issue", long_about = None)]
struct Cli {
    /// Journal name (prompted for when omitted)
    #[arg(long, short)]
    journal: Option<String>,

    /// Issue label, e.g. "2025, Issue 4" (prompted for when omitted)
    #[arg(long, short)]
    issue: Option<String>,

    /// Root directory for downloads and the report
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,

    /// Timeout in seconds for each HTTP request (default: none)
    #[arg(long)]
    timeout: Option<u64>,

    /// List articles and write the report without downloading
    #[arg(long)]
    no_download: bool,

    /// Save an API key typed at the prompt to the settings file
    #[arg(long)]
    remember_key: bool,

    /// Settings file path (default: auto-detect)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detailed logging
    #[arg(long, short, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Ask for a value on stdin, falling back to `default` on empty input
fn prompt_with_default(label: &str, default: &str) -> std::io::Result<String> {
    print!("{} (default: {}): ", label, default);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    let input = input.trim();
    Ok(if input.is_empty() { default.to_string() } else { input.to_string() })
}

fn prompt_for_api_key() -> std::io::Result<String> {
    println!("\n{} not found in the environment or settings", settings::API_KEY_ENV);
    println!("Get an API key from https://aistudio.google.com/apikey");
    print!("Enter your Gemini API key: ");
    std::io::stdout().flush()?;

    let mut key = String::new();
    std::io::stdin().lock().read_line(&mut key)?;
    Ok(key)
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Prints streamed model text, the per-article listing and a progress line
#[derive(Default)]
struct ConsoleProgress {
    progress_line_open: bool,
}

impl HarvestProgress for ConsoleProgress {
    fn on_stage(&mut self, stage: &str) {
        println!("\n\n=== {} ===\n", stage);
    }

    fn on_model_text(&mut self, text: &str) {
        print!("{}", text);
        std::io::stdout().flush().ok();
    }

    fn on_article(&mut self, resolved: &ResolvedArticle<'_>) {
        println!("Title: {}", resolved.article.title);
        println!("Author: {}", resolved.article.author);
        println!("Paper link: {}", resolved.link);
    }

    fn on_download_progress(&mut self, bytes: u64, total: u64) {
        if total > 0 {
            print!("\r  {} / {}", format_bytes(bytes), format_bytes(total));
        } else {
            print!("\r  {}", format_bytes(bytes));
        }
        std::io::stdout().flush().ok();
        self.progress_line_open = true;
    }

    fn on_article_done(&mut self, outcome: &DownloadOutcome) {
        if std::mem::take(&mut self.progress_line_open) {
            println!();
        }
        if let Some(path) = &outcome.saved_path {
            println!("Saved: {}", path.display());
        }
        println!("{}", "-".repeat(80));
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&config_path);
    tracing::debug!("[Settings] Using {}", config_path.display());

    let journal = match cli.journal {
        Some(journal) => journal,
        None => prompt_with_default("Journal name", &settings.default_journal)?,
    };
    let issue_label = match cli.issue {
        Some(issue) => issue,
        None => prompt_with_default("Issue (year and number)", &settings.default_issue)?,
    };
    let issue = IssueRef::new(journal, issue_label);

    let from_env = |name: &str| std::env::var(name).ok();
    let resolved = settings::resolve_api_key(from_env, &settings, prompt_for_api_key)?;
    println!("API key: {}", settings::mask_api_key(&resolved.key));

    if resolved.should_persist(cli.remember_key) {
        settings.set_api_key(resolved.key.clone(), &config_path)?;
    }
    let api_key = resolved.key;

    let timeout = cli.timeout.or(settings.request_timeout_secs).map(Duration::from_secs);
    let model_name = cli.model.unwrap_or_else(|| settings.model.clone());
    let model = GeminiClient::new(api_key, model_name, settings.api_base_url.clone(), timeout)?;
    let downloader = Downloader::new(timeout)?;

    let root = cli.download_dir.unwrap_or_else(|| PathBuf::from(&settings.download_dir));
    let root = std::path::absolute(&root).unwrap_or(root);
    println!("Download directory: {}", root.display());

    let options = HarvestOptions { download: !cli.no_download };
    let result = run_harvest(&model, &downloader, &issue, &root, options, &mut ConsoleProgress::default()).await;

    if let Some(path) = &result.report_path {
        println!("\nArticle table saved to: {}", path.display());
    }
    println!("\nSummary: {}", result.summary());

    Ok(())
}
