//! CLI binary for sight-ocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ClientConfig` and prints recognized pages.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use sight_ocr::{
    dedup_pages, recognize_stream, write_pages_json, ClientConfig, ProgressCallback,
    RecognitionProgressCallback, RecognizedPage,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while submitting and waiting, then
/// a files-complete bar once batches start to arrive.
struct CliProgressCallback {
    bar: ProgressBar,
    batches: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Encoding files…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            batches: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total_files: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Recognizing");
    }
}

impl RecognitionProgressCallback for CliProgressCallback {
    fn on_submission_start(&self, file_count: usize) {
        self.activate_bar(file_count);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Submitting {file_count} files…"))
        ));
    }

    fn on_polling_started(&self, _polling_url: &str) {
        self.bar.set_message("waiting for pages");
    }

    fn on_batch(&self, batch_len: usize, files_complete: usize, total_files: usize) {
        let n = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        self.bar.println(format!(
            "  {} Batch {:>3}  {}  {}",
            green("✓"),
            n,
            dim(&format!("{batch_len:>4} pages")),
            dim(&format!("{files_complete}/{total_files} files complete")),
        ));
        self.bar.set_position(files_complete as u64);
    }

    fn on_recognition_complete(&self, pages_emitted: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} page records received",
            green("✔"),
            bold(&pages_emitted.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print recognized text of every page
  sight invoice.pdf receipt.jpg

  # Write all pages as JSON
  sight scans/*.png -o pages.json

  # JSON on stdout, one record per page
  sight --json --dedup report.pdf > report.json

SUPPORTED FILE TYPES:
  .pdf  .bmp  .gif  .jpeg  .jpg  .png   (suffix match is case-sensitive)

ENVIRONMENT VARIABLES:
  SIGHT_API_KEY     API key (sent as "Authorization: Basic <key>")
  SIGHT_ENDPOINT    Override the recognition endpoint
  RUST_LOG          Override log filtering (e.g. RUST_LOG=sight_ocr=debug)
"#;

/// Recognize text in PDFs and images.
#[derive(Parser, Debug)]
#[command(
    name = "sight",
    version,
    about = "Recognize text in PDFs and images with the Sight API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to recognize; their order defines each page's file index.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// API key.
    #[arg(long, env = "SIGHT_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Recognition endpoint.
    #[arg(long, env = "SIGHT_ENDPOINT", default_value = sight_ocr::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Delay between polls in milliseconds.
    #[arg(long, env = "SIGHT_POLL_INTERVAL_MS", default_value_t = 500,
          value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: u64,

    /// Per-request HTTP timeout in seconds (default: none).
    #[arg(long, env = "SIGHT_TIMEOUT")]
    timeout: Option<u64>,

    /// Write pages as JSON to this file instead of printing text.
    #[arg(short, long, env = "SIGHT_OUTPUT")]
    output: Option<PathBuf>,

    /// Print pages as JSON to stdout.
    #[arg(long)]
    json: bool,

    /// Keep only the first record of each (file, page).
    #[arg(long)]
    dedup: bool,

    /// Disable progress bar.
    #[arg(long, env = "SIGHT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; RUST_LOG still wins when set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run recognition ──────────────────────────────────────────────────
    let mut batches = recognize_stream(&cli.files, &config)
        .await
        .context("Failed to prepare submission")?;

    let mut pages: Vec<RecognizedPage> = Vec::new();
    while let Some(batch) = batches.next().await {
        pages.extend(batch.context("Recognition failed")?);
    }
    if cli.dedup {
        pages = dedup_pages(pages);
    }

    // ── Output ───────────────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_pages_json(&pages, output_path)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} pages  →  {}",
                green("✔"),
                pages.len(),
                bold(&output_path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&pages).context("Failed to serialise pages")?;
        println!("{json}");
    } else {
        print_pages(&cli.files, &pages)?;
    }

    let failed = pages.iter().filter(|p| p.has_error()).count();
    if failed > 0 && !cli.quiet {
        eprintln!("{} {} pages reported recognition errors", red("⚠"), failed);
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .api_key(&cli.api_key)
        .endpoint(&cli.endpoint)
        .poll_interval(Duration::from_millis(cli.poll_interval_ms));

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Print each page's text under a header naming its file and page.
fn print_pages(files: &[PathBuf], pages: &[RecognizedPage]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for page in pages {
        let name = files
            .get(page.file_index)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("file {}", page.file_index));
        writeln!(
            handle,
            "{}",
            page_header(&name, page.page_number, page.number_of_pages_in_file)
        )
        .context("Failed to write to stdout")?;

        if page.has_error() {
            eprintln!(
                "{} {} page {}: {}",
                red("✗"),
                name,
                page.page_number,
                page.error
            );
        }

        handle
            .write_all(page.recognized_text.as_bytes())
            .context("Failed to write to stdout")?;
        if !page.recognized_text.ends_with('\n') {
            handle
                .write_all(b"\n")
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Header line printed above each page's text.
fn page_header(name: &str, page_number: usize, page_count: usize) -> String {
    format!("==> {name}, page {page_number}/{page_count} <==")
}
