//! CLI binary for extraction-playground.
//!
//! A thin shim over the library crate: flags map onto `ClientConfig`, a
//! single `ExtractionOrchestrator` session runs the upload, and results are
//! printed or exported as markdown.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use extraction_playground::{
    combined_markdown, export_comparison, export_single, format_bytes, speed_ranking, summarize,
    ClientConfig, ComparisonResult, DispatchObserver, DispatchOutput, DispatchRequest,
    ExtractionOrchestrator, ExtractionResult, ExtractionService, HttpExtractionService,
    ModelSelection, SharedObserver, ToggleOutcome, UploadCandidate, DEFAULT_API_URL,
    DEFAULT_MAX_FILE_SIZE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
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

// ── CLI dispatch observer using indicatif ────────────────────────────────────

/// Terminal spinner shown while a dispatch is in flight.
///
/// The service answers a comparison only after every model has run, so there
/// is no per-model progress to report; the spinner just tracks elapsed time.
struct CliSpinner {
    bar: ProgressBar,
}

impl CliSpinner {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Uploading");
        Arc::new(Self { bar })
    }
}

impl DispatchObserver for CliSpinner {
    fn on_dispatch_start(&self, _epoch: u64, request: &DispatchRequest) {
        let msg = match request {
            DispatchRequest::Single { model } => format!("extracting with {model}"),
            DispatchRequest::Compare { models } => {
                format!("comparing {} models ({})", models.len(), models.join(", "))
            }
        };
        self.bar.set_prefix("Processing");
        self.bar.set_message(msg);
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_dispatch_complete(&self, _epoch: u64, output: &DispatchOutput) {
        let elapsed = self.bar.elapsed().as_secs_f64();
        self.bar.finish_and_clear();
        match output {
            DispatchOutput::Single(r) => eprintln!(
                "{} {} extracted {}  {}",
                green("✔"),
                bold(&r.model),
                dim(&format!("{} chars", r.content_chars())),
                dim(&format!("{elapsed:.1}s")),
            ),
            DispatchOutput::Comparison(c) => {
                let failed = c.failed_count();
                let total = c.results().len();
                if failed == 0 {
                    eprintln!(
                        "{} {} models compared  {}",
                        green("✔"),
                        bold(&total.to_string()),
                        dim(&format!("{elapsed:.1}s")),
                    );
                } else {
                    eprintln!(
                        "{} {}/{} models succeeded  ({} failed)  {}",
                        if failed == total { red("✘") } else { cyan("⚠") },
                        bold(&(total - failed).to_string()),
                        total,
                        red(&failed.to_string()),
                        dim(&format!("{elapsed:.1}s")),
                    );
                }
            }
        }
    }

    fn on_dispatch_error(&self, _epoch: u64, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(message));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List the models the service offers
  playground models

  # Extract with one model (markdown on stdout)
  playground extract paper.pdf -m docling

  # Compare up to three models and save each result
  playground extract paper.pdf -m docling -m mineru -m surya -o out/

  # All comparison results as one markdown document
  playground extract paper.pdf -m docling -m mineru --combined > all.md

  # Machine-readable output
  playground extract paper.pdf -m docling -m mineru --json

ENVIRONMENT VARIABLES:
  PLAYGROUND_API_URL        Base URL of the extraction API
  PLAYGROUND_TIMEOUT        Request timeout in seconds
  PLAYGROUND_MAX_FILE_SIZE  Largest accepted upload in bytes
  RUST_LOG                  Override the log filter (e.g. extraction_playground=debug)
"#;

/// Run PDFs through extraction models and compare the results.
#[derive(Parser, Debug)]
#[command(
    name = "playground",
    version,
    about = "Run PDFs through extraction models and compare the results",
    long_about = "Upload a PDF to an extraction service, run it through one model or compare \
up to three, and print the markdown along with speed, element and content metrics.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the extraction API.
    #[arg(long, global = true, env = "PLAYGROUND_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "PLAYGROUND_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Largest accepted upload in bytes.
    #[arg(long, global = true, env = "PLAYGROUND_MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Do not ask the service for annotated page images.
    #[arg(long, global = true)]
    no_annotations: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PLAYGROUND_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PLAYGROUND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PLAYGROUND_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models the service can run.
    Models {
        /// Print the raw model list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Extract a PDF with one model, or compare up to three.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// PDF file to upload.
    file: PathBuf,

    /// Model to run; repeat for a comparison (at most 3).
    #[arg(short, long = "model", required = true)]
    models: Vec<String>,

    /// Save each model's markdown into this directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as JSON instead of markdown and tables.
    #[arg(long)]
    json: bool,

    /// For comparisons, print every model's markdown as one document.
    #[arg(long, conflicts_with = "json")]
    combined: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let json = match &cli.command {
        Command::Models { json } => *json,
        Command::Extract(args) => args.json,
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers everything INFO would say, so only errors get
    // through while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !json;
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

    let config = build_config(&cli)?;
    let service = HttpExtractionService::new(&config).context("Failed to create HTTP client")?;

    match &cli.command {
        Command::Models { json } => list_models(&service, *json).await,
        Command::Extract(args) => run_extract(&cli, args, &config, &service, show_progress).await,
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    ClientConfig::builder()
        .base_url(cli.api_url.clone())
        .request_timeout_secs(cli.timeout)
        .max_file_size(cli.max_file_size)
        .generate_annotations(!cli.no_annotations)
        .build()
        .context("Invalid configuration")
}

async fn list_models(service: &dyn ExtractionService, json: bool) -> Result<()> {
    let models = service
        .list_models()
        .await
        .context("Failed to fetch available models")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&models).context("Failed to serialise models")?
        );
        return Ok(());
    }

    if models.is_empty() {
        eprintln!("{} The service reported no models", cyan("⚠"));
        return Ok(());
    }

    println!(
        "{}",
        bold(&format!(
            "{:<16} {:<24} {:<14} {:<10} {}",
            "MODEL", "NAME", "PROVIDER", "SPEED", "GPU"
        ))
    );
    for m in &models {
        println!(
            "{:<16} {:<24} {:<14} {:<10} {}",
            m.name,
            m.label(),
            m.provider.as_deref().unwrap_or("-"),
            m.average_speed.as_deref().unwrap_or("-"),
            match m.gpu_required {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            }
        );
        if let Some(desc) = &m.description {
            println!("  {}", dim(desc));
        }
    }
    Ok(())
}

async fn run_extract(
    cli: &Cli,
    args: &ExtractArgs,
    config: &ClientConfig,
    service: &dyn ExtractionService,
    show_progress: bool,
) -> Result<()> {
    let mut models: Vec<&str> = Vec::new();
    for m in &args.models {
        if !models.contains(&m.as_str()) {
            models.push(m);
        }
    }
    if models.len() > ModelSelection::MAX {
        anyhow::bail!(
            "Maximum {} models for comparison (got {})",
            ModelSelection::MAX,
            models.len()
        );
    }

    let mut session = ExtractionOrchestrator::new(config);
    if show_progress {
        session = session.with_observer(CliSpinner::new() as SharedObserver);
    }

    let candidate = UploadCandidate::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(candidate.name()),
            dim(&format_bytes(candidate.size()))
        );
    }
    session
        .select_file(candidate)
        .with_context(|| format!("Cannot upload {}", args.file.display()))?;
    if cli.verbose {
        if let Some(preview) = session.preview() {
            eprintln!("   {}", dim(&format!("preview: {}", preview.url())));
        }
    }

    for m in &models {
        if session.toggle_model(m) == Some(ToggleOutcome::AtCeiling) {
            anyhow::bail!("Maximum {} models for comparison", ModelSelection::MAX);
        }
    }

    session.dispatch(service).await;

    let state = session.session();
    if let Some(message) = state.error_message() {
        anyhow::bail!("{message}");
    }
    if let Some(result) = state.single_result() {
        print_single(cli, args, result).await
    } else if let Some(comparison) = state.comparison_result() {
        print_comparison(cli, args, comparison).await
    } else {
        anyhow::bail!("Extraction did not produce a result")
    }
}

async fn print_single(cli: &Cli, args: &ExtractArgs, result: &ExtractionResult) -> Result<()> {
    if let Some(dir) = &args.output {
        if let Some(path) = export_single(dir, result)
            .await
            .context("Failed to save markdown")?
        {
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(result).context("Failed to serialise result")?
        );
        return Ok(());
    }

    if args.output.is_none() {
        write_stdout(&result.markdown_content)?;
    }
    if !cli.quiet {
        if let Some(m) = &result.metrics {
            eprintln!(
                "   {} pages  /  {} elements  /  {} words  —  {:.2}s",
                dim(&m.num_pages.to_string()),
                dim(&m.num_elements.to_string()),
                dim(&m.word_count.to_string()),
                m.extraction_time_secs,
            );
        }
    }
    Ok(())
}

async fn print_comparison(cli: &Cli, args: &ExtractArgs, comparison: &ComparisonResult) -> Result<()> {
    if let Some(dir) = &args.output {
        let written = export_comparison(dir, comparison)
            .await
            .context("Failed to save markdown")?;
        if !cli.quiet {
            for path in &written {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(comparison).context("Failed to serialise comparison")?
        );
        return Ok(());
    }
    if args.combined {
        return write_stdout(&combined_markdown(comparison));
    }

    let metrics = comparison.metrics();
    let or_dash = |m: &Option<String>| m.clone().unwrap_or_else(|| "-".to_string());
    println!("{}", bold("Comparison Summary"));
    println!("  Fastest:          {}", green(&or_dash(&metrics.fastest_model)));
    println!("  Most elements:    {}", or_dash(&metrics.most_elements_model));
    println!("  Longest content:  {}", or_dash(&metrics.longest_content_model));
    println!();

    println!("{}", bold("Speed Ranking"));
    for row in speed_ranking(comparison.results()) {
        match row.rank {
            Some(rank) => println!("  #{rank:<3} {:<16} {:>8.2}s", row.model, row.seconds),
            None => println!("  {}", dim(&format!("{:<4} {:<16} {:>9}", "-", row.model, "failed"))),
        }
    }
    println!();

    println!(
        "{}",
        bold(&format!(
            "{:<16} {:>9} {:>6} {:>9} {:>8} {:>10} {:>10} {:>8} {:>6}",
            "MODEL", "STATUS", "PAGES", "ELEMENTS", "WORDS", "CHARS", "WORDS/EL", "TIME", "REL%"
        ))
    );
    for row in summarize(comparison.results()) {
        println!(
            "{:<16} {:>9} {:>6} {:>9} {:>8} {:>10} {:>10} {:>7.2}s {:>5.0}%",
            row.model,
            row.status.as_str(),
            row.pages,
            row.elements,
            row.words,
            row.characters,
            row.avg_words_per_element,
            row.seconds,
            row.relative_speed_pct,
        );
        if !row.element_counts.is_empty() {
            let breakdown: Vec<String> = row
                .element_counts
                .iter()
                .map(|(kind, n)| format!("{kind}: {n}"))
                .collect();
            println!("  {}", dim(&breakdown.join(", ")));
        }
    }

    for (model, r) in comparison.results().iter() {
        if let Some(err) = &r.error {
            eprintln!("{} {}: {}", red("✗"), model, red(err));
        }
    }
    Ok(())
}

fn write_stdout(markdown: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    if !markdown.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
