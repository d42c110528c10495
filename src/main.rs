// src/main.rs
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use filing_sections::batch;
use filing_sections::config::SectionsConfig;
use filing_sections::edgar::{EdgarClient, DEFAULT_USER_AGENT};
use filing_sections::storage::{CorpusReader, JsonlSink};
use filing_sections::utils::{self, span_debug, AppError};

/// Extracts named sections (Item 1A, Item 7, ...) from 10-K/10-Q filings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract configured sections from a directory of raw filings into JSON Lines
    Extract(ExtractArgs),
    /// Download filings from EDGAR into a raw corpus directory
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Directory holding raw *.html / *.htm / *.txt filings
    #[arg(long, env = "FILINGS_RAW_DIR", default_value = "data/raw")]
    raw_dir: PathBuf,

    /// Output JSON Lines file
    #[arg(short, long, env = "FILINGS_OUT_FILE", default_value = "data/processed/item1a_item7.jsonl")]
    output: PathBuf,

    /// TOML file with [[section]] definitions (defaults to Item 1A and Item 7)
    #[arg(short, long)]
    sections: Option<PathBuf>,

    /// Append to the output file instead of overwriting it
    #[arg(long)]
    append: bool,

    /// Write an annotated HTML view of every document's located sections here
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Ticker symbols (defaults to the full S&P 100)
    #[arg(long, num_args = 1..)]
    tickers: Vec<String>,

    /// Only filings filed on or after this date (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    after: NaiveDate,

    /// Form types to download
    #[arg(long = "form", default_values_t = ["10-K".to_string(), "10-Q".to_string()])]
    forms: Vec<String>,

    /// Destination directory
    #[arg(long, default_value = "data/raw")]
    out_dir: PathBuf,

    /// Pause before every EDGAR request, in milliseconds
    #[arg(long, default_value_t = 300)]
    sleep_ms: u64,

    /// Contact User-Agent required by the SEC
    #[arg(long, env = "EDGAR_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::debug!("Starting with args: {:?}", cli);

    match cli.command {
        Command::Extract(args) => run_extract(args),
        Command::Fetch(args) => run_fetch(args).await,
    }
}

fn run_extract(args: ExtractArgs) -> Result<(), AppError> {
    // Configuration problems abort before any document is touched
    let config = match &args.sections {
        Some(path) => SectionsConfig::load(path)?,
        None => SectionsConfig::default(),
    };
    let extractor = config.build_extractor()?;
    tracing::info!(
        "Extracting {} sections ({:?} heading selection)",
        extractor.specs().len(),
        extractor.selection()
    );

    let reader = CorpusReader::open(&args.raw_dir)?;
    let mut sink = JsonlSink::create(&args.output, args.append)?;

    let summary = batch::run_with_observer(reader, &extractor, &mut sink, |doc, _| {
        if let Some(dir) = &args.debug_dir {
            if let Err(e) = span_debug::save_annotated(doc, &extractor, dir) {
                tracing::warn!("Failed to create debug HTML for {}: {}", doc.doc_id, e);
            }
        }
    });

    for miss in summary.misses() {
        println!("No matches in {}", miss.doc_id);
    }
    println!("{}", summary);
    println!("Written {} -> {} records", args.output.display(), sink.records_written());

    if let Some(e) = &summary.sink_error {
        return Err(AppError::Processing(format!(
            "Records for {} may be incomplete, flushing the output failed: {}",
            args.output.display(),
            e
        )));
    }

    let processed = summary.documents_processed();
    if processed > 0 && summary.failure_count() == processed {
        return Err(AppError::Processing(format!(
            "All {} documents failed to process",
            processed
        )));
    }
    Ok(())
}

async fn run_fetch(args: FetchArgs) -> Result<(), AppError> {
    let client = EdgarClient::new(&args.user_agent, Duration::from_millis(args.sleep_ms))?;

    let tickers = if args.tickers.is_empty() {
        tracing::info!("No tickers given, using the S&P 100");
        client.sp100_tickers().await?
    } else {
        args.tickers
    };
    tracing::info!("Fetching {:?} filings after {} for {} tickers", args.forms, args.after, tickers.len());

    let written = client
        .fetch_forms(&tickers, &args.forms, args.after, &args.out_dir)
        .await?;
    println!("Download complete -> {} files written to {}", written, args.out_dir.display());
    Ok(())
}
