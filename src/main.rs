use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use structured_data_extractor::config::DEFAULT_TIMEOUT_SECS;
use structured_data_extractor::{
    parse_url_list, preview, run_batch, write_workbook, FlatRow, HttpFetcher, RunConfig,
    EXPORT_FILE_NAME, PREVIEW_ROWS,
};

const PREVIEW_VALUE_CHARS: usize = 80;

#[derive(Parser)]
#[command(
    name = "structured-data-extractor",
    about = "Extract JSON-LD, Microdata and RDFa from a list of URLs"
)]
struct Cli {
    /// File with one URL per line (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Request timeout in seconds (5-120)
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Delay after each request in seconds (0-10)
    #[arg(short, long, default_value_t = 0.0)]
    delay: f64,

    /// Where to write the spreadsheet
    #[arg(short, long, default_value = EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Number of flat rows to print after the run
    #[arg(long, default_value_t = PREVIEW_ROWS)]
    preview: usize,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = RunConfig::new(cli.timeout, cli.delay)?;

    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read URL list from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read URL list from stdin")?;
            buf
        }
    };
    let urls = parse_url_list(&input);

    let t0 = Instant::now();
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let fetcher = HttpFetcher::new();
    let report = run_batch(&fetcher, &urls, &config, |progress| {
        pb.set_position(progress.completed as u64);
        pb.set_message(progress.url.to_string());
    })?;
    pb.finish_and_clear();

    print_preview(preview(&report.rows, cli.preview));

    let bytes = write_workbook(&report.summaries, &report.rows)?;
    fs::write(&cli.output, bytes)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    info!(
        output = %cli.output.display(),
        elapsed_secs = t0.elapsed().as_secs_f64(),
        "export written"
    );
    println!(
        "Wrote {}: {} URLs ({} failed), {} rows",
        cli.output.display(),
        report.processed,
        report.failed,
        report.rows.len()
    );

    Ok(())
}

fn print_preview(rows: &[FlatRow]) {
    if rows.is_empty() {
        println!("No structured data found.");
        return;
    }

    println!("url\tsyntax\titem_index\titem_type\tproperty\tvalue");
    for row in rows {
        let index = row.item_index.map(|i| i.to_string()).unwrap_or_default();
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.url,
            row.syntax,
            index,
            row.item_type,
            row.property,
            shorten(&row.value, PREVIEW_VALUE_CHARS)
        );
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    let single_line = text.replace(['\n', '\r', '\t'], " ");
    match single_line.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &single_line[..end]),
        None => single_line,
    }
}
