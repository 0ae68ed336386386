use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use bank_dom_csv::{run, ExportOutcome, FileHost, KeywordMap, Normalizer};

/// Export the transactions shown in a saved bank page as transactions.csv
#[derive(Parser, Debug)]
#[command(name = "bank-dom-csv", version)]
struct Cli {
    /// HTML snapshot of the transactions page ("-" reads stdin)
    input: PathBuf,

    /// Directory transactions.csv is written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Don't save; show the CSV for copying instead
    #[arg(long)]
    print: bool,

    /// Year used for dates shown without one ("May 29")
    #[arg(long)]
    year: Option<i32>,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout may carry the CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let html = read_snapshot(&cli.input)?;

    let keywords = KeywordMap::builtin()?;
    let mut normalizer = Normalizer::new(keywords);
    if let Some(year) = cli.year {
        normalizer = normalizer.with_year(year);
    }

    let mut host = FileHost::new(cli.out_dir).print_only(cli.print);
    let report = run(&html, &normalizer, &mut host)?;

    if report.outcome == ExportOutcome::Saved {
        if let Some(path) = host.saved_path() {
            eprintln!("✓ Wrote {} transactions to {}", report.extracted, path.display());
        }
    }

    Ok(())
}

fn read_snapshot(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut html = String::new();
        io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read HTML from stdin")?;
        return Ok(html);
    }

    fs::read_to_string(input)
        .with_context(|| format!("Failed to read HTML snapshot: {}", input.display()))
}
