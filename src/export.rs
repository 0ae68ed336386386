// 📤 Export - NormalizedRecord → delimited text → host
// Rendering is pure; saving goes through the ExportHost trait

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::normalizer::NormalizedRecord;

pub const HEADERS: [&str; 5] = ["Description", "Account", "Date", "Category", "Amount"];

pub const EXPORT_FILENAME: &str = "transactions.csv";
pub const EXPORT_MIME: &str = "text/csv;charset=utf-8";

pub const NOTHING_TO_EXPORT: &str = "No transactions found to export!";
pub const COPY_HEADING: &str = "Copy the CSV data below:";

// ============================================================================
// RENDERING
// ============================================================================

/// Quote a field iff it contains a comma, a double quote or a newline.
/// A missing value renders as an empty quoted pair.
pub fn escape_field(field: Option<&str>) -> String {
    let Some(field) = field else {
        return "\"\"".to_string();
    };

    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One line, newline included. Amount is written as-is.
pub fn render_row(record: &NormalizedRecord) -> String {
    format!(
        "{},{},{},{},{}\n",
        escape_field(Some(&record.description)),
        escape_field(Some(&record.account)),
        escape_field(Some(&record.date)),
        escape_field(Some(&record.category)),
        record.amount
    )
}

/// Header plus one line per record; None when there is nothing to export
pub fn render_csv(records: &[NormalizedRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let mut out = HEADERS.join(",");
    out.push('\n');
    for record in records {
        out.push_str(&render_row(record));
    }
    Some(out)
}

// ============================================================================
// HOST BOUNDARY
// ============================================================================

/// The file handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime: String,
    pub contents: String,
}

impl Artifact {
    pub fn csv(contents: String) -> Self {
        Artifact {
            filename: EXPORT_FILENAME.to_string(),
            mime: EXPORT_MIME.to_string(),
            contents,
        }
    }
}

/// ExportHost - what the surrounding environment can do with the output
pub trait ExportHost {
    /// Persist the artifact; an error means saving is unavailable
    fn save(&mut self, artifact: &Artifact) -> Result<()>;

    /// Show the text so the user can copy it by hand
    fn present_for_copy(&mut self, text: &str) -> Result<()>;

    /// User-visible notice
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved,
    CopyFallback,
    NothingToExport,
}

/// Render and hand off. Save failure degrades to the copy fallback.
pub fn export<H: ExportHost>(records: &[NormalizedRecord], host: &mut H) -> Result<ExportOutcome> {
    let Some(contents) = render_csv(records) else {
        warn!("nothing to export");
        host.notify(NOTHING_TO_EXPORT);
        return Ok(ExportOutcome::NothingToExport);
    };

    let artifact = Artifact::csv(contents);
    match host.save(&artifact) {
        Ok(()) => {
            info!(file = %artifact.filename, rows = records.len(), "export saved");
            Ok(ExportOutcome::Saved)
        }
        Err(e) => {
            warn!(error = %e, "save unavailable, falling back to copy");
            host.present_for_copy(&artifact.contents)?;
            Ok(ExportOutcome::CopyFallback)
        }
    }
}

// ============================================================================
// FILE HOST
// ============================================================================

/// Writes the artifact into a directory; copy fallback goes to the terminal
pub struct FileHost {
    pub out_dir: PathBuf,
    /// Skip saving and go straight to the copy fallback
    print_only: bool,
    saved_path: Option<PathBuf>,
}

impl FileHost {
    pub fn new(out_dir: PathBuf) -> Self {
        FileHost {
            out_dir,
            print_only: false,
            saved_path: None,
        }
    }

    /// Builder pattern: never save, always present for copy
    pub fn print_only(mut self, print_only: bool) -> Self {
        self.print_only = print_only;
        self
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved_path.as_ref()
    }
}

impl ExportHost for FileHost {
    fn save(&mut self, artifact: &Artifact) -> Result<()> {
        if self.print_only {
            anyhow::bail!("saving disabled");
        }

        let path = self.out_dir.join(&artifact.filename);
        fs::write(&path, artifact.contents.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.saved_path = Some(path);
        Ok(())
    }

    fn present_for_copy(&mut self, text: &str) -> Result<()> {
        #[cfg(feature = "tui")]
        {
            use std::io::IsTerminal;
            if io::stdout().is_terminal() {
                return crate::ui::run_copy_overlay(text);
            }
        }

        eprintln!("{}", COPY_HEADING);
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .context("Failed to write CSV to stdout")?;
        stdout.flush()?;
        Ok(())
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

// ============================================================================
// TESTS
// ============================================================================
