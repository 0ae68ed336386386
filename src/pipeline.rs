// 🔄 Pipeline - snapshot → extract → normalize → export
// Single pass, no state beyond the keyword tables

use anyhow::Result;
use scraper::Html;
use tracing::info;

use crate::export::{export, ExportHost, ExportOutcome};
use crate::extractor::{Extractor, LayoutKind};
use crate::normalizer::Normalizer;

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub layout: Option<LayoutKind>,
    pub extracted: usize,
    pub outcome: ExportOutcome,
}

pub fn run<H: ExportHost>(html: &str, normalizer: &Normalizer, host: &mut H) -> Result<Report> {
    info!("Bank HTML to CSV export activated");

    let doc = Html::parse_document(html);
    let extraction = Extractor::new().extract(&doc);

    let records = normalizer.normalize_all(&extraction.records);
    let outcome = export(&records, host)?;

    info!(
        layout = ?extraction.layout,
        extracted = extraction.records.len(),
        outcome = ?outcome,
        "run finished"
    );

    Ok(Report {
        layout: extraction.layout,
        extracted: extraction.records.len(),
        outcome,
    })
}

// ============================================================================
// TESTS
// ============================================================================
