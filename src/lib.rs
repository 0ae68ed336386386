// Bank DOM → CSV - Core Library
// Extractor → Normalizer → Exporter, exposed for the CLI host and tests

pub mod extractor;
pub mod rules;
pub mod normalizer;
pub mod export;
pub mod pipeline;

// Copy fallback overlay (only with the TUI feature)
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use extractor::{
    Extraction, Extractor, Grouping, LayoutKind, LayoutStrategy, RawRecord,
    get_strategy,
    TableLayout, GroupedListLayout, HeadingListLayout,
};
pub use rules::{KeywordMap, KeywordRule};
pub use normalizer::{
    Normalizer, NormalizedRecord, ACCOUNT, PENDING_CATEGORY,
    format_date, invert_amount,
};
pub use export::{
    Artifact, ExportHost, ExportOutcome, FileHost,
    escape_field, export, render_csv,
    EXPORT_FILENAME, EXPORT_MIME, HEADERS, NOTHING_TO_EXPORT,
};
pub use pipeline::{run, Report};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
