// 🧹 Normalizer - RawRecord → NormalizedRecord
// Pure field transforms: description rewrite, category, date shape, sign flip

use chrono::{Datelike, Local};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::extractor::RawRecord;
use crate::rules::KeywordMap;

/// Account column is always the source institution
pub const ACCOUNT: &str = "Sofi";

/// Category forced onto every record from the pending grouping
pub const PENDING_CATEGORY: &str = "Pending";

/// Month prefixes; index + 1 is the month number.
/// Matched with `starts_with`, so "Nov" and "November" both resolve.
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ============================================================================
// NORMALIZED RECORD
// ============================================================================

/// One output row, column order matches the export header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub description: String,

    pub account: String,

    /// `M/D/YYYY`, or the source text when it had no recognized shape
    pub date: String,

    /// Empty or a member of the allow-list
    pub category: String,

    /// Two-decimal amount with the sign flipped relative to the page
    pub amount: String,
}

// ============================================================================
// PATTERNS
// ============================================================================

/// "November 22, 2025" / "Nov 22 2025"
fn full_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+)\s+([0-9]{1,2}),?\s+([0-9]{4})$")
            .expect("invalid full date regex")
    })
}

/// "May 29"
fn short_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{3})\s([0-9]{1,2})$").expect("invalid short date regex")
    })
}

/// Longest numeric prefix, the way a lenient float parser reads it
fn leading_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*((?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
            .expect("invalid number regex")
    })
}

// ============================================================================
// FIELD TRANSFORMS
// ============================================================================

fn month_number(name: &str) -> Option<usize> {
    MONTHS.iter().position(|m| name.starts_with(m)).map(|i| i + 1)
}

/// Reformat a page date to `M/D/YYYY`.
///
/// Recognized shapes:
/// - month name + day + 4-digit year ("November 22, 2025" → "11/22/2025")
/// - 3-letter month + day ("May 29" → "5/29/<year>")
///
/// Anything else comes back verbatim.
pub fn format_date(text: &str, year: i32) -> String {
    if let Some(caps) = full_date_re().captures(text) {
        if let Some(month) = month_number(&caps[1]) {
            return format!("{}/{}/{}", month, &caps[2], &caps[3]);
        }
    }

    if let Some(caps) = short_date_re().captures(text) {
        if let Some(month) = month_number(&caps[1]) {
            return format!("{}/{}/{}", month, &caps[2], year);
        }
    }

    text.to_string()
}

/// Flip the sign of a page amount and render it with two decimals.
///
/// `-$12.34` → `12.34`, `$12.34` → `-12.34`, `($5.00)` → `5.00`.
/// Text with no numeric prefix renders as `NaN`.
pub fn invert_amount(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| !matches!(c, '$' | ',')).collect();

    let is_negative =
        cleaned.starts_with('-') || (cleaned.starts_with('(') && cleaned.ends_with(')'));

    let unsigned: String = cleaned
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '+' | '-'))
        .collect();

    let value = leading_number_re()
        .captures(&unsigned)
        .and_then(|caps| caps[1].parse::<f64>().ok());

    match value {
        Some(value) if value.is_finite() => {
            let inverted = if is_negative { value } else { -value };
            format_two_places(inverted)
        }
        _ => {
            warn!(amount = text, "amount is not numeric, emitting NaN");
            "NaN".to_string()
        }
    }
}

/// Two decimals, ties rounded away from zero
fn format_two_places(value: f64) -> String {
    let cents = (value.abs() * 100.0).round();
    if cents == 0.0 {
        // no "-0.00"
        return "0.00".to_string();
    }
    let rounded = (cents / 100.0).copysign(value);
    format!("{:.2}", rounded)
}

// ============================================================================
// NORMALIZER
// ============================================================================

pub struct Normalizer {
    keywords: KeywordMap,
    year: i32,
}

impl Normalizer {
    /// Yearless dates resolve against the local calendar year at construction
    pub fn new(keywords: KeywordMap) -> Self {
        Normalizer {
            keywords,
            year: Local::now().year(),
        }
    }

    /// Builder pattern: pin the year used for yearless dates
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn rewrite_description(&self, text: &str) -> String {
        self.keywords
            .description_for(text)
            .unwrap_or(text)
            .to_string()
    }

    pub fn classify(&self, text: &str, is_pending: bool) -> String {
        if is_pending {
            return PENDING_CATEGORY.to_string();
        }

        self.keywords
            .category_for(text)
            .unwrap_or("")
            .to_string()
    }

    pub fn format_date(&self, text: &str) -> String {
        format_date(text, self.year)
    }

    pub fn invert_amount(&self, text: &str) -> String {
        invert_amount(text)
    }

    /// Normalize a single record. Category is derived from the original description.
    pub fn normalize(&self, raw: &RawRecord) -> NormalizedRecord {
        NormalizedRecord {
            description: self.rewrite_description(&raw.description),
            account: ACCOUNT.to_string(),
            date: self.format_date(&raw.date),
            category: self.classify(&raw.description, raw.is_pending),
            amount: self.invert_amount(&raw.amount),
        }
    }

    /// Normalize every record, then reverse the sequence
    pub fn normalize_all(&self, records: &[RawRecord]) -> Vec<NormalizedRecord> {
        records.iter().rev().map(|raw| self.normalize(raw)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
