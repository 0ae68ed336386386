// 🏗️ Extractor - Layout strategies over a DOM snapshot
// One strategy per observed page layout, tried in a fixed order

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info};

// ============================================================================
// CORE TYPES
// ============================================================================

/// RawRecord - text as found on the page, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub is_pending: bool,
}

impl RawRecord {
    /// Records with neither a description nor an amount are dropped
    pub fn has_content(&self) -> bool {
        !self.description.is_empty() || !self.amount.is_empty()
    }
}

/// LayoutKind - which page layout produced the records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// One table per grouping, heading right before the table
    Table,
    /// role="list" / role="group" / role="listitem" containers
    GroupedList,
    /// Heading element followed by a ul/ol
    HeadingList,
}

impl LayoutKind {
    /// Order in which layouts are tried
    pub const PRIORITY: [LayoutKind; 3] =
        [LayoutKind::Table, LayoutKind::GroupedList, LayoutKind::HeadingList];

    pub fn name(&self) -> &str {
        match self {
            LayoutKind::Table => "table",
            LayoutKind::GroupedList => "grouped-list",
            LayoutKind::HeadingList => "heading-list",
        }
    }
}

/// Grouping - a heading-labelled cluster of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    Scheduled,
    Pending,
    /// Usually a day ("November 22, 2025"); lends its label as a date
    Labeled(String),
}

impl Grouping {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Scheduled" => Grouping::Scheduled,
            "Pending" => Grouping::Pending,
            other => Grouping::Labeled(other.to_string()),
        }
    }

    pub fn is_skipped(&self) -> bool {
        *self == Grouping::Scheduled
    }

    pub fn is_pending(&self) -> bool {
        *self == Grouping::Pending
    }

    /// Build a record, filling a blank date from the grouping label
    pub fn record(&self, date: String, description: String, amount: String) -> RawRecord {
        let date = match self {
            Grouping::Labeled(label) if date.is_empty() => label.clone(),
            _ => date,
        };

        RawRecord {
            date,
            description,
            amount,
            is_pending: self.is_pending(),
        }
    }
}

// ============================================================================
// LAYOUT STRATEGY TRAIT
// ============================================================================

/// LayoutStrategy - extract records from one page layout
///
/// A strategy that does not recognize the page returns an empty list.
/// Per-record failures are dropped inside the strategy.
pub trait LayoutStrategy {
    fn kind(&self) -> LayoutKind;

    fn extract(&self, doc: &Html) -> Vec<RawRecord>;
}

/// Get the strategy for a layout
pub fn get_strategy(kind: LayoutKind) -> Box<dyn LayoutStrategy> {
    match kind {
        LayoutKind::Table => Box::new(TableLayout),
        LayoutKind::GroupedList => Box::new(GroupedListLayout),
        LayoutKind::HeadingList => Box::new(HeadingListLayout),
    }
}

// ============================================================================
// SELECTORS & PATTERNS
// ============================================================================

macro_rules! selector {
    ($name:ident, $css:literal) => {
        fn $name() -> &'static Selector {
            static SEL: OnceLock<Selector> = OnceLock::new();
            SEL.get_or_init(|| Selector::parse($css).expect(concat!("invalid selector: ", $css)))
        }
    };
}

selector!(table_sel, ".transactions table");
selector!(table_row_sel, "tbody tr");
selector!(date_cell_sel, ".col0");
selector!(visible_span_sel, "span:not(.visually-hidden)");
selector!(hidden_span_sel, "span.visually-hidden");
selector!(description_cell_sel, ".col1.sr-mask span");
selector!(amount_cell_sel, ".col4 span");

selector!(group_sel, r#"div[role="list"] > div[role="group"]"#);
selector!(group_heading_sel, "div:first-child");
selector!(list_item_sel, r#"div[role="listitem"]"#);
selector!(button_sel, "button");
selector!(text_block_sel, "div, span, p");

selector!(
    heading_list_sel,
    "h1 + ul, h2 + ul, h3 + ul, h4 + ul, h5 + ul, h6 + ul, \
     h1 + ol, h2 + ol, h3 + ol, h4 + ol, h5 + ol, h6 + ol"
);

/// Currency with two decimals, optionally signed: "-$12.34", "+$0.90", "12.34"
fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-$+]?\$?[0-9,]+\.[0-9]{2}$").expect("invalid amount regex"))
}

/// "Nov 22", "November 22, 2025"
fn date_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Z][a-z]{2,8}\s+[0-9]{1,2}(,\s+[0-9]{4})?$").expect("invalid date regex")
    })
}

/// A line that carries a dollar amount somewhere
fn money_in_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$[0-9,]+\.[0-9]{2}").expect("invalid money regex"))
}

fn money_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-$]?\$?[0-9,]+\.[0-9]{2}").expect("invalid money token regex"))
}

// ============================================================================
// DOM HELPERS
// ============================================================================

/// Trimmed text content, descendants concatenated
fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn prev_element_sibling(el: ElementRef) -> Option<ElementRef> {
    el.prev_siblings().find_map(ElementRef::wrap)
}

fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// No div/span/p below this element
fn is_text_leaf(el: ElementRef) -> bool {
    el.select(text_block_sel()).next().is_none()
}

fn keep(records: &mut Vec<RawRecord>, layout: LayoutKind, result: Result<RawRecord>) {
    match result {
        Ok(record) if record.has_content() => records.push(record),
        Ok(_) => debug!(layout = layout.name(), "dropping empty record"),
        Err(e) => debug!(layout = layout.name(), error = %e, "dropping record"),
    }
}

// ============================================================================
// TABLE LAYOUT
// ============================================================================

pub struct TableLayout;

impl TableLayout {
    fn extract_row(&self, row: ElementRef, grouping: &Grouping) -> Result<RawRecord> {
        let date_cell = row
            .select(date_cell_sel())
            .next()
            .context("row has no date cell")?;

        // Visible date first, accessibility text when the visible one is blank
        let visible = date_cell
            .select(visible_span_sel())
            .next()
            .map(text_of)
            .filter(|t| !t.is_empty());
        let date = match visible {
            Some(text) => text,
            None => date_cell
                .select(hidden_span_sel())
                .next()
                .map(text_of)
                .unwrap_or_default(),
        };

        let description = row
            .select(description_cell_sel())
            .next()
            .map(text_of)
            .unwrap_or_default();

        let amount = row
            .select(amount_cell_sel())
            .next()
            .map(text_of)
            .unwrap_or_default();

        Ok(grouping.record(date, description, amount))
    }
}

impl LayoutStrategy for TableLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Table
    }

    fn extract(&self, doc: &Html) -> Vec<RawRecord> {
        let mut records = Vec::new();

        for table in doc.select(table_sel()) {
            let Some(heading) = prev_element_sibling(table) else {
                continue;
            };

            let grouping = Grouping::from_label(&text_of(heading));
            if grouping.is_skipped() {
                continue;
            }

            for row in table.select(table_row_sel()) {
                keep(&mut records, self.kind(), self.extract_row(row, &grouping));
            }
        }

        records
    }
}

// ============================================================================
// GROUPED LIST LAYOUT
// ============================================================================

pub struct GroupedListLayout;

impl GroupedListLayout {
    fn extract_item(&self, item: ElementRef, grouping: &Grouping) -> Result<RawRecord> {
        let container = item.select(button_sel()).next().unwrap_or(item);

        let mut description = String::new();
        let mut amount = String::new();

        for el in container.select(text_block_sel()).filter(|el| is_text_leaf(*el)) {
            let text = text_of(el);

            if amount_re().is_match(&text) {
                // Later amounts in the item are running balances
                if amount.is_empty() {
                    amount = text;
                }
            } else if description.is_empty()
                && text.chars().count() > 2
                && !date_shape_re().is_match(&text)
                && !text.to_lowercase().contains("balance")
            {
                description = text;
            }
        }

        if description.is_empty() && amount.is_empty() {
            // Unstructured item: read it line by line
            let full_text = container.text().collect::<String>();
            for line in full_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                if money_in_line_re().is_match(line) {
                    if amount.is_empty() {
                        if let Some(token) = money_token_re().find(line) {
                            amount = token.as_str().to_string();
                        }
                    }
                } else if description.is_empty() && line.chars().count() > 2 {
                    description = line.to_string();
                }
            }
        }

        Ok(grouping.record(String::new(), description, amount))
    }
}

impl LayoutStrategy for GroupedListLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::GroupedList
    }

    fn extract(&self, doc: &Html) -> Vec<RawRecord> {
        let mut records = Vec::new();

        for group in doc.select(group_sel()) {
            let Some(heading) = group.select(group_heading_sel()).next() else {
                continue;
            };

            let grouping = Grouping::from_label(&text_of(heading));
            if grouping.is_skipped() {
                continue;
            }

            for item in group.select(list_item_sel()) {
                keep(&mut records, self.kind(), self.extract_item(item, &grouping));
            }
        }

        records
    }
}

// ============================================================================
// HEADING LIST LAYOUT
// ============================================================================

pub struct HeadingListLayout;

impl HeadingListLayout {
    /// Region 1 holds the description span; region 2 holds amount then date
    fn extract_item(&self, item: ElementRef, grouping: &Grouping) -> Result<RawRecord> {
        let mut regions = element_children(item);
        let first = regions.next().context("item has no description region")?;
        let second = regions.next().context("item has no amount region")?;

        let description = element_children(first)
            .find(|el| el.value().name() == "span")
            .map(text_of)
            .context("description span missing")?;

        let mut spans = element_children(second).filter(|el| el.value().name() == "span");
        let amount = spans.next().map(text_of).context("amount span missing")?;
        let date = spans.next().map(text_of).unwrap_or_default();

        Ok(grouping.record(date, description, amount))
    }
}

impl LayoutStrategy for HeadingListLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::HeadingList
    }

    fn extract(&self, doc: &Html) -> Vec<RawRecord> {
        let mut records = Vec::new();

        for list in doc.select(heading_list_sel()) {
            let Some(heading) = prev_element_sibling(list) else {
                continue;
            };

            let grouping = Grouping::from_label(&text_of(heading));
            if grouping.is_skipped() {
                continue;
            }

            for item in element_children(list).filter(|el| el.value().name() == "li") {
                keep(&mut records, self.kind(), self.extract_item(item, &grouping));
            }
        }

        records
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Records plus the layout that produced them (None when nothing matched)
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub layout: Option<LayoutKind>,
    pub records: Vec<RawRecord>,
}

pub struct Extractor {
    strategies: Vec<Box<dyn LayoutStrategy>>,
}

impl Extractor {
    /// All known layouts in priority order
    pub fn new() -> Self {
        Extractor::with_layouts(&LayoutKind::PRIORITY)
    }

    pub fn with_layouts(layouts: &[LayoutKind]) -> Self {
        Extractor {
            strategies: layouts.iter().map(|kind| get_strategy(*kind)).collect(),
        }
    }

    /// Commit to the first strategy that yields any record
    pub fn extract(&self, doc: &Html) -> Extraction {
        for strategy in &self.strategies {
            let records = strategy.extract(doc);
            if !records.is_empty() {
                info!(
                    layout = strategy.kind().name(),
                    count = records.len(),
                    "extracted transactions"
                );
                return Extraction {
                    layout: Some(strategy.kind()),
                    records,
                };
            }
            debug!(layout = strategy.kind().name(), "layout matched nothing");
        }

        Extraction::default()
    }

    pub fn extract_html(&self, html: &str) -> Extraction {
        let doc = Html::parse_document(html);
        self.extract(&doc)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_PAGE: &str = include_str!("../fixtures/table_layout.html");
    const GROUPED_PAGE: &str = include_str!("../fixtures/grouped_list_layout.html");
    const HEADING_PAGE: &str = include_str!("../fixtures/heading_list_layout.html");

    fn rec(date: &str, description: &str, amount: &str, is_pending: bool) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            is_pending,
        }
    }

    #[test]
    fn test_layout_names() {
        assert_eq!(LayoutKind::Table.name(), "table");
        assert_eq!(LayoutKind::GroupedList.name(), "grouped-list");
        assert_eq!(LayoutKind::HeadingList.name(), "heading-list");
    }

    #[test]
    fn test_get_strategy_kind() {
        for kind in LayoutKind::PRIORITY {
            assert_eq!(get_strategy(kind).kind(), kind);
        }
    }

    #[test]
    fn test_grouping_from_label() {
        assert_eq!(Grouping::from_label("Scheduled"), Grouping::Scheduled);
        assert_eq!(Grouping::from_label("Pending"), Grouping::Pending);
        // exact match only
        assert_eq!(
            Grouping::from_label("pending"),
            Grouping::Labeled("pending".to_string())
        );
    }

    #[test]
    fn test_grouping_date_inheritance() {
        let day = Grouping::from_label("May 29, 2025");
        let r = day.record(String::new(), "X".into(), "$1.00".into());
        assert_eq!(r.date, "May 29, 2025");
        assert!(!r.is_pending);

        let own = day.record("May 28".into(), "X".into(), "$1.00".into());
        assert_eq!(own.date, "May 28");

        let pending = Grouping::Pending.record(String::new(), "X".into(), "$1.00".into());
        assert_eq!(pending.date, "");
        assert!(pending.is_pending);
    }

    #[test]
    fn test_table_layout() {
        let doc = Html::parse_document(TABLE_PAGE);
        let records = TableLayout.extract(&doc);

        assert_eq!(
            records,
            vec![
                rec("May 30", "COSTCO WHSE #0123", "-$54.21", true),
                rec("May 29", "TACOS LOS ANGELES #4", "-$12.34", false),
                rec("May 28", "Tacos, Los Angeles", "-$1,204.50", false),
                rec("May 27", "Direct Deposit ACME", "$2,000.00", false),
            ]
        );
    }

    #[test]
    fn test_table_layout_prefers_visible_date() {
        let doc = Html::parse_document(TABLE_PAGE);
        let records = TableLayout.extract(&doc);

        // hidden span reads "May 29, 2025"
        let tacos = records
            .iter()
            .find(|r| r.description == "TACOS LOS ANGELES #4")
            .unwrap();
        assert_eq!(tacos.date, "May 29");
    }

    #[test]
    fn test_table_layout_skips_scheduled() {
        let doc = Html::parse_document(TABLE_PAGE);
        let records = TableLayout.extract(&doc);
        assert!(records.iter().all(|r| r.description != "FUTURE RENT"));
    }

    #[test]
    fn test_grouped_list_layout() {
        let doc = Html::parse_document(GROUPED_PAGE);
        let records = GroupedListLayout.extract(&doc);

        assert_eq!(
            records,
            vec![
                rec("", "HOT DOG STAND", "-$6.50", true),
                rec("November 22, 2025", "WALMART SUPERCENTER", "-$45.10", false),
                rec("November 22, 2025", "Roundup", "+$0.90", false),
                rec("November 22, 2025", "SLCC BOOKSTORE", "-$120.00", false),
            ]
        );
    }

    #[test]
    fn test_grouped_list_first_amount_wins() {
        let html = r#"
            <div role="list"><div role="group">
              <div>Nov 3</div>
              <div role="listitem"><button>
                <span>$9.99</span><span>Netflix</span><span>$100.00</span>
              </button></div>
            </div></div>"#;
        let records = GroupedListLayout.extract(&Html::parse_document(html));

        assert_eq!(records, vec![rec("Nov 3", "Netflix", "$9.99", false)]);
    }

    #[test]
    fn test_grouped_list_skips_balance_text() {
        let html = r#"
            <div role="list"><div role="group">
              <div>Nov 3</div>
              <div role="listitem"><button>
                <span>-$15.49</span><span>Available balance</span><span>NETFLIX.COM</span>
              </button></div>
            </div></div>"#;
        let records = GroupedListLayout.extract(&Html::parse_document(html));

        assert_eq!(records, vec![rec("Nov 3", "NETFLIX.COM", "-$15.49", false)]);
    }

    #[test]
    fn test_heading_list_layout() {
        let doc = Html::parse_document(HEADING_PAGE);
        let records = HeadingListLayout.extract(&doc);

        assert_eq!(
            records,
            vec![
                rec("Jun 2", "MEGAPLEX THEATERS", "-$24.00", true),
                rec("Jun 1", "BEANS & BREWS #12", "-$4.75", false),
                rec("June 1, 2025", "Prime Video Channels", "-$8.99", false),
            ]
        );
    }

    #[test]
    fn test_extractor_picks_matching_layout() {
        let extractor = Extractor::new();

        assert_eq!(extractor.extract_html(TABLE_PAGE).layout, Some(LayoutKind::Table));
        assert_eq!(
            extractor.extract_html(GROUPED_PAGE).layout,
            Some(LayoutKind::GroupedList)
        );
        assert_eq!(
            extractor.extract_html(HEADING_PAGE).layout,
            Some(LayoutKind::HeadingList)
        );
    }

    #[test]
    fn test_extractor_does_not_mix_layouts() {
        let html = format!("{}{}", TABLE_PAGE, GROUPED_PAGE);
        let extraction = Extractor::new().extract_html(&html);

        assert_eq!(extraction.layout, Some(LayoutKind::Table));
        assert_eq!(extraction.records.len(), 4);
        assert!(extraction.records.iter().all(|r| r.description != "WALMART SUPERCENTER"));
    }

    #[test]
    fn test_extractor_falls_through_when_only_scheduled() {
        let html = format!(
            r#"<div class="transactions"><h2>Scheduled</h2><table><tbody>
                <tr><td class="col0"><span>Jun 9</span></td>
                    <td class="col1 sr-mask"><span>RENT</span></td>
                    <td class="col4"><span>-$900.00</span></td></tr>
               </tbody></table></div>{}"#,
            HEADING_PAGE
        );
        let extraction = Extractor::new().extract_html(&html);

        assert_eq!(extraction.layout, Some(LayoutKind::HeadingList));
    }

    #[test]
    fn test_extractor_empty_page() {
        let extraction = Extractor::new().extract_html("<html><body><p>Log in</p></body></html>");

        assert_eq!(extraction.layout, None);
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn test_extractor_custom_priority() {
        let html = format!("{}{}", TABLE_PAGE, GROUPED_PAGE);
        let extractor = Extractor::with_layouts(&[LayoutKind::GroupedList, LayoutKind::Table]);
        let extraction = extractor.extract_html(&html);

        assert_eq!(extraction.layout, Some(LayoutKind::GroupedList));
    }
}
