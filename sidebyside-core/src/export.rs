//! Spreadsheet export of a rendered comparison fragment.
//!
//! Exports are derived from the HTML the service returned, not from any
//! client-side model: the table's rows and cells are scanned with `scraper`,
//! each cell is whitespace-normalized, and recap lines follow the table.
//! TSV and CSV share one formatter and differ only in delimiter and quoting.

use crate::error::FormError;
use crate::render::{SITE_LINKS_ATTR, SITE_LINKS_CLASS};
use crate::sanitize::normalize_whitespace;
use crate::types::SiteLink;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static RECAP: LazyLock<Selector> = LazyLock::new(|| Selector::parse("section.recap").unwrap());
static BOTTOM_LINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.bottom-line").unwrap());
static SUGGESTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.suggestion").unwrap());
static CONFIDENCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.confidence").unwrap());
static WHY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul.why li").unwrap());
static KEY_DIFFERENCES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.key-differences li").unwrap());
static SITE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("div.{SITE_LINKS_CLASS}")).unwrap());

/// How a field is protected from the delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Fields are emitted as-is; whitespace normalization already removed
    /// tabs and line breaks.
    None,
    /// RFC 4180: wrap in double quotes when the field contains the
    /// delimiter, a quote, CR or LF, doubling embedded quotes.
    Rfc4180,
}

/// Export format, parameterizing the shared formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub delimiter: char,
    pub quoting: Quoting,
}

impl ExportFormat {
    /// Tab-separated, pasteable into spreadsheets.
    pub const TSV: ExportFormat = ExportFormat {
        delimiter: '\t',
        quoting: Quoting::None,
    };
    /// Comma-separated with RFC 4180 quoting.
    pub const CSV: ExportFormat = ExportFormat {
        delimiter: ',',
        quoting: Quoting::Rfc4180,
    };

    fn field(&self, value: &str) -> String {
        match self.quoting {
            Quoting::None => value.to_string(),
            Quoting::Rfc4180 => {
                let needs_quotes = value
                    .chars()
                    .any(|c| c == self.delimiter || matches!(c, '"' | '\r' | '\n'));
                if needs_quotes {
                    format!("\"{}\"", value.replace('"', "\"\""))
                } else {
                    value.to_string()
                }
            }
        }
    }

    fn record(&self, fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| self.field(f))
            .collect::<Vec<_>>()
            .join(&self.delimiter.to_string())
    }
}

/// Whether the fragment contains a comparison table.
pub fn has_table(html: &str) -> bool {
    Html::parse_fragment(html).select(&TABLE).next().is_some()
}

/// Export the fragment's table (and recap, if any) in `format`.
pub fn export(html: &str, format: ExportFormat) -> Result<String, FormError> {
    let doc = Html::parse_fragment(html);
    let table = doc.select(&TABLE).next().ok_or(FormError::NoTable)?;

    let mut lines: Vec<String> = table
        .select(&ROW)
        .map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
            format.record(&cells)
        })
        .collect();

    let recap = recap_lines(&doc);
    if !recap.is_empty() {
        lines.push(String::new());
        lines.extend(recap.iter().map(|line| format.record(std::slice::from_ref(line))));
    }

    Ok(lines.join("\n"))
}

/// Tab-separated export.
pub fn to_tsv(html: &str) -> Result<String, FormError> {
    export(html, ExportFormat::TSV)
}

/// Comma-separated export.
pub fn to_csv(html: &str) -> Result<String, FormError> {
    export(html, ExportFormat::CSV)
}

/// A list cell exports as `"; "`-joined phrases, anything else as its text.
fn cell_text(cell: ElementRef<'_>) -> String {
    let items: Vec<String> = cell
        .select(&LIST_ITEM)
        .map(|li| normalize_whitespace(&li.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        normalize_whitespace(&cell.text().collect::<String>())
    } else {
        items.join("; ")
    }
}

fn recap_lines(doc: &Html) -> Vec<String> {
    let Some(recap) = doc.select(&RECAP).next() else {
        return Vec::new();
    };
    let mut lines = Vec::new();

    if let Some(p) = recap.select(&BOTTOM_LINE).next() {
        lines.push(format!(
            "Bottom line: {}",
            normalize_whitespace(&p.text().collect::<String>())
        ));
    }

    if let Some(p) = recap.select(&SUGGESTION).next() {
        // The suggestion itself is the paragraph's own text, between the
        // label and the confidence badge.
        let label: String = p
            .children()
            .filter_map(|node| node.value().as_text().map(|t| &**t))
            .collect();
        let confidence = p
            .select(&CONFIDENCE)
            .next()
            .map(|span| normalize_whitespace(&span.text().collect::<String>()));
        let mut line = format!("Suggestion: {}", normalize_whitespace(&label));
        if let Some(confidence) = confidence {
            line.push_str(&format!(" ({confidence})"));
        }
        lines.push(line);
    }

    for (heading, selector) in [("Why", &*WHY), ("Key differences", &*KEY_DIFFERENCES)] {
        let items: Vec<String> = recap
            .select(selector)
            .map(|li| normalize_whitespace(&li.text().collect::<String>()))
            .collect();
        if !items.is_empty() {
            lines.push(format!("{heading}: {}", items.join("; ")));
        }
    }

    lines
}

/// Read the visit-site links carried in the fragment.
///
/// A missing or unreadable carrier yields no links.
pub fn site_links(html: &str) -> Vec<SiteLink> {
    let doc = Html::parse_fragment(html);
    doc.select(&SITE_LINKS)
        .next()
        .and_then(|div| div.value().attr(&format!("data-{SITE_LINKS_ATTR}")).map(str::to_string))
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}
