//! Fundamental types for comparison requests and results.
//!
//! Everything here is request-scoped: options are built from client input at
//! submit time and discarded once the response fragment has been rendered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Minimum number of non-empty options a comparison needs.
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of options a comparison accepts.
pub const MAX_OPTIONS: usize = 10;
/// Cell text used when the model had nothing to say.
pub const PLACEHOLDER: &str = "—";
/// Fallback suggestion when no option is clearly preferable.
pub const NO_CLEAR_WINNER: &str = "No clear winner";
/// Canonical request schema version.
pub const REQUEST_VERSION: u64 = 1;

static URL_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r#"https?://[^\s<>"'`]+"#).unwrap());

/// One option as entered by a user (name may be blank).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
}

impl OptionInput {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Body of `POST /compare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub version: u64,
    pub options: Vec<OptionInput>,
}

impl ComparisonRequest {
    /// Build a canonical (current version) request.
    pub fn new(options: Vec<OptionInput>) -> Self {
        Self {
            version: REQUEST_VERSION,
            options,
        }
    }
}

/// A normalized option ready for prompting and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOption {
    pub name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ComparisonOption {
    /// Normalize the input at `index` (zero-based).
    ///
    /// Returns `None` when the text is empty after trimming. A blank name
    /// becomes `Option {index + 1}`.
    pub fn from_input(index: usize, input: &OptionInput) -> Option<Self> {
        let text = input.text.trim();
        if text.is_empty() {
            return None;
        }
        let name = match input.name.trim() {
            "" => format!("Option {}", index + 1),
            name => name.to_string(),
        };
        Some(Self {
            name,
            url: first_url(text),
            text: text.to_string(),
        })
    }
}

/// Find the first http(s) URL in free text.
///
/// Trailing sentence punctuation is not considered part of the URL.
pub fn first_url(text: &str) -> Option<String> {
    URL_PATTERN.find_iter(text).find_map(|m| {
        let candidate = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '}']);
        url::Url::parse(candidate)
            .ok()
            .filter(|u| u.host_str().is_some())
            .map(|_| candidate.to_string())
    })
}

/// The six fixed rows of every comparison table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowName {
    CoreUseCase,
    KeyFeatures,
    Pros,
    Cons,
    BestFor,
    NotIdealFor,
}

impl RowName {
    pub const ALL: [RowName; 6] = [
        RowName::CoreUseCase,
        RowName::KeyFeatures,
        RowName::Pros,
        RowName::Cons,
        RowName::BestFor,
        RowName::NotIdealFor,
    ];

    /// Attribute label as it appears in prompts, upstream JSON and the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowName::CoreUseCase => "Core Use Case",
            RowName::KeyFeatures => "Key Features",
            RowName::Pros => "Pros",
            RowName::Cons => "Cons",
            RowName::BestFor => "Best For",
            RowName::NotIdealFor => "Not Ideal For",
        }
    }

    /// Exact-match lookup of an attribute label.
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == attribute)
    }
}

impl fmt::Display for RowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One table cell: a short list of phrases. Empty means "unknown".
pub type Cell = Vec<String>;

/// Confidence attached to the recap suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Confidence::Low),
            "medium" => Some(Confidence::Medium),
            "high" => Some(Confidence::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recap's recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Suggestion {
    /// Names one of the submitted options exactly.
    Option(String),
    NoClearWinner,
}

impl Suggestion {
    pub fn label(&self) -> &str {
        match self {
            Suggestion::Option(name) => name,
            Suggestion::NoClearWinner => NO_CLEAR_WINNER,
        }
    }
}

/// Recommendation summary shown under the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_line: Option<String>,
    pub suggestion: Suggestion,
    pub confidence: Confidence,
    #[serde(default)]
    pub why: Vec<String>,
    #[serde(default)]
    pub key_differences: Vec<String>,
}

/// A validated upstream completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Cells per row, one per option position. Rows may be missing and
    /// cell vectors may be shorter than the option count.
    pub rows: BTreeMap<RowName, Vec<Cell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recap: Option<Recap>,
}

impl ComparisonResult {
    /// Cell for `row` at option position `index`, if the model supplied one.
    pub fn cell(&self, row: RowName, index: usize) -> Option<&Cell> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.get(index))
            .filter(|cell| !cell.is_empty())
    }
}

/// Display name and detected URL of one option, for the visit-site picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLink {
    pub name: String,
    pub url: String,
}
