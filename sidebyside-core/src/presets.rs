//! Preset catalog.
//!
//! A preset category maps to a list of ready-made options that prefill the
//! form. The special key [`CLEAR_KEY`] is not a category: loading it empties
//! the form and the result view. Extra categories can be loaded from TOML:
//!
//! ```toml
//! [[espresso]]
//! name = "Manual lever"
//! text = "Full control, steep learning curve. https://example.com/lever"
//! ```

use crate::error::ConfigError;
use crate::types::OptionInput;
use std::collections::BTreeMap;
use std::path::Path;

/// Preset key that resets the form instead of loading a category.
pub const CLEAR_KEY: &str = "clear";

/// Ordered map from category key to its options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetCatalog {
    categories: BTreeMap<String, Vec<OptionInput>>,
}

impl PresetCatalog {
    /// The seed catalog shipped with the tool.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        for (key, entries) in BUILTIN {
            catalog.categories.insert(
                key.to_string(),
                entries
                    .iter()
                    .map(|(name, text)| OptionInput::new(*name, *text))
                    .collect(),
            );
        }
        catalog
    }

    /// Parse categories from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let categories: BTreeMap<String, Vec<OptionInput>> =
            toml::from_str(source).map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })?;
        if categories.contains_key(CLEAR_KEY) {
            return Err(ConfigError::Invalid {
                message: format!("\"{CLEAR_KEY}\" is reserved and cannot name a preset"),
            });
        }
        Ok(Self { categories })
    }

    /// Read categories from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&source)
    }

    /// Add (or replace) categories from `other`.
    pub fn merge(&mut self, other: PresetCatalog) {
        self.categories.extend(other.categories);
    }

    /// Category keys in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Options for `key`, or `None` for unknown keys (including [`CLEAR_KEY`]).
    pub fn get(&self, key: &str) -> Option<&[OptionInput]> {
        self.categories.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

const BUILTIN: &[(&str, &[(&str, &str)])] = &[
    (
        "headphones",
        &[
            (
                "Over-ear ANC",
                "Over-ear noise cancelling headphones. Best isolation and comfort, but bulkier. Great for travel and office. https://example.com/overear",
            ),
            (
                "On-ear",
                "On-ear headphones. Lightweight and portable. Less isolation than over-ear. Good for short sessions. https://example.com/onear",
            ),
            (
                "Earbuds",
                "In-ear earbuds. Most portable. Great for workouts and calls. Comfort varies. https://example.com/earbuds",
            ),
        ],
    ),
    (
        "mattress",
        &[
            (
                "Memory foam",
                "Contouring feel, strong pressure relief, great motion isolation. Can sleep warm. https://example.com/foam",
            ),
            (
                "Hybrid",
                "Foam + coils. Balanced support, often cooler, better edge support. Higher price. https://example.com/hybrid",
            ),
            (
                "Latex",
                "Durable and responsive, often cooler than memory foam. Higher cost. https://example.com/latex",
            ),
        ],
    ),
    (
        "grill",
        &[
            (
                "Gas grill",
                "Fast heat-up, easy temperature control, great for weeknights. Less smoky flavor. https://example.com/gas",
            ),
            (
                "Charcoal grill",
                "Best smoky flavor. More effort, longer setup, more cleanup. https://example.com/charcoal",
            ),
            (
                "Pellet grill",
                "Set-and-forget temperature. Great BBQ. Higher cost and more parts. https://example.com/pellet",
            ),
        ],
    ),
    (
        "laptop",
        &[
            (
                "Ultrabook",
                "Thin/light, long battery, best for productivity and travel. Less gaming power. https://example.com/ultrabook",
            ),
            (
                "Performance",
                "Faster CPU/GPU for heavier work. Heavier/louder. Shorter battery. https://example.com/performance",
            ),
            (
                "Budget",
                "Best value. Fine for browsing/docs. Lower build/screen quality. https://example.com/budget",
            ),
        ],
    ),
    (
        "powertools",
        &[
            (
                "Corded",
                "Consistent power, cheaper, no batteries. Needs outlet. https://example.com/corded",
            ),
            (
                "Cordless",
                "Portable and convenient. Battery ecosystem cost. https://example.com/cordless",
            ),
            (
                "Pro cordless",
                "Best durability and performance. Highest cost. https://example.com/pro",
            ),
        ],
    ),
    (
        "camera",
        &[
            (
                "Mirrorless",
                "Modern autofocus, great photo/video. Smaller body. https://example.com/mirrorless",
            ),
            (
                "DSLR",
                "Great battery and optical viewfinder. Bulkier system. https://example.com/dslr",
            ),
            (
                "Compact",
                "Easy carry/travel. Smaller sensor, simpler controls. https://example.com/compact",
            ),
        ],
    ),
];
