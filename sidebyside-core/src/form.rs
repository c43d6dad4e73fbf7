//! Headless form controller.
//!
//! Owns everything the comparison form needs between user actions: option
//! slots, preset loading, the submit cycle and the rendered result. Each
//! submit is tagged with a monotonically increasing token and a
//! [`CancellationToken`]; starting a new submit cancels the previous one and
//! completions carrying an older token are dropped, so a slow response can
//! never overwrite a newer result.

use crate::client::CompareClient;
use crate::error::{ClientError, FormError};
use crate::export::{self, ExportFormat};
use crate::presets::{CLEAR_KEY, PresetCatalog};
use crate::sanitize::normalize_whitespace;
use crate::types::{ComparisonRequest, MAX_OPTIONS, MIN_OPTIONS, OptionInput, SiteLink};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Number of empty slots a fresh form starts with.
pub const DEFAULT_SLOTS: usize = 3;
/// Session key carrying a preset category into the form.
pub const PRESET_SESSION_KEY: &str = "preset_category";

pub const IDLE_MESSAGE: &str = "Your table will appear here.";
pub const GENERATING_MESSAGE: &str = "Generating comparison…";
pub const FAILURE_MESSAGE: &str = "Something went wrong.";

/// Where the form is in its submit cycle.
///
/// Local validation is synchronous, so there is no observable validating
/// state: [`FormController::begin_submit`] moves straight to `Rejected` or
/// `Requesting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    /// Local validation failed; nothing was sent.
    Rejected { message: String },
    Requesting { token: u64 },
    Rendered { html: String },
    Failed,
}

/// Everything a driver needs to perform one submit.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    pub token: u64,
    pub request: ComparisonRequest,
    pub cancel: CancellationToken,
}

/// Ephemeral key/value storage scoped to one browsing session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> Option<String>;
}

/// In-memory [`SessionStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

/// Owned state of one comparison form.
#[derive(Debug)]
pub struct FormController {
    entries: Vec<OptionInput>,
    state: SubmitState,
    last_token: u64,
    in_flight: Option<(u64, CancellationToken)>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            entries: vec![OptionInput::default(); DEFAULT_SLOTS],
            state: SubmitState::Idle,
            last_token: 0,
            in_flight: None,
        }
    }

    // --- Slots ---

    pub fn entries(&self) -> &[OptionInput] {
        &self.entries
    }

    /// Append an empty slot, returning its index.
    pub fn add_entry(&mut self) -> Result<usize, FormError> {
        if self.entries.len() >= MAX_OPTIONS {
            return Err(FormError::TooManyEntries { max: MAX_OPTIONS });
        }
        self.entries.push(OptionInput::default());
        Ok(self.entries.len() - 1)
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<OptionInput, FormError> {
        self.check_index(index)?;
        if self.entries.len() <= MIN_OPTIONS {
            return Err(FormError::TooFewEntries { min: MIN_OPTIONS });
        }
        Ok(self.entries.remove(index))
    }

    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> Result<(), FormError> {
        self.check_index(index)?;
        self.entries[index].name = name.into();
        Ok(())
    }

    pub fn set_text(&mut self, index: usize, text: impl Into<String>) -> Result<(), FormError> {
        self.check_index(index)?;
        self.entries[index].text = text.into();
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), FormError> {
        if index >= self.entries.len() {
            return Err(FormError::EntryOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Options ready to send: whitespace-normalized, empty texts dropped,
    /// blank names defaulted from the slot position.
    pub fn collect(&self) -> Vec<OptionInput> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let text = normalize_whitespace(&entry.text);
                if text.is_empty() {
                    return None;
                }
                let name = match normalize_whitespace(&entry.name) {
                    name if name.is_empty() => format!("Option {}", i + 1),
                    name => name,
                };
                Some(OptionInput { name, text })
            })
            .collect()
    }

    // --- Presets ---

    /// Reset slots and the result view, cancelling any in-flight submit.
    pub fn clear(&mut self) {
        self.cancel_in_flight();
        self.entries = vec![OptionInput::default(); DEFAULT_SLOTS];
        self.state = SubmitState::Idle;
    }

    /// Load a category from `catalog` into the slots, or clear the form for
    /// [`CLEAR_KEY`].
    pub fn load_preset(&mut self, catalog: &PresetCatalog, key: &str) -> Result<(), FormError> {
        if key == CLEAR_KEY {
            self.clear();
            return Ok(());
        }
        let preset = catalog.get(key).ok_or_else(|| FormError::UnknownPreset {
            key: key.to_string(),
        })?;
        let mut entries: Vec<OptionInput> = preset.iter().take(MAX_OPTIONS).cloned().collect();
        if entries.len() < MIN_OPTIONS {
            entries.resize(MIN_OPTIONS, OptionInput::default());
        }
        debug!(preset = key, entries = entries.len(), "Loaded preset");
        self.entries = entries;
        Ok(())
    }

    /// Consume a preset category handed over through the session store.
    ///
    /// The key is removed whether or not it names a known category.
    pub fn consume_handoff(
        &mut self,
        store: &mut dyn SessionStore,
        catalog: &PresetCatalog,
    ) -> Result<Option<String>, FormError> {
        let Some(key) = store.remove(PRESET_SESSION_KEY) else {
            return Ok(None);
        };
        self.load_preset(catalog, &key)?;
        Ok(Some(key))
    }

    // --- Submit cycle ---

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Text to show in the result area when no fragment is displayed.
    pub fn status_message(&self) -> &str {
        match &self.state {
            SubmitState::Idle => IDLE_MESSAGE,
            SubmitState::Rejected { message } => message.as_str(),
            SubmitState::Requesting { .. } => GENERATING_MESSAGE,
            SubmitState::Rendered { .. } => "",
            SubmitState::Failed => FAILURE_MESSAGE,
        }
    }

    /// Validate locally and start a submit.
    ///
    /// Any previous in-flight submit is cancelled first, including when the
    /// new one is rejected.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, FormError> {
        self.cancel_in_flight();

        let options = self.collect();
        if options.len() < MIN_OPTIONS {
            let err = FormError::NotEnoughOptions;
            self.state = SubmitState::Rejected {
                message: err.to_string(),
            };
            return Err(err);
        }

        self.last_token += 1;
        let token = self.last_token;
        let cancel = CancellationToken::new();
        self.in_flight = Some((token, cancel.clone()));
        self.state = SubmitState::Requesting { token };
        info!(token, option_count = options.len(), "Submitting comparison");

        Ok(SubmitTicket {
            token,
            request: ComparisonRequest::new(options),
            cancel,
        })
    }

    /// Apply the outcome of the submit identified by `token`.
    ///
    /// Returns `false` (and changes nothing) when `token` is not the current
    /// in-flight submit.
    pub fn complete(&mut self, token: u64, outcome: Result<String, ClientError>) -> bool {
        match &self.in_flight {
            Some((current, _)) if *current == token => {}
            _ => {
                debug!(token, "Ignoring stale completion");
                return false;
            }
        }
        self.in_flight = None;
        self.state = match outcome {
            Ok(html) => SubmitState::Rendered { html },
            Err(e) => {
                warn!(token, error = %e, "Comparison failed");
                SubmitState::Failed
            }
        };
        true
    }

    /// Abandon the in-flight submit, if any. Its completion will be ignored.
    pub fn cancel_in_flight(&mut self) {
        if let Some((token, cancel)) = self.in_flight.take() {
            debug!(token, "Cancelling in-flight submit");
            cancel.cancel();
            if self.state == (SubmitState::Requesting { token }) {
                self.state = SubmitState::Idle;
            }
        }
    }

    /// Run a full submit cycle against `client`.
    pub async fn submit(&mut self, client: &CompareClient) -> Result<&SubmitState, FormError> {
        let ticket = self.begin_submit()?;
        let outcome = client
            .compare_cancellable(&ticket.request, &ticket.cancel)
            .await;
        self.complete(ticket.token, outcome);
        Ok(&self.state)
    }

    // --- Result view ---

    /// The injected fragment, once a submit has rendered.
    pub fn result_html(&self) -> Option<&str> {
        match &self.state {
            SubmitState::Rendered { html } => Some(html),
            _ => None,
        }
    }

    /// Export actions are offered only when the result contains a table.
    pub fn exports_visible(&self) -> bool {
        self.result_html().is_some_and(export::has_table)
    }

    pub fn export(&self, format: ExportFormat) -> Result<String, FormError> {
        let html = self.result_html().ok_or(FormError::NoTable)?;
        export::export(html, format)
    }

    pub fn export_tsv(&self) -> Result<String, FormError> {
        self.export(ExportFormat::TSV)
    }

    pub fn export_csv(&self) -> Result<String, FormError> {
        self.export(ExportFormat::CSV)
    }

    /// Options offered by the visit-site picker.
    pub fn site_links(&self) -> Vec<SiteLink> {
        self.result_html().map(export::site_links).unwrap_or_default()
    }

    /// URL to open for the option named `name`.
    pub fn visit_url(&self, name: &str) -> Result<String, FormError> {
        self.site_links()
            .into_iter()
            .find(|link| link.name == name)
            .map(|link| link.url)
            .ok_or_else(|| FormError::NoSiteLink {
                name: name.to_string(),
            })
    }
}
