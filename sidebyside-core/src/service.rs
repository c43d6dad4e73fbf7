//! The comparison pipeline behind `POST /compare`.
//!
//! A request body is parsed and normalized into options, checked against the
//! option bounds and the credential, turned into a prompt, sent to the
//! completion provider once, validated against the comparison schema and
//! rendered. Every failure is terminal for the request.

use crate::config::LlmConfig;
use crate::error::{Rejection, ServiceError};
use crate::prompt::build_prompt;
use crate::providers::{CompletionProvider, OpenAiCompatibleProvider};
use crate::render::render_fragment;
use crate::schema::parse_completion;
use crate::types::{ComparisonOption, MAX_OPTIONS, MIN_OPTIONS, OptionInput, REQUEST_VERSION};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Immutable, shareable comparison service.
pub struct ComparisonService {
    config: LlmConfig,
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl std::fmt::Debug for ComparisonService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonService")
            .field("model", &self.model())
            .field("provider_configured", &self.provider_configured())
            .finish()
    }
}

impl ComparisonService {
    /// Build the service with an OpenAI-compatible provider.
    ///
    /// A missing credential does not fail construction: the service starts
    /// and answers each otherwise valid request with a configuration error.
    pub fn from_config(config: LlmConfig) -> Result<Self, ServiceError> {
        for warning in config.validate() {
            warn!("LLM config: {}", warning);
        }
        let provider: Option<Arc<dyn CompletionProvider>> =
            match OpenAiCompatibleProvider::new(&config) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(ServiceError::MissingCredential { var }) => {
                    warn!(var = %var, "No API key configured; comparisons will fail");
                    None
                }
                Err(e) => return Err(e),
            };
        Ok(Self { config, provider })
    }

    /// Build the service around an explicit provider.
    pub fn with_provider(config: LlmConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            config,
            provider: Some(provider),
        }
    }

    /// Build a service with no credential configured.
    pub fn unconfigured(config: LlmConfig) -> Self {
        Self {
            config,
            provider: None,
        }
    }

    pub fn provider_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn model(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.model_name())
            .unwrap_or(self.config.model.as_str())
    }

    /// Run one comparison for a raw request body, returning the HTML fragment.
    pub async fn compare(&self, body: &[u8]) -> Result<String, ServiceError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("compare", %request_id);
        self.compare_inner(body).instrument(span).await
    }

    async fn compare_inner(&self, body: &[u8]) -> Result<String, ServiceError> {
        let options = parse_request(body).inspect_err(|rejection| {
            info!(reason = %rejection, "Rejected comparison request");
        })?;

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ServiceError::MissingCredential {
                var: self.config.api_key_env.clone(),
            })?;

        let prompt = build_prompt(&options);
        let started = Instant::now();
        info!(option_count = options.len(), model = provider.model_name(), "Requesting comparison");

        let content = provider.complete(&prompt).await.inspect_err(|e| {
            warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Completion failed");
        })?;

        let result = parse_completion(&content, &options).inspect_err(|e| {
            warn!(error = %e, "Completion did not match the comparison schema");
            debug!(content = %content, "Rejected completion content");
        })?;

        let html = render_fragment(&options, &result);
        info!(
            option_count = options.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = html.len(),
            "Comparison rendered"
        );
        Ok(html)
    }
}

/// Parse and normalize a request body into options.
///
/// Accepts `{"version": 1, "options": [{"name": .., "text": ..}]}` with
/// `version` optional. A missing or non-array `options` counts as empty.
/// Options given as bare strings are rejected.
pub fn parse_request(body: &[u8]) -> Result<Vec<ComparisonOption>, Rejection> {
    let value: Value = serde_json::from_slice(body).map_err(|_| Rejection::InvalidJson)?;

    match value.get("version") {
        None | Some(Value::Null) => {}
        Some(v) if v.as_u64() == Some(REQUEST_VERSION) => {}
        Some(_) => return Err(Rejection::UnsupportedVersion),
    }

    let items = value
        .get("options")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut options = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let input = option_input(index, item)?;
        if let Some(option) = ComparisonOption::from_input(index, &input) {
            options.push(option);
        }
    }

    match options.len() {
        n if n < MIN_OPTIONS => Err(Rejection::TooFewOptions { count: n }),
        n if n > MAX_OPTIONS => Err(Rejection::TooManyOptions { count: n }),
        _ => Ok(options),
    }
}

fn option_input(index: usize, item: &Value) -> Result<OptionInput, Rejection> {
    let position = index + 1;
    let obj = match item {
        Value::Object(obj) => obj,
        Value::String(_) => return Err(Rejection::DeprecatedShape { position }),
        _ => return Err(Rejection::InvalidOption { position }),
    };
    let field = |key: &str| match obj.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Rejection::InvalidOption { position }),
    };
    Ok(OptionInput {
        name: field("name")?,
        text: field("text")?,
    })
}
