//! # Sidebyside Core
//!
//! Core library for the sidebyside comparison tool.
//! Provides the comparison service (validation, prompt, LLM provider, schema
//! validation, HTML rendering), the axum server, and the headless form
//! controller used by clients (presets, submit cycle, exports).

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod presets;
pub mod prompt;
pub mod providers;
pub mod render;
pub mod sanitize;
pub mod schema;
pub mod server;
pub mod service;
pub mod types;

// Re-export commonly used types at the crate root.
pub use client::CompareClient;
pub use config::{ServiceConfig, config_exists, load_config};
pub use error::{ClientError, ConfigError, FormError, LlmError, Rejection, SchemaError, ServiceError};
pub use form::{FormController, SubmitState, SubmitTicket};
pub use providers::{CompletionProvider, MockCompletionProvider, OpenAiCompatibleProvider};
pub use service::ComparisonService;
pub use types::{
    ComparisonOption, ComparisonRequest, ComparisonResult, Confidence, OptionInput, Recap,
    RowName, SiteLink,
};
