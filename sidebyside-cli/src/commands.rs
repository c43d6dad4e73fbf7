//! Subcommand handlers.

use anyhow::Context;
use sidebyside_core::config::{ServiceConfig, load_config, to_toml};
use sidebyside_core::form::{
    FAILURE_MESSAGE, MemorySessionStore, PRESET_SESSION_KEY, SessionStore,
};
use sidebyside_core::presets::{CLEAR_KEY, PresetCatalog};
use sidebyside_core::server;
use sidebyside_core::{
    CompareClient, ComparisonService, FormController, FormError, OptionInput, SubmitState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the comparison HTTP service
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Model identifier for completions
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Compare options through a running service
    Compare {
        /// Preset category to prefill the form with
        #[arg(short, long)]
        preset: Option<String>,
        /// Option as "Name=description" (repeatable; replaces preset slots)
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
        /// Service base URL
        #[arg(short, long)]
        server: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Copy the tab-separated table to the clipboard
        #[arg(long)]
        copy: bool,
        /// Open the official site of the named option
        #[arg(long = "open", value_name = "NAME")]
        open_site: Option<String>,
        /// Extra preset categories (TOML)
        #[arg(long)]
        presets_file: Option<PathBuf>,
    },
    /// List preset categories
    Presets {
        /// Extra preset categories (TOML)
        #[arg(long)]
        presets_file: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show the current merged configuration
    Show,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Tsv,
    Csv,
}

pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port, model } => handle_serve(workspace, host, port, model).await,
        Commands::Compare {
            preset,
            options,
            server,
            format,
            output,
            copy,
            open_site,
            presets_file,
        } => {
            let config = load(workspace)?;
            let catalog = catalog(presets_file.as_deref())?;
            let mut form = FormController::new();
            prepare_form(&mut form, &catalog, preset.as_deref(), &options)?;

            let server_url = server.unwrap_or(config.client.server_url);
            let client = CompareClient::new(&server_url);
            run_compare(&mut form, &client).await?;

            let rendered = match format {
                OutputFormat::Html => form.result_html().unwrap_or_default().to_string(),
                OutputFormat::Tsv => form.export_tsv()?,
                OutputFormat::Csv => form.export_csv()?,
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", rendered),
            }

            if copy {
                copy_to_clipboard(&form.export_tsv()?);
            }
            if let Some(name) = open_site {
                let url = form.visit_url(&name)?;
                open::that(&url).with_context(|| format!("Failed to open {}", url))?;
            }
            Ok(())
        }
        Commands::Presets { presets_file } => {
            let catalog = catalog(presets_file.as_deref())?;
            for key in catalog.categories() {
                let names: Vec<&str> = catalog
                    .get(key)
                    .unwrap_or_default()
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect();
                println!("{:<12} {}", key, names.join(", "));
            }
            println!("{:<12} (empties the form)", CLEAR_KEY);
            Ok(())
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load(workspace: &Path) -> anyhow::Result<ServiceConfig> {
    load_config(Some(workspace), None).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn catalog(extra: Option<&Path>) -> anyhow::Result<PresetCatalog> {
    let mut catalog = PresetCatalog::builtin();
    if let Some(path) = extra {
        let extra = PresetCatalog::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load presets: {}", e))?;
        catalog.merge(extra);
    }
    Ok(catalog)
}

async fn handle_serve(
    workspace: &Path,
    host: Option<String>,
    port: Option<u16>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let mut config = load(workspace)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(model) = model {
        config.llm.model = model;
    }

    let service = ComparisonService::from_config(config.llm)
        .map_err(|e| anyhow::anyhow!("Failed to start comparison service: {}", e))?;
    let addr = config.server.bind_addr();
    info!(addr = %addr, model = service.model(), "Starting comparison service");
    server::run(Arc::new(service), &addr)
        .await
        .with_context(|| format!("Server on {} failed", addr))
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".sidebyside");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = to_toml(&ServiceConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!("Created default configuration at: {}", config_path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let mut config = load(workspace)?;
            if config.llm.api_key.is_some() {
                config.llm.api_key = Some("********".into());
            }
            println!("{}", to_toml(&config)?);
            Ok(())
        }
    }
}

/// Parse a `--option` argument. Without `=`, the whole argument is the text.
fn parse_option_arg(arg: &str) -> OptionInput {
    match arg.split_once('=') {
        Some((name, text)) => OptionInput::new(name.trim(), text.trim()),
        None => OptionInput::new("", arg.trim()),
    }
}

fn prepare_form(
    form: &mut FormController,
    catalog: &PresetCatalog,
    preset: Option<&str>,
    options: &[String],
) -> Result<(), FormError> {
    // A chosen preset is handed over the same way the landing page does.
    let mut session = MemorySessionStore::default();
    if let Some(key) = preset {
        session.set(PRESET_SESSION_KEY, key.to_string());
    }
    form.consume_handoff(&mut session, catalog)?;
    if options.is_empty() {
        return Ok(());
    }

    form.clear();
    for (index, arg) in options.iter().enumerate() {
        if index >= form.entries().len() {
            form.add_entry()?;
        }
        let input = parse_option_arg(arg);
        form.set_name(index, input.name)?;
        form.set_text(index, input.text)?;
    }
    Ok(())
}

async fn run_compare(form: &mut FormController, client: &CompareClient) -> anyhow::Result<()> {
    match form.submit(client).await? {
        SubmitState::Rendered { .. } => Ok(()),
        SubmitState::Failed => anyhow::bail!(FAILURE_MESSAGE),
        other => anyhow::bail!("Unexpected form state after submit: {:?}", other),
    }
}

fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text) {
            Ok(()) => eprintln!("[Copied to clipboard]"),
            Err(e) => eprintln!("[Clipboard unavailable: {}]", e),
        },
        Err(_) => eprintln!("[Clipboard unavailable]"),
    }
}
