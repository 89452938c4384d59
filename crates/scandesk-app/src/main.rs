//! Scandesk binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing (stderr)
//! 3. Build the HTTP backend, action catalog, prompt broker and controller
//! 4. Pick the starting action
//! 5. Run the console on stdin until the operator quits

mod cli;
mod console;

use std::sync::Arc;

use clap::Parser;
use scandesk_core::config::ScandeskConfig;
use scandesk_core::types::ActionId;
use scandesk_core::ScandeskError;
use scandesk_engine::{
    ActionCatalog, ActionRegistry, PromptBroker, RequestBackend, ScanController, SettingsSource,
};
use scandesk_remote::HttpBackend;

use crate::cli::CliArgs;
use crate::console::Console;

/// Choose the action new scans start with.
///
/// An explicitly configured action is used as is; otherwise the first entry
/// of the catalog.
async fn initial_action(
    configured: Option<String>,
    catalog: &ActionCatalog,
) -> Result<ActionId, ScandeskError> {
    match catalog.actions().await {
        Ok(actions) => match configured {
            Some(name) => {
                let action = ActionId::new(name);
                if !actions.contains(&action) {
                    tracing::warn!(action = %action, "Configured action is not in the catalog");
                }
                Ok(action)
            }
            None => actions.into_iter().next().ok_or(ScandeskError::NoActions),
        },
        Err(e) => match configured {
            Some(name) => {
                tracing::warn!(error = %e, "Action catalog unavailable, using configured action");
                Ok(ActionId::new(name))
            }
            None => Err(ScandeskError::Remote(e.to_string())),
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, read before tracing so the configured level applies.
    let config_file = args.resolve_config_path();
    let loaded = if config_file.exists() {
        Some(ScandeskConfig::load(&config_file))
    } else {
        None
    };
    let mut config = match &loaded {
        Some(Ok(config)) => config.clone(),
        _ => ScandeskConfig::default(),
    };

    // Tracing. RUST_LOG wins over --log-level, which wins over the config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Scandesk v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Some(Ok(_)) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(Err(e)) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::info!(path = %config_file.display(), "No config file, using defaults"),
    }

    config.remote.base_url = args.resolve_base_url(&config.remote.base_url);

    // Remote service.
    let backend = Arc::new(HttpBackend::new(&config.remote)?);
    let catalog = Arc::new(ActionCatalog::new(
        Arc::clone(&backend) as Arc<dyn SettingsSource>,
        &config.catalog,
    ));

    // Engine.
    let mut registry = ActionRegistry::new();
    registry.register_defaults();
    let controller = ScanController::new(
        backend as Arc<dyn RequestBackend>,
        Arc::new(PromptBroker::new()),
        registry,
    );

    let configured = args.resolve_action(config.console.default_action.as_deref());
    let action = initial_action(configured, &catalog).await?;
    controller.set_action(action)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    Console::new(controller, catalog).run(stdin).await?;

    tracing::info!("Scandesk stopped");
    Ok(())
}
