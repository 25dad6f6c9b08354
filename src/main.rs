//! pagecast binary: scaffolding and standalone asset watching.
//!
//! Builds themselves live in user code (a site is a Rust binary using the
//! library); the CLI covers the commands that need no page scripts.

use anyhow::{Context, Result, bail};
use clap::Parser;
use pagecast::{
    Site, SiteConfig,
    cli::{Cli, Commands},
    init, log,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(|| Path::new("./").into());
    let config_path = root.join(&cli.config);

    match cli.command {
        Commands::Init => init::write_starter_config(&config_path),
        Commands::Setup => init::setup_folders(&root),
        Commands::Watch => {
            let config = load_config(&config_path, &root)?;
            watch(config).await
        }
    }
}

/// Load and validate configuration for commands that need it.
fn load_config(config_path: &Path, root: &Path) -> Result<SiteConfig> {
    if !config_path.exists() {
        bail!(
            "Config file not found at {}. Run `pagecast init` first.",
            config_path.display()
        );
    }

    let mut config = SiteConfig::from_path(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.update_with_root(root);
    config.validate()?;
    Ok(config)
}

async fn watch(config: SiteConfig) -> Result<()> {
    let mut site = Site::new(config)?;

    ctrlc::set_handler(|| {
        log!("watch"; "stopping");
        std::process::exit(0);
    })
    .context("failed to set Ctrl+C handler")?;

    log!("watch"; "mirroring assets, press Ctrl+C to stop");
    site.watch().await
}
