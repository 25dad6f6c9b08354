//! Project scaffolding: starter config and folder skeleton.

use crate::log;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

const STARTER_CONFIG: &str = r##"mode = "development"

[site]
name = "My Site"
language = "en-US"
production_url = "https://example.com"
development_url = "http://localhost:3000"
meta_title_template = "%title | %sitename"
theme_color = "#000000"

[build]
output = "build"
pages = "src/pages"
assets = "src/assets"
minify = true

[bundle.css]
enable = false
command = ["lightningcss", "--minify", "{input}", "--output-file", "{output}"]

[bundle.js]
enable = false
command = ["esbuild", "--bundle", "--minify", "{input}", "--outfile={output}"]

[pwa]
enable = false
short_name = "MySite"
"##;

/// Directories a fresh project starts with, relative to the root.
const SKELETON: &[&str] = &[
    "src/pages",
    "src/components",
    "src/data",
    "src/assets/site",
    "src/assets/uploads",
    "src/assets/css",
    "src/assets/js",
];

/// Write a starter config file. Refuses to overwrite an existing one.
pub fn write_starter_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        bail!(
            "{} already exists. Remove it manually or init in a different path.",
            config_path.display()
        );
    }
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(config_path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    log!("init"; "wrote {}", config_path.display());
    Ok(())
}

/// Create the project folder skeleton under `root`. Existing directories
/// are left alone.
pub fn setup_folders(root: &Path) -> Result<()> {
    for dir in SKELETON {
        let path = root.join(dir);
        if path.is_dir() {
            continue;
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        log!("setup"; "created {dir}");
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
