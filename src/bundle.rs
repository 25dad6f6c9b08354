//! External CSS and JS bundler invocations.
//!
//! Bundlers are opaque commands configured as argv templates. Each enabled
//! bundler runs once per source file with `{input}`/`{output}` substituted.
//! CSS and JS run concurrently; either failing fails the build.

use crate::{
    config::{BundlerCommand, SiteConfig},
    log,
    mirror::clean_dir,
    paths::SitePaths,
    utils::exec,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run the configured bundlers against the asset sources.
pub async fn run(config: &SiteConfig, paths: &SitePaths) -> Result<()> {
    let (css, js) = tokio::join!(
        bundle(
            "css",
            &config.bundle.css,
            paths.src_css_dir(),
            paths.build_css_dir(),
        ),
        bundle(
            "js",
            &config.bundle.js,
            paths.src_js_dir(),
            paths.build_js_dir(),
        ),
    );
    css?;
    js?;
    Ok(())
}

/// Empty the output dir, then run the bundler once per source file with the
/// matching extension.
async fn bundle(
    kind: &str,
    bundler: &BundlerCommand,
    source_dir: PathBuf,
    output_dir: PathBuf,
) -> Result<()> {
    if !bundler.enable {
        return Ok(());
    }

    clean_dir(&output_dir)
        .await
        .with_context(|| format!("failed to clean {}", output_dir.display()))?;

    let inputs = collect_sources(&source_dir, kind);
    if inputs.is_empty() {
        log!("bundle"; "no {kind} sources in {}", source_dir.display());
        return Ok(());
    }

    for input in &inputs {
        let relative = input
            .strip_prefix(&source_dir)
            .context("bundler input outside the source directory")?;
        let output = output_dir.join(relative);
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let argv = exec::render_template(&bundler.command, input, &output);
        tokio::task::spawn_blocking(move || exec::run(&argv))
            .await
            .context("bundler task panicked")?
            .with_context(|| format!("{kind} bundler failed for {}", input.display()))?;
    }

    log!("bundle"; "bundled {} {kind} files", inputs.len());
    Ok(())
}

fn collect_sources(dir: &Path, extension: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == extension)
        })
        .map(|entry| entry.into_path())
        .collect();
    sources.sort();
    sources
}

// ============================================================================
// Tests
// ============================================================================
