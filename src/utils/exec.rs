//! External command execution for bundler invocations.
//!
//! Bundler commands are configured as argv templates; `{input}` and
//! `{output}` placeholders are substituted anywhere within an argument
//! before the command is spawned.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// Substitute `{input}`/`{output}` placeholders in an argv template.
pub fn render_template(template: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.display().to_string();
    let output = output.display().to_string();

    template
        .iter()
        .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
        .collect()
}

/// Run an argv synchronously, capturing output.
///
/// Non-zero exit status is an error carrying the command's stderr. Call from
/// async code via `tokio::task::spawn_blocking`.
pub fn run(argv: &[String]) -> Result<()> {
    let (cmd, args) = argv
        .split_first()
        .context("command must have at least one element")?;

    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("failed to spawn `{cmd}`"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("`{}` failed: {}", argv.join(" "), stderr.trim());
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
