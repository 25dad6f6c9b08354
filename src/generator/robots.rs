//! robots.txt generation.
//!
//! A user-supplied `robots.txt` in the assets directory overrides the
//! default allow-all file. Either way the sitemap location is advertised.

use crate::{config::SiteConfig, paths::SitePaths, utils::url::join_url};
use anyhow::{Context, Result};
use tokio::fs;

/// Write `robots.txt` into the build directory.
pub async fn generate(config: &SiteConfig, paths: &SitePaths) -> Result<()> {
    let sitemap_url = join_url(config.website_url(), "sitemap.xml");
    let override_file = paths.src_robots_file();

    let content = if override_file.is_file() {
        let mut content = fs::read_to_string(&override_file)
            .await
            .with_context(|| format!("failed to read {}", override_file.display()))?;
        if !content
            .lines()
            .any(|line| line.trim_start().starts_with("Sitemap:"))
        {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&format!("\nSitemap: {sitemap_url}\n"));
        }
        content
    } else {
        format!("User-agent: *\nAllow: /\n\nSitemap: {sitemap_url}\n")
    };

    let target = paths.robots_file();
    fs::write(&target, content)
        .await
        .with_context(|| format!("failed to write {}", target.display()))
}

// ============================================================================
// Tests
// ============================================================================
