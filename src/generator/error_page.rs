//! 404 page generation.
//!
//! A non-empty `404.html` next to the assets directory overrides the
//! built-in page.

use crate::{config::SiteConfig, paths::SitePaths, utils::minify};
use anyhow::{Context, Result};
use tokio::fs;

/// Write `404.html` into the build directory.
pub async fn generate(config: &SiteConfig, paths: &SitePaths) -> Result<()> {
    let override_file = paths.src_error_page_file();

    let content = match fs::read_to_string(&override_file).await {
        Ok(content) if !content.trim().is_empty() => content,
        _ => default_page(config),
    };

    let bytes = minify::html(&content, config);
    let target = paths.error_page_file();
    fs::write(&target, bytes.as_ref())
        .await
        .with_context(|| format!("failed to write {}", target.display()))
}

fn default_page(config: &SiteConfig) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="{lang}">"#,
            "<head>",
            r#"<meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            r#"<meta name="robots" content="noindex">"#,
            "<title>404 - Page Not Found</title>",
            "</head>",
            "<body>",
            "<h1>404</h1>",
            "<p>The page you are looking for does not exist.</p>",
            r#"<p><a href="/">Back to the homepage</a></p>"#,
            "</body></html>\n",
        ),
        lang = config.site.language,
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs as std_fs, path::Path};

    fn config() -> SiteConfig {
        let mut config = SiteConfig::from_str(
            r#"
            mode = "development"

            [site]
            name = "Test Site"
            production_url = "https://example.com"
            development_url = "http://localhost:3000"
        "#,
        )
        .unwrap();
        config.build.minify = false;
        config
    }

    fn paths(root: &Path) -> SitePaths {
        let paths = SitePaths {
            build_dir: root.join("build"),
            pages_dir: root.join("src/pages"),
            assets_dir: root.join("src/assets"),
        };
        std_fs::create_dir_all(&paths.build_dir).unwrap();
        std_fs::create_dir_all(&paths.assets_dir).unwrap();
        paths
    }

    #[tokio::test]
    async fn test_default_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());

        generate(&config(), &paths).await.unwrap();

        let content = std_fs::read_to_string(paths.error_page_file()).unwrap();
        assert!(content.contains("<h1>404</h1>"));
        assert!(content.contains(r#"content="noindex""#));
    }

    #[tokio::test]
    async fn test_user_override() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std_fs::write(paths.src_error_page_file(), "<html><body>custom</body></html>").unwrap();

        generate(&config(), &paths).await.unwrap();

        let content = std_fs::read_to_string(paths.error_page_file()).unwrap();
        assert!(content.contains("custom"));
    }

    #[tokio::test]
    async fn test_empty_override_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std_fs::write(paths.src_error_page_file(), "  \n").unwrap();

        generate(&config(), &paths).await.unwrap();

        let content = std_fs::read_to_string(paths.error_page_file()).unwrap();
        assert!(content.contains("<h1>404</h1>"));
    }
}
