//! Progressive web app assets: `manifest.json` and `serviceworker.js`.
//!
//! The manifest requires the two android-chrome icons in the site assets
//! directory; screenshots named `screen-<order>-<WxH>.png` are picked up
//! automatically. The service worker precaches everything in the build
//! directory under a timestamped cache name, so every build invalidates
//! the previous cache.

use crate::{config::SiteConfig, paths::SitePaths};
use anyhow::{Context, Result, bail};
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use tokio::fs;
use walkdir::WalkDir;

const ICON_192: &str = "android-chrome-192x192.png";
const ICON_512: &str = "android-chrome-512x512.png";

/// Screenshot naming scheme: `screen-<order>-<width>x<height>.png`.
fn screenshot_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^screen-(\d+)-(\d+x\d+)\.png$").unwrap())
}

// ============================================================================
// Manifest
// ============================================================================

/// Write `manifest.json` into the build directory.
pub async fn write_manifest(config: &SiteConfig, paths: &SitePaths) -> Result<()> {
    let site_assets = paths.src_site_assets_dir();
    for icon in [ICON_192, ICON_512] {
        if !site_assets.join(icon).is_file() {
            bail!(
                "pwa requires {} in {}",
                icon,
                site_assets.display()
            );
        }
    }

    let name = if config.pwa.name.is_empty() {
        &config.site.name
    } else {
        &config.pwa.name
    };
    let lang = if config.pwa.lang.is_empty() {
        &config.site.language
    } else {
        &config.pwa.lang
    };

    let mut manifest = json!({
        "name": name,
        "short_name": config.pwa.short_name,
        "description": config.pwa.description,
        "start_url": config.pwa.start_url,
        "display": config.pwa.display,
        "orientation": config.pwa.orientation,
        "background_color": config.pwa.background_color,
        "theme_color": config.pwa.theme_color,
        "lang": lang,
        "icons": [
            {
                "src": format!("/assets/site/{ICON_192}"),
                "sizes": "192x192",
                "type": "image/png",
                "purpose": "any"
            },
            {
                "src": format!("/assets/site/{ICON_512}"),
                "sizes": "512x512",
                "type": "image/png",
                "purpose": "any"
            }
        ],
    });

    let screenshots = collect_screenshots(paths)?;
    if !screenshots.is_empty() {
        manifest["screenshots"] = json!(
            screenshots
                .iter()
                .map(|(name, sizes)| json!({
                    "src": format!("/assets/site/{name}"),
                    "sizes": sizes,
                    "type": "image/png"
                }))
                .collect::<Vec<_>>()
        );
    }

    let target = paths.manifest_file();
    fs::write(&target, serde_json::to_vec(&manifest)?)
        .await
        .with_context(|| format!("failed to write {}", target.display()))
}

/// Screenshot file names with their size strings, ordered by the numeric
/// order segment in the name.
fn collect_screenshots(paths: &SitePaths) -> Result<Vec<(String, String)>> {
    let site_assets = paths.src_site_assets_dir();
    if !site_assets.is_dir() {
        return Ok(Vec::new());
    }

    let mut screenshots: Vec<(u32, String, String)> = Vec::new();
    for entry in std::fs::read_dir(&site_assets)
        .with_context(|| format!("failed to read {}", site_assets.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(caps) = screenshot_re().captures(&name) {
            let order: u32 = caps[1].parse().unwrap_or(u32::MAX);
            screenshots.push((order, name.clone(), caps[2].to_string()));
        }
    }

    screenshots.sort_by_key(|(order, _, _)| *order);
    Ok(screenshots
        .into_iter()
        .map(|(_, name, sizes)| (name, sizes))
        .collect())
}

// ============================================================================
// Service Worker
// ============================================================================

/// Write `serviceworker.js` precaching every file currently in the build
/// directory. Call after all other build outputs are in place.
pub async fn write_service_worker(config: &SiteConfig, paths: &SitePaths) -> Result<()> {
    let mut urls = vec!["/".to_string()];
    for entry in WalkDir::new(&paths.build_dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&paths.build_dir)
            .context("walked entry outside the build directory")?;
        let url = format!("/{}", relative.to_string_lossy().replace('\\', "/"));
        if url == "/serviceworker.js" {
            continue;
        }
        urls.push(url);
    }
    urls.sort();

    let cache_name = format!(
        "{}-{}",
        slugify(&config.site.name),
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    );
    let script = render_service_worker(&cache_name, &urls)?;

    let target = paths.service_worker_file();
    fs::write(&target, script)
        .await
        .with_context(|| format!("failed to write {}", target.display()))
}

fn render_service_worker(cache_name: &str, urls: &[String]) -> Result<String> {
    let urls_json = serde_json::to_string(urls)?;
    Ok(format!(
        concat!(
            "const CACHE_NAME='{cache}';\n",
            "const PRECACHE_URLS={urls};\n",
            "self.addEventListener('install',e=>{{",
            "e.waitUntil(caches.open(CACHE_NAME)",
            ".then(c=>c.addAll(PRECACHE_URLS))",
            ".then(()=>self.skipWaiting()));}});\n",
            "self.addEventListener('activate',e=>{{",
            "e.waitUntil(caches.keys().then(keys=>Promise.all(",
            "keys.filter(k=>k!==CACHE_NAME).map(k=>caches.delete(k))",
            ")).then(()=>self.clients.claim()));}});\n",
            "self.addEventListener('fetch',e=>{{",
            "if(e.request.method!=='GET')return;",
            "e.respondWith(caches.match(e.request)",
            ".then(cached=>cached||fetch(e.request)));}});\n",
        ),
        cache = cache_name,
        urls = urls_json,
    ))
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    slug.trim_matches('-').to_string()
}

// ============================================================================
// Cleanup
// ============================================================================

/// Remove PWA artifacts from the build directory. Used when the PWA is
/// disabled so stale manifests from earlier builds do not linger.
pub async fn remove_stale(paths: &SitePaths) -> Result<()> {
    for file in [paths.manifest_file(), paths.service_worker_file()] {
        match fs::remove_file(&file).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", file.display()));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs as std_fs, path::Path};

    fn config() -> SiteConfig {
        SiteConfig::from_str(
            r#"
            mode = "development"

            [site]
            name = "Test Site"
            production_url = "https://example.com"
            development_url = "http://localhost:3000"

            [pwa]
            enable = true
            short_name = "Test"
            description = "A test app"
        "#,
        )
        .unwrap()
    }

    fn paths(root: &Path) -> SitePaths {
        let paths = SitePaths {
            build_dir: root.join("build"),
            pages_dir: root.join("src/pages"),
            assets_dir: root.join("src/assets"),
        };
        std_fs::create_dir_all(&paths.build_dir).unwrap();
        std_fs::create_dir_all(paths.src_site_assets_dir()).unwrap();
        paths
    }

    fn add_icons(paths: &SitePaths) {
        std_fs::write(paths.src_site_assets_dir().join(ICON_192), "png").unwrap();
        std_fs::write(paths.src_site_assets_dir().join(ICON_512), "png").unwrap();
    }

    #[tokio::test]
    async fn test_manifest_requires_icons() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());

        let err = write_manifest(&config(), &paths).await.unwrap_err();
        assert!(format!("{err:#}").contains(ICON_192));
    }

    #[tokio::test]
    async fn test_manifest_content() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        add_icons(&paths);

        write_manifest(&config(), &paths).await.unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&std_fs::read_to_string(paths.manifest_file()).unwrap())
                .unwrap();
        // name falls back to the site name
        assert_eq!(manifest["name"], "Test Site");
        assert_eq!(manifest["short_name"], "Test");
        assert_eq!(manifest["lang"], "en-US");
        assert_eq!(manifest["icons"].as_array().unwrap().len(), 2);
        assert!(manifest.get("screenshots").is_none());
    }

    #[tokio::test]
    async fn test_manifest_screenshots_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        add_icons(&paths);
        let assets = paths.src_site_assets_dir();
        std_fs::write(assets.join("screen-10-1080x1920.png"), "png").unwrap();
        std_fs::write(assets.join("screen-2-1080x1920.png"), "png").unwrap();
        std_fs::write(assets.join("screen-1-720x1280.png"), "png").unwrap();
        std_fs::write(assets.join("not-a-screen.png"), "png").unwrap();

        write_manifest(&config(), &paths).await.unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&std_fs::read_to_string(paths.manifest_file()).unwrap())
                .unwrap();
        let screenshots = manifest["screenshots"].as_array().unwrap();
        assert_eq!(screenshots.len(), 3);
        assert_eq!(screenshots[0]["src"], "/assets/site/screen-1-720x1280.png");
        assert_eq!(screenshots[0]["sizes"], "720x1280");
        assert_eq!(screenshots[2]["src"], "/assets/site/screen-10-1080x1920.png");
    }

    #[tokio::test]
    async fn test_service_worker_precaches_build_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std_fs::write(paths.build_dir.join("index.html"), "x").unwrap();
        std_fs::create_dir_all(paths.build_dir.join("blog")).unwrap();
        std_fs::write(paths.build_dir.join("blog/post.html"), "x").unwrap();

        write_service_worker(&config(), &paths).await.unwrap();

        let script = std_fs::read_to_string(paths.service_worker_file()).unwrap();
        assert!(script.contains("\"/index.html\""));
        assert!(script.contains("\"/blog/post.html\""));
        assert!(!script.contains("\"/serviceworker.js\""));
        assert!(script.contains("CACHE_NAME='test-site-"));
    }

    #[tokio::test]
    async fn test_remove_stale_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths(dir.path());
        std_fs::write(paths.manifest_file(), "{}").unwrap();

        remove_stale(&paths).await.unwrap();
        assert!(!paths.manifest_file().exists());
        remove_stale(&paths).await.unwrap();
    }
}
