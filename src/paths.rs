//! Path resolution for source and build locations.
//!
//! `SitePaths` is a pure mapping from the validated configuration to the
//! absolute filesystem locations every other module writes to or reads from.
//! No state, no I/O.

use crate::config::SiteConfig;
use anyhow::{Result, bail};
use regex::Regex;
use std::{
    path::{Component, Path, PathBuf},
    sync::OnceLock,
};

/// Allowed page path characters: letters, digits, `/`, `_`, `-`,
/// with an optional `.html` extension.
fn page_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9/_-]+(\.html)?$").unwrap())
}

/// Absolute locations of everything the generator reads and writes.
#[derive(Debug, Clone)]
pub struct SitePaths {
    /// Build output root.
    pub build_dir: PathBuf,
    /// Page scripts data directory.
    pub pages_dir: PathBuf,
    /// Static assets source root.
    pub assets_dir: PathBuf,
}

impl SitePaths {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            build_dir: config.build.output.clone(),
            pages_dir: config.build.pages.clone(),
            assets_dir: config.build.assets.clone(),
        }
    }

    // ----- Source locations -----

    /// `src/assets/site` - icons, favicons, screenshots.
    pub fn src_site_assets_dir(&self) -> PathBuf {
        self.assets_dir.join("site")
    }

    /// `src/assets/uploads` - user-managed media.
    pub fn src_uploads_dir(&self) -> PathBuf {
        self.assets_dir.join("uploads")
    }

    /// `src/assets/css` - stylesheet sources for the bundler.
    pub fn src_css_dir(&self) -> PathBuf {
        self.assets_dir.join("css")
    }

    /// `src/assets/js` - script sources for the bundler.
    pub fn src_js_dir(&self) -> PathBuf {
        self.assets_dir.join("js")
    }

    /// Optional user-supplied robots.txt override.
    pub fn src_robots_file(&self) -> PathBuf {
        self.assets_dir.join("robots.txt")
    }

    /// Optional user-supplied 404 page override (sibling of the assets dir).
    pub fn src_error_page_file(&self) -> PathBuf {
        self.assets_dir
            .parent()
            .unwrap_or(&self.assets_dir)
            .join("404.html")
    }

    // ----- Build locations -----

    pub fn build_site_assets_dir(&self) -> PathBuf {
        self.build_dir.join("assets").join("site")
    }

    pub fn build_uploads_dir(&self) -> PathBuf {
        self.build_dir.join("assets").join("uploads")
    }

    pub fn build_css_dir(&self) -> PathBuf {
        self.build_dir.join("assets").join("css")
    }

    pub fn build_js_dir(&self) -> PathBuf {
        self.build_dir.join("assets").join("js")
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.build_dir.join("manifest.json")
    }

    pub fn service_worker_file(&self) -> PathBuf {
        self.build_dir.join("serviceworker.js")
    }

    pub fn robots_file(&self) -> PathBuf {
        self.build_dir.join("robots.txt")
    }

    pub fn error_page_file(&self) -> PathBuf {
        self.build_dir.join("404.html")
    }

    pub fn sitemap_file(&self) -> PathBuf {
        self.build_dir.join("sitemap.xml")
    }

    /// Resolve a registered page path to its HTML file in the build dir.
    ///
    /// Validates the character set and appends `.html` when missing.
    pub fn build_file(&self, page_path: &str) -> Result<PathBuf> {
        Ok(self.build_dir.join(ensure_html_path(page_path)?))
    }
}

/// Validate a page path and normalize it to a relative `.html` file path.
///
/// Only letters, numbers, hyphens, underscores, slashes and an optional
/// `.html` extension are allowed. Leading slashes and `.` components are
/// stripped so the result stays inside the build directory.
pub fn ensure_html_path(page_path: &str) -> Result<PathBuf> {
    if page_path.is_empty() {
        bail!("page path is required to generate a file");
    }

    if !page_path_re().is_match(page_path) {
        bail!(
            "invalid page path {page_path:?}: only letters, numbers, hyphens, underscores, \
             slashes, and an optional .html extension are allowed"
        );
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(page_path).components() {
        if let Component::Normal(part) = component {
            normalized.push(part);
        }
    }

    if normalized.as_os_str().is_empty() {
        bail!("invalid page path {page_path:?}");
    }

    if normalized.extension().is_none_or(|ext| ext != "html") {
        let mut with_ext = normalized.into_os_string();
        with_ext.push(".html");
        normalized = with_ext.into();
    }

    Ok(normalized)
}

// ============================================================================
// Tests
// ============================================================================
