//! Site configuration management for `pagecast.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `mode`       | `production` or `development` (top-level)     |
//! | `[site]`     | Site metadata (name, urls, analytics, colors) |
//! | `[build]`    | Output/pages/assets paths, minification        |
//! | `[bundle]`   | External CSS/JS bundler commands               |
//! | `[pwa]`      | Web-app manifest and service-worker settings   |
//!
//! # Example
//!
//! ```toml
//! mode = "development"
//!
//! [site]
//! name = "My Site"
//! production_url = "https://example.com"
//! development_url = "http://localhost:3000"
//!
//! [build]
//! output = "build"
//! minify = true
//!
//! [pwa]
//! enable = false
//! ```

mod error;

pub mod defaults;

pub use error::ConfigError;

use anyhow::{Result, bail};
use educe::Educe;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Hex color pattern, e.g. `#fff` or `#1a2b3c`.
fn hex_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#([0-9A-Fa-f]{3}){1,2}$").unwrap())
}

// ============================================================================
// Enums
// ============================================================================

/// Build mode, controlling output cleaning and which site URL is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    #[default]
    Development,
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing pagecast.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build mode
    pub mode: Mode,

    /// Site metadata
    pub site: SiteSection,

    /// Build settings
    pub build: BuildConfig,

    /// External bundler settings
    pub bundle: BundleConfig,

    /// Progressive web app settings
    pub pwa: PwaConfig,
}

/// `[site]` section - site identity and SEO metadata.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Site name used in meta title templates and the PWA manifest fallback.
    pub name: String,

    /// Default page language.
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,

    /// Canonical URL used for production builds.
    pub production_url: String,

    /// Canonical URL used for development builds.
    pub development_url: String,

    /// Meta title template; `%title` and `%sitename` are substituted.
    #[serde(default = "defaults::site::meta_title_template")]
    #[educe(Default = defaults::site::meta_title_template())]
    pub meta_title_template: String,

    /// Theme color hex value emitted in page heads.
    #[serde(default = "defaults::site::theme_color")]
    #[educe(Default = defaults::site::theme_color())]
    pub theme_color: String,

    /// Google Analytics measurement ID (empty disables the snippet).
    pub google_analytics: String,

    /// Bing/Clarity analytics ID (empty disables the snippet).
    pub bing_analytics: String,
}

/// `[build]` section - paths and output shaping.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Page scripts data directory (capability scope for script loading).
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Static assets directory, mirrored into the output.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Minify HTML and XML output.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,
}

/// `[bundle]` section - opaque asset bundler invocations.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    #[serde(default = "defaults::bundle::css")]
    #[educe(Default = defaults::bundle::css())]
    pub css: BundlerCommand,

    #[serde(default = "defaults::bundle::js")]
    #[educe(Default = defaults::bundle::js())]
    pub js: BundlerCommand,
}

/// One bundler: an argv template run per source file.
///
/// `{input}` and `{output}` placeholders are substituted anywhere within an
/// argument before the command is spawned.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BundlerCommand {
    /// Run this bundler during builds.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Argv template; first element is the executable.
    pub command: Vec<String>,
}

/// `[pwa]` section - manifest.json and serviceworker.js generation.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct PwaConfig {
    /// Generate manifest.json and serviceworker.js.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Application name (falls back to `[site] name` when empty).
    pub name: String,

    /// Short name shown under the installed icon.
    pub short_name: String,

    /// Manifest description.
    pub description: String,

    #[serde(default = "defaults::pwa::start_url")]
    #[educe(Default = defaults::pwa::start_url())]
    pub start_url: String,

    #[serde(default = "defaults::pwa::display")]
    #[educe(Default = defaults::pwa::display())]
    pub display: String,

    #[serde(default = "defaults::pwa::orientation")]
    #[educe(Default = defaults::pwa::orientation())]
    pub orientation: String,

    #[serde(default = "defaults::pwa::background_color")]
    #[educe(Default = defaults::pwa::background_color())]
    pub background_color: String,

    #[serde(default = "defaults::pwa::theme_color")]
    #[educe(Default = defaults::pwa::theme_color())]
    pub theme_color: String,

    /// Manifest language (falls back to `[site] language` when empty).
    pub lang: String,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = Self::normalize_path(path);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    pub const fn is_production(&self) -> bool {
        matches!(self.mode, Mode::Production)
    }

    pub const fn is_development(&self) -> bool {
        matches!(self.mode, Mode::Development)
    }

    /// Canonical site URL for the active mode, without a trailing slash.
    pub fn website_url(&self) -> &str {
        let url = match self.mode {
            Mode::Production => &self.site.production_url,
            Mode::Development => &self.site.development_url,
        };
        url.trim_end_matches('/')
    }

    /// Normalize all configured paths to absolute paths under `root`.
    pub fn update_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);

        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.pages = Self::normalize_path(&root.join(&self.build.pages));
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));

        self.set_root(&root);
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before a build or watch session.
    pub fn validate(&self) -> Result<()> {
        let name_len = self.site.name.chars().count();
        if !(3..=100).contains(&name_len) {
            bail!(ConfigError::Validation(
                "[site.name] must be between 3 and 100 characters".into()
            ));
        }

        for (field, url) in [
            ("[site.production_url]", &self.site.production_url),
            ("[site.development_url]", &self.site.development_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!(ConfigError::Validation(format!(
                    "{field} must start with http:// or https://"
                )));
            }
        }

        if !hex_color_re().is_match(&self.site.theme_color) {
            bail!(ConfigError::Validation(
                "[site.theme_color] must be a hex color like #1a2b3c".into()
            ));
        }

        if self.bundle.css.enable {
            Self::check_command_installed("[bundle.css.command]", &self.bundle.css.command)?;
        }
        if self.bundle.js.enable {
            Self::check_command_installed("[bundle.js.command]", &self.bundle.js.command)?;
        }

        if self.pwa.enable {
            if self.pwa.name.is_empty() && self.site.name.is_empty() {
                bail!(ConfigError::Validation(
                    "[pwa.enable] = true requires [pwa.name] or [site.name]".into()
                ));
            }
            if self.pwa.short_name.is_empty() {
                bail!(ConfigError::Validation(
                    "[pwa.enable] = true requires [pwa.short_name]".into()
                ));
            }
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        if command.is_empty() {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        }

        let cmd = &command[0];
        if which::which(cmd).is_err() {
            bail!(ConfigError::Validation(format!(
                "{field}: `{cmd}` not found. Please install it first."
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> &'static str {
        r#"
            mode = "development"

            [site]
            name = "Test Site"
            production_url = "https://example.com"
            development_url = "http://localhost:3000"
        "#
    }

    #[test]
    fn test_from_str_minimal() {
        let config = SiteConfig::from_str(minimal_config()).unwrap();
        assert_eq!(config.site.name, "Test Site");
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(config.site.language, "en-US");
        assert_eq!(config.site.meta_title_template, "%title");
        assert!(config.build.minify);
        assert!(!config.pwa.enable);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[site\nname = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let config = r#"
            mode = "development"
            [unknown_section]
            field = "value"
        "#;
        assert!(SiteConfig::from_str(config).is_err());
    }

    #[test]
    fn test_mode_parsing() {
        let config = SiteConfig::from_str(r#"mode = "production""#).unwrap();
        assert!(config.is_production());
        assert!(!config.is_development());
    }

    #[test]
    fn test_website_url_per_mode() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        assert_eq!(config.website_url(), "http://localhost:3000");

        config.mode = Mode::Production;
        assert_eq!(config.website_url(), "https://example.com");
    }

    #[test]
    fn test_website_url_strips_trailing_slash() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.site.development_url = "http://localhost:3000/".into();
        assert_eq!(config.website_url(), "http://localhost:3000");
    }

    #[test]
    fn test_validate_ok() {
        let config = SiteConfig::from_str(minimal_config()).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_short_name() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.site.name = "ab".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_url() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.site.production_url = "example.com".into();
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("http"));
    }

    #[test]
    fn test_validate_theme_color() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.site.theme_color = "#fff".into();
        assert!(config.validate().is_ok());

        config.site.theme_color = "black".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_pwa_requires_short_name() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.pwa.enable = true;
        assert!(config.validate().is_err());

        config.pwa.short_name = "Test".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bundler_empty_command() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.bundle.css.enable = true;
        config.bundle.css.command = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bundle_defaults_disabled_with_commands() {
        let config = SiteConfig::from_str(minimal_config()).unwrap();
        assert!(!config.bundle.css.enable);
        assert!(!config.bundle.js.enable);
        assert_eq!(config.bundle.css.command[0], "lightningcss");
        assert_eq!(config.bundle.js.command[0], "esbuild");
    }

    #[test]
    fn test_update_with_root_makes_paths_absolute() {
        let mut config = SiteConfig::from_str(minimal_config()).unwrap();
        config.update_with_root(Path::new("/tmp/site"));

        assert!(config.build.output.is_absolute());
        assert!(config.build.pages.is_absolute());
        assert!(config.build.assets.is_absolute());
        assert!(config.build.output.ends_with("build"));
        assert!(config.build.pages.ends_with("src/pages"));
    }

    #[test]
    fn test_full_config_all_sections() {
        let config = r##"
            mode = "production"

            [site]
            name = "My Site"
            language = "de-DE"
            production_url = "https://mysite.example"
            development_url = "http://localhost:8080"
            meta_title_template = "%title | %sitename"
            theme_color = "#1a2b3c"
            google_analytics = "G-12345"
            bing_analytics = ""

            [build]
            output = "dist"
            minify = false

            [bundle.css]
            enable = false
            command = ["lightningcss", "--minify", "{input}", "--output-file", "{output}"]

            [bundle.js]
            enable = false

            [pwa]
            enable = true
            name = "My Site"
            short_name = "Site"
            description = "An example"
            display = "fullscreen"
        "##;
        let config = SiteConfig::from_str(config).unwrap();

        assert!(config.is_production());
        assert_eq!(config.site.language, "de-DE");
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(!config.build.minify);
        assert_eq!(config.pwa.display, "fullscreen");
        assert_eq!(config.pwa.orientation, "any");
        assert!(config.validate().is_ok());
    }
}
