//! Page document model and validation.
//!
//! `PageDocument` is what user page scripts hand to `add_page`. Validation
//! checks the required fields and normalizes the document against the site
//! configuration into a `Document`, the model the renderer consumes.

use crate::{
    config::SiteConfig,
    paths::ensure_html_path,
    utils::url::{canonical_url, join_url},
};
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

fn twitter_handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@?\w+$").unwrap())
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

const DEFAULT_OG_IMAGE: &str = "/assets/site/ogImage.png";

// ============================================================================
// Errors
// ============================================================================

/// Document validation errors
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("`{0}` is required and must be non-empty")]
    MissingField(&'static str),

    #[error("invalid page path: {0}")]
    InvalidPath(String),

    #[error("`{field}` must be an ISO-8601 date, got {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("`priority` must be between 0.0 and 1.0, got {0}")]
    InvalidPriority(f32),

    #[error("invalid twitter handle {0:?}")]
    InvalidTwitterHandle(String),

    #[error("ogImage must be a URL or an absolute path with an image extension, got {0:?}")]
    InvalidOgImage(String),
}

// ============================================================================
// Input Model
// ============================================================================

/// Sitemap change frequency hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

/// A page as described by user code, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    /// Page title (required).
    pub title: String,
    /// Meta description (required).
    pub description: String,
    /// Page path relative to the site root, e.g. `blog/hello` (required).
    pub path: String,
    /// Last modification timestamp, ISO-8601 (required).
    pub updated_at: String,
    /// Creation timestamp, ISO-8601.
    pub created_at: Option<String>,
    /// Comma-separated keywords.
    pub keywords: Option<String>,
    /// Page author.
    pub author: Option<String>,
    /// Per-page meta title template override.
    pub meta_title_template: Option<String>,
    /// Emit `follow` (true) or `nofollow` in the robots meta tag.
    pub should_follow_links: bool,
    /// Emit `index` (true) or `noindex`; also gates sitemap inclusion.
    pub should_allow_indexing: bool,
    /// Twitter site handle, with or without the leading `@`.
    pub twitter_handle: Option<String>,
    /// Open Graph image: absolute URL or site-absolute path.
    pub og_image: Option<String>,
    /// Sitemap change frequency.
    pub changefreq: Option<ChangeFreq>,
    /// Sitemap priority, 0.0 to 1.0.
    pub priority: f32,
    /// Page language override.
    pub language: Option<String>,
}

impl Default for PageDocument {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            path: String::new(),
            updated_at: String::new(),
            created_at: None,
            keywords: None,
            author: None,
            meta_title_template: None,
            should_follow_links: true,
            should_allow_indexing: true,
            twitter_handle: None,
            og_image: None,
            changefreq: None,
            priority: 1.0,
            language: None,
        }
    }
}

// ============================================================================
// Normalized Model
// ============================================================================

/// A validated page document, normalized against the site configuration.
/// This is what the renderer and sitemap consume.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub description: String,
    /// Page path as registered (used to derive the build file location).
    pub file_path: String,
    /// Canonical full URL of the page.
    pub url: String,
    pub updated_at: String,
    pub created_at: Option<String>,
    pub keywords: Option<String>,
    pub author: String,
    pub should_follow_links: bool,
    pub should_allow_indexing: bool,
    /// Normalized handle with a leading `@`, empty when unset.
    pub twitter_handle: String,
    /// Absolute Open Graph image URL.
    pub og_image: String,
    pub changefreq: Option<ChangeFreq>,
    pub priority: f32,
    pub language: String,
    pub theme_color: String,
    pub google_analytics: String,
    pub bing_analytics: String,
}

impl PageDocument {
    /// Validate the document and normalize it against the site config.
    pub fn validate(&self, config: &SiteConfig) -> Result<Document, DocumentError> {
        if self.title.trim().is_empty() {
            return Err(DocumentError::MissingField("title"));
        }
        if self.description.trim().is_empty() {
            return Err(DocumentError::MissingField("description"));
        }
        if self.updated_at.trim().is_empty() {
            return Err(DocumentError::MissingField("updated_at"));
        }

        let html_path = ensure_html_path(&self.path)
            .map_err(|err| DocumentError::InvalidPath(format!("{err:#}")))?;

        validate_iso_date("updated_at", &self.updated_at)?;
        if let Some(created_at) = &self.created_at {
            validate_iso_date("created_at", created_at)?;
        }

        if !(0.0..=1.0).contains(&self.priority) {
            return Err(DocumentError::InvalidPriority(self.priority));
        }

        let twitter_handle = match self.twitter_handle.as_deref() {
            None | Some("") => String::new(),
            Some(handle) => {
                if !twitter_handle_re().is_match(handle) {
                    return Err(DocumentError::InvalidTwitterHandle(handle.to_string()));
                }
                if handle.starts_with('@') {
                    handle.to_string()
                } else {
                    format!("@{handle}")
                }
            }
        };

        let og_image = self.og_image.as_deref().unwrap_or(DEFAULT_OG_IMAGE);
        validate_og_image(og_image)?;

        let website_url = config.website_url();
        let og_image = if og_image.starts_with("http://") || og_image.starts_with("https://") {
            og_image.to_string()
        } else {
            join_url(website_url, og_image)
        };

        let url = canonical_url(&join_url(
            website_url,
            &html_path.to_string_lossy().replace('\\', "/"),
        ));

        let template = self
            .meta_title_template
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&config.site.meta_title_template);

        Ok(Document {
            title: format_meta_title(&self.title, template, &config.site.name),
            description: self.description.clone(),
            file_path: self.path.clone(),
            url,
            updated_at: self.updated_at.clone(),
            created_at: self.created_at.clone(),
            keywords: self.keywords.clone(),
            author: self.author.clone().unwrap_or_default(),
            should_follow_links: self.should_follow_links,
            should_allow_indexing: self.should_allow_indexing,
            twitter_handle,
            og_image,
            changefreq: self.changefreq,
            priority: self.priority,
            language: self
                .language
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| config.site.language.clone()),
            theme_color: config.site.theme_color.clone(),
            google_analytics: config.site.google_analytics.clone(),
            bing_analytics: config.site.bing_analytics.clone(),
        })
    }
}

impl Document {
    /// Content of the robots meta tag, e.g. "index, follow".
    pub fn robots_content(&self) -> String {
        format!(
            "{}, {}",
            if self.should_allow_indexing { "index" } else { "noindex" },
            if self.should_follow_links { "follow" } else { "nofollow" },
        )
    }

    /// Last modification date as YYYY-MM-DD for the sitemap.
    pub fn lastmod_ymd(&self) -> String {
        iso_date_ymd(&self.updated_at).unwrap_or_else(|| self.updated_at.clone())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Accepts RFC 3339 timestamps or plain YYYY-MM-DD dates.
fn validate_iso_date(field: &'static str, value: &str) -> Result<(), DocumentError> {
    let ok = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if ok {
        Ok(())
    } else {
        Err(DocumentError::InvalidDate {
            field,
            value: value.to_string(),
        })
    }
}

/// Extract the YYYY-MM-DD prefix of an accepted ISO date.
fn iso_date_ymd(value: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn validate_og_image(value: &str) -> Result<(), DocumentError> {
    let is_url = value.starts_with("http://") || value.starts_with("https://");
    if !is_url && !value.starts_with('/') {
        return Err(DocumentError::InvalidOgImage(value.to_string()));
    }

    let has_image_ext = IMAGE_EXTENSIONS
        .iter()
        .any(|ext| value.to_ascii_lowercase().ends_with(&format!(".{ext}")));
    if !has_image_ext {
        return Err(DocumentError::InvalidOgImage(value.to_string()));
    }

    Ok(())
}

/// Format a meta title through a template with `%title` and `%sitename`
/// placeholders.
pub fn format_meta_title(title: &str, template: &str, site_name: &str) -> String {
    if template.is_empty() {
        return title.to_string();
    }
    template
        .replace("%title", title)
        .replace("%sitename", site_name)
}

// ============================================================================
// Tests
// ============================================================================
