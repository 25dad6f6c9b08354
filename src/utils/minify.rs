//! Output shrinking for generated artifacts.
//!
//! Every text artifact the build writes (rendered pages, the 404 page,
//! sitemap files) passes through here on its way to disk. With
//! `[build] minify = false` both passes are no-ops, so development output
//! stays readable.

use crate::config::SiteConfig;
use std::borrow::Cow;

/// Shrink a rendered HTML page, including its inline CSS and JS.
pub fn html<'a>(page: &'a str, config: &SiteConfig) -> Cow<'a, [u8]> {
    if !config.build.minify {
        return Cow::Borrowed(page.as_bytes());
    }

    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    Cow::Owned(minify_html::minify(page.as_bytes(), &cfg))
}

/// Shrink sitemap XML by dropping the indentation the renderer emits.
/// Crawlers only read the element stream.
pub fn xml<'a>(document: &'a str, config: &SiteConfig) -> Cow<'a, [u8]> {
    if !config.build.minify {
        return Cow::Borrowed(document.as_bytes());
    }

    let collapsed: String = document
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    Cow::Owned(collapsed.into_bytes())
}

// ============================================================================
// Tests
// ============================================================================
