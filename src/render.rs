//! HTML page rendering.
//!
//! Wraps a page body in the full HTML shell: meta tags, canonical link,
//! Open Graph and Twitter cards, analytics snippets and PWA hooks, all
//! driven by the validated `Document`.

use crate::{config::SiteConfig, document::Document, paths::SitePaths, utils::minify};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::PathBuf;
use tokio::fs;

// ============================================================================
// Page Options
// ============================================================================

/// Extra markup injected verbatim into the rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Appended to `<head>` after the generated tags.
    pub insert_head: Vec<String>,
    /// Appended to `<body>` after the page content.
    pub insert_body_end: Vec<String>,
}

// ============================================================================
// Rendering
// ============================================================================

/// Builds the full HTML document around a page body.
pub struct HtmlGenerator<'a> {
    document: &'a Document,
    body: String,
    head_inserts: Vec<String>,
    body_end_inserts: Vec<String>,
}

impl<'a> HtmlGenerator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            body: String::new(),
            head_inserts: Vec::new(),
            body_end_inserts: Vec::new(),
        }
    }

    pub fn set_body_content(&mut self, body: &str) -> &mut Self {
        self.body = body.to_string();
        self
    }

    /// Append markup to `<head>` after the generated tags.
    pub fn insert_head(&mut self, snippet: &str) -> &mut Self {
        self.head_inserts.push(snippet.to_string());
        self
    }

    /// Append markup to `<body>` after the page content.
    pub fn insert_body_end(&mut self, snippet: &str) -> &mut Self {
        self.body_end_inserts.push(snippet.to_string());
        self
    }

    pub fn render(&self, config: &SiteConfig) -> String {
        render_parts(
            self.document,
            &self.body,
            &self.head_inserts,
            &self.body_end_inserts,
            config,
        )
    }
}

/// Render a complete HTML page around `body`.
pub fn render_page(
    document: &Document,
    body: &str,
    options: &PageOptions,
    config: &SiteConfig,
) -> String {
    render_parts(
        document,
        body,
        &options.insert_head,
        &options.insert_body_end,
        config,
    )
}

fn render_parts(
    document: &Document,
    body: &str,
    head_inserts: &[String],
    body_end_inserts: &[String],
    config: &SiteConfig,
) -> String {
    let mut head = String::with_capacity(2048);

    let _ = write!(
        head,
        concat!(
            r#"<meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            "<title>{title}</title>",
            r#"<meta name="description" content="{description}">"#,
            r#"<meta name="robots" content="{robots}">"#,
            r#"<link rel="canonical" href="{url}">"#,
        ),
        title = escape_html(&document.title),
        description = escape_html(&document.description),
        robots = document.robots_content(),
        url = document.url,
    );

    if let Some(keywords) = &document.keywords {
        let _ = write!(
            head,
            r#"<meta name="keywords" content="{}">"#,
            escape_html(keywords)
        );
    }
    if !document.author.is_empty() {
        let _ = write!(
            head,
            r#"<meta name="author" content="{}">"#,
            escape_html(&document.author)
        );
    }

    head.push_str(concat!(
        r#"<link rel="icon" href="/favicon.ico" sizes="any">"#,
        r#"<link rel="icon" type="image/png" sizes="32x32" href="/assets/site/favicon-32x32.png">"#,
        r#"<link rel="icon" type="image/png" sizes="16x16" href="/assets/site/favicon-16x16.png">"#,
        r#"<link rel="apple-touch-icon" href="/assets/site/apple-touch-icon.png">"#,
    ));

    let _ = write!(
        head,
        r#"<meta name="theme-color" content="{}">"#,
        document.theme_color
    );
    if config.pwa.enable {
        head.push_str(r#"<link rel="manifest" href="/manifest.json">"#);
    }

    write_open_graph(&mut head, document, config);
    write_twitter_card(&mut head, document);
    write_analytics(&mut head, document);

    for snippet in head_inserts {
        head.push_str(snippet);
    }

    let mut tail = String::new();
    for snippet in body_end_inserts {
        tail.push_str(snippet);
    }
    if config.pwa.enable {
        tail.push_str(SERVICE_WORKER_REGISTRATION);
    }

    format!(
        r#"<!DOCTYPE html><html lang="{lang}"><head>{head}</head><body>{body}{tail}</body></html>"#,
        lang = document.language,
    )
}

fn write_open_graph(head: &mut String, document: &Document, config: &SiteConfig) {
    let _ = write!(
        head,
        concat!(
            r#"<meta property="og:type" content="website">"#,
            r#"<meta property="og:site_name" content="{site_name}">"#,
            r#"<meta property="og:title" content="{title}">"#,
            r#"<meta property="og:description" content="{description}">"#,
            r#"<meta property="og:url" content="{url}">"#,
            r#"<meta property="og:image" content="{image}">"#,
            r#"<meta property="og:locale" content="{locale}">"#,
        ),
        site_name = escape_html(&config.site.name),
        title = escape_html(&document.title),
        description = escape_html(&document.description),
        url = document.url,
        image = document.og_image,
        locale = document.language.replace('-', "_"),
    );
}

fn write_twitter_card(head: &mut String, document: &Document) {
    let _ = write!(
        head,
        concat!(
            r#"<meta name="twitter:card" content="summary_large_image">"#,
            r#"<meta name="twitter:title" content="{title}">"#,
            r#"<meta name="twitter:description" content="{description}">"#,
            r#"<meta name="twitter:image" content="{image}">"#,
        ),
        title = escape_html(&document.title),
        description = escape_html(&document.description),
        image = document.og_image,
    );
    if !document.twitter_handle.is_empty() {
        let _ = write!(
            head,
            r#"<meta name="twitter:site" content="{}">"#,
            document.twitter_handle
        );
    }
}

fn write_analytics(head: &mut String, document: &Document) {
    if !document.google_analytics.is_empty() {
        let id = &document.google_analytics;
        let _ = write!(
            head,
            concat!(
                r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>"#,
                "<script>window.dataLayer=window.dataLayer||[];",
                "function gtag(){{dataLayer.push(arguments);}}",
                "gtag('js',new Date());gtag('config','{id}');</script>",
            ),
            id = id,
        );
    }
    if !document.bing_analytics.is_empty() {
        let _ = write!(
            head,
            r#"<meta name="msvalidate.01" content="{}">"#,
            document.bing_analytics
        );
    }
}

const SERVICE_WORKER_REGISTRATION: &str = concat!(
    "<script>if('serviceWorker' in navigator){",
    "window.addEventListener('load',function(){",
    "navigator.serviceWorker.register('/serviceworker.js');",
    "});}</script>",
);

/// Escape text destined for an HTML attribute or text node.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Writing
// ============================================================================

/// Render, minify, and write a page to its build location.
///
/// Returns the file path the page was written to.
pub async fn write_page(
    document: &Document,
    body: &str,
    options: &PageOptions,
    config: &SiteConfig,
    paths: &SitePaths,
) -> Result<PathBuf> {
    let file = paths.build_file(&document.file_path)?;
    let html = render_page(document, body, options, config);
    let bytes = minify::html(&html, config);

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&file, bytes.as_ref())
        .await
        .with_context(|| format!("failed to write {}", file.display()))?;

    Ok(file)
}

// ============================================================================
// Tests
// ============================================================================
