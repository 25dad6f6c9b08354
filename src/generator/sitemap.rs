//! Sitemap generation.
//!
//! Emits `sitemap.xml` from the entries recorded while pages were added.
//! Entries marked non-indexable never appear. Past the per-file URL limit
//! the output is sharded into numbered files behind a sitemap index.

use crate::{
    config::SiteConfig,
    document::{ChangeFreq, Document},
    paths::SitePaths,
    utils::minify,
};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use tokio::fs;

/// Maximum URLs per sitemap file, per the sitemaps.org protocol.
const MAX_URLS_PER_FILE: usize = 50_000;

/// One page recorded for the sitemap.
#[derive(Debug, Clone)]
pub struct SitemapEntry {
    pub loc: String,
    /// YYYY-MM-DD last modification date.
    pub lastmod: String,
    pub changefreq: Option<ChangeFreq>,
    pub priority: f32,
    pub allow_indexing: bool,
}

impl From<&Document> for SitemapEntry {
    fn from(doc: &Document) -> Self {
        Self {
            loc: doc.url.clone(),
            lastmod: doc.lastmod_ymd(),
            changefreq: doc.changefreq,
            priority: doc.priority,
            allow_indexing: doc.should_allow_indexing,
        }
    }
}

/// Write `sitemap.xml` (and shards when needed) into the build directory.
/// Returns the number of indexable URLs written.
pub async fn generate(
    entries: &[SitemapEntry],
    config: &SiteConfig,
    paths: &SitePaths,
) -> Result<usize> {
    generate_with_limit(entries, config, paths, MAX_URLS_PER_FILE).await
}

/// Same as `generate`, with the per-file limit as a parameter.
pub async fn generate_with_limit(
    entries: &[SitemapEntry],
    config: &SiteConfig,
    paths: &SitePaths,
    limit: usize,
) -> Result<usize> {
    let indexable: Vec<&SitemapEntry> =
        entries.iter().filter(|entry| entry.allow_indexing).collect();

    if indexable.len() <= limit {
        let xml = render_urlset(&indexable);
        write_xml(&paths.sitemap_file(), &xml, config).await?;
        return Ok(indexable.len());
    }

    let shards: Vec<_> = indexable.chunks(limit).collect();
    for (i, shard) in shards.iter().enumerate() {
        let xml = render_urlset(shard);
        let file = paths.build_dir.join(format!("sitemap-{}.xml", i + 1));
        write_xml(&file, &xml, config).await?;
    }

    let index = render_index(shards.len(), config.website_url());
    write_xml(&paths.sitemap_file(), &index, config).await?;
    Ok(indexable.len())
}

fn render_urlset(entries: &[&SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 128);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&entry.loc));
        let _ = writeln!(xml, "    <lastmod>{}</lastmod>", entry.lastmod);
        if let Some(changefreq) = entry.changefreq {
            let _ = writeln!(xml, "    <changefreq>{}</changefreq>", changefreq.as_str());
        }
        let _ = writeln!(xml, "    <priority>{:.1}</priority>", entry.priority);
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn render_index(shards: usize, website_url: &str) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for i in 1..=shards {
        xml.push_str("  <sitemap>\n");
        let _ = writeln!(xml, "    <loc>{website_url}/sitemap-{i}.xml</loc>");
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

async fn write_xml(file: &std::path::Path, xml: &str, config: &SiteConfig) -> Result<()> {
    let bytes = minify::xml(xml, config);
    fs::write(file, bytes.as_ref())
        .await
        .with_context(|| format!("failed to write {}", file.display()))
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
}

// ============================================================================
// Tests
// ============================================================================
