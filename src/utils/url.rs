//! URL shaping helpers.
//!
//! Pages are addressed by file paths; sitemap and canonical links want clean
//! URLs with `/index.html` and trailing slashes stripped.

/// Join a site URL and a relative path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Canonicalize a page URL: strip a trailing `/index.html` (any case) and a
/// trailing slash on non-root paths.
pub fn canonical_url(url: &str) -> String {
    let mut url = url.to_string();

    let lower = url.to_ascii_lowercase();
    if let Some(stripped) = lower.strip_suffix("/index.html") {
        url.truncate(stripped.len());
    }

    // Keep the bare origin intact ("https://x.com" has no path to trim)
    let after_scheme = url.find("://").map_or(0, |i| i + 3);
    if url[after_scheme..].contains('/') {
        while url.len() > after_scheme + 1 && url.ends_with('/') {
            url.pop();
        }
    }

    url
}

// ============================================================================
// Tests
// ============================================================================
