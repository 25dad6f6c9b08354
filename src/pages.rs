//! Page script execution.
//!
//! Pages are produced by registered scripts. Each script receives a
//! `ScriptContext` scoping what it can touch: logging under its own name,
//! reading files confined to the pages directory, and adding pages to the
//! build. Scripts run concurrently; all of them settle before the first
//! failure is reported.

use crate::{
    config::SiteConfig,
    document::PageDocument,
    generator::sitemap::SitemapEntry,
    logger,
    paths::SitePaths,
    render::{self, PageOptions},
};
use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use std::{
    future::Future,
    path::{Component, Path},
    pin::Pin,
    sync::Arc,
};
use tokio::task::JoinSet;

// ============================================================================
// Script Registration
// ============================================================================

type ScriptFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type ScriptFn = Box<dyn Fn(ScriptContext) -> ScriptFuture + Send + Sync>;

/// A named page producer.
pub struct PageScript {
    name: String,
    run: ScriptFn,
}

impl PageScript {
    pub fn new<F, Fut>(name: &str, f: F) -> Self
    where
        F: Fn(ScriptContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            run: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Script Context
// ============================================================================

/// Capabilities handed to a running page script.
#[derive(Clone)]
pub struct ScriptContext {
    script: String,
    config: Arc<SiteConfig>,
    paths: Arc<SitePaths>,
    pages: Arc<Mutex<Vec<SitemapEntry>>>,
}

impl ScriptContext {
    fn new(
        script: &str,
        config: Arc<SiteConfig>,
        paths: Arc<SitePaths>,
        pages: Arc<Mutex<Vec<SitemapEntry>>>,
    ) -> Self {
        Self {
            script: script.to_string(),
            config,
            paths,
            pages,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Log a message under the script's name.
    pub fn log(&self, message: impl AsRef<str>) {
        logger::log(&self.script, message.as_ref());
    }

    /// Read a file relative to the pages directory.
    ///
    /// Absolute paths and `..` components are rejected so scripts cannot
    /// read outside the pages directory.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if path.is_absolute() {
            bail!("script {:?} may not load absolute path {}", self.script, path.display());
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            bail!(
                "script {:?} may not load {} outside the pages directory",
                self.script,
                path.display()
            );
        }

        let full = self.paths.pages_dir.join(path);
        tokio::fs::read_to_string(&full)
            .await
            .with_context(|| format!("failed to load {}", full.display()))
    }

    /// Validate a page document, render it, and write it into the build.
    /// Returns the generation message that was logged.
    pub async fn add_page(
        &self,
        document: &PageDocument,
        body: &str,
        options: &PageOptions,
    ) -> Result<String> {
        let validated = document
            .validate(&self.config)
            .with_context(|| format!("invalid page document in script {:?}", self.script))?;

        let file = render::write_page(&validated, body, options, &self.config, &self.paths)
            .await
            .with_context(|| format!("failed to write page {:?}", document.path))?;

        let message = format!("File generated for path {}", file.display());
        self.log(&message);
        self.pages.lock().push(SitemapEntry::from(&validated));
        Ok(message)
    }
}

// ============================================================================
// Collection
// ============================================================================

/// Run every registered script to completion.
///
/// Scripts run concurrently. All of them settle even when some fail; the
/// first failure is returned afterwards. No registered scripts is an error,
/// a build without pages is always a mistake.
pub async fn collect_pages(
    scripts: &[PageScript],
    config: Arc<SiteConfig>,
    paths: Arc<SitePaths>,
    pages: Arc<Mutex<Vec<SitemapEntry>>>,
) -> Result<()> {
    if scripts.is_empty() {
        bail!("no page scripts registered");
    }

    let mut set = JoinSet::new();
    for script in scripts {
        let ctx = ScriptContext::new(
            &script.name,
            Arc::clone(&config),
            Arc::clone(&paths),
            Arc::clone(&pages),
        );
        let name = script.name.clone();
        let fut = (script.run)(ctx);
        set.spawn(async move { (name, fut.await) });
    }

    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let (name, result) = joined.context("page script task panicked")?;
        if let Err(err) = result {
            logger::log("error", &format!("page script {name:?} failed: {err:#}"));
            if first_error.is_none() {
                first_error = Some(err.context(format!("page script {name:?} failed")));
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================
