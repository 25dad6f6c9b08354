//! Build orchestration.
//!
//! A `Site` owns the validated configuration, the registered page scripts,
//! and the post-build hooks. `generate()` runs the build stages in order and
//! fails fast; `watch()` keeps the asset directories mirrored until the
//! process ends.

use crate::{
    bundle,
    config::SiteConfig,
    generator::{error_page, pwa, robots, sitemap, sitemap::SitemapEntry},
    log,
    mirror::{CopyOptions, Mirror},
    pages::{self, PageScript},
    paths::SitePaths,
};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{future::Future, pin::Pin, sync::Arc, time::Instant};

type HookFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type HookFn = Box<dyn Fn() -> HookFuture + Send + Sync>;

struct PostBuildHook {
    name: String,
    run: HookFn,
}

/// A site: configuration plus everything user code registered.
pub struct Site {
    config: Arc<SiteConfig>,
    paths: Arc<SitePaths>,
    scripts: Vec<PageScript>,
    hooks: Vec<PostBuildHook>,
    entries: Arc<Mutex<Vec<SitemapEntry>>>,
    mirror: Mirror,
}

impl Site {
    /// Create a site from a configuration. The configuration is validated
    /// here, once, before any build can start.
    pub fn new(config: SiteConfig) -> Result<Self> {
        config.validate()?;
        let paths = SitePaths::from_config(&config);
        Ok(Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            scripts: Vec::new(),
            hooks: Vec::new(),
            entries: Arc::new(Mutex::new(Vec::new())),
            mirror: Mirror::new(true),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn paths(&self) -> &SitePaths {
        &self.paths
    }

    /// Register a named page script. Scripts run concurrently during the
    /// collect stage; each receives a `ScriptContext`.
    pub fn register_script<F, Fut>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(pages::ScriptContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.scripts.push(PageScript::new(name, f));
        self
    }

    /// Register a post-build hook. Hooks run after all artifacts are
    /// written, sequentially, in registration order.
    pub fn add_post_build_hook<F, Fut>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.hooks.push(PostBuildHook {
            name: name.to_string(),
            run: Box::new(move || Box::pin(f())),
        });
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Run a full build. Stages run in order and the first failure aborts
    /// the run.
    pub async fn generate(&mut self) -> Result<()> {
        let started = Instant::now();
        self.run_stages().await.context("build process failed")?;

        let pages = self.entries.lock().len();
        log!(
            "build";
            "finished in {:.2?}: {pages} pages, output {}",
            started.elapsed(),
            self.paths.build_dir.display()
        );
        Ok(())
    }

    async fn run_stages(&mut self) -> Result<()> {
        self.entries.lock().clear();

        // CLEAN: production rebuilds start from an empty output dir
        if self.config.is_production() {
            clean_output(&self.paths).await?;
        }
        tokio::fs::create_dir_all(&self.paths.build_dir)
            .await
            .with_context(|| format!("failed to create {}", self.paths.build_dir.display()))?;

        // COLLECT_PAGES
        pages::collect_pages(
            &self.scripts,
            Arc::clone(&self.config),
            Arc::clone(&self.paths),
            Arc::clone(&self.entries),
        )
        .await?;

        // MIRROR_ASSETS
        self.asset_mirror()?.copy().await?;

        // GENERATE_DERIVED_ARTIFACTS
        let entries = self.entries.lock().clone();
        let indexed = sitemap::generate(&entries, &self.config, &self.paths).await?;
        log!("build"; "sitemap written with {indexed} URLs");

        error_page::generate(&self.config, &self.paths).await?;
        robots::generate(&self.config, &self.paths).await?;

        if self.config.pwa.enable {
            pwa::write_manifest(&self.config, &self.paths).await?;
        } else if self.config.is_development() {
            pwa::remove_stale(&self.paths).await?;
        }

        // BUNDLE_ASSETS
        bundle::run(&self.config, &self.paths).await?;

        // the service worker enumerates build files, so it goes last
        if self.config.pwa.enable {
            pwa::write_service_worker(&self.config, &self.paths).await?;
        }

        // POST_BUILD_HOOKS, strictly in registration order
        for hook in &self.hooks {
            (hook.run)()
                .await
                .with_context(|| format!("post-build hook {:?} failed", hook.name))?;
        }

        Ok(())
    }

    // ========================================================================
    // Watch
    // ========================================================================

    /// Start mirroring the asset directories live. Replaces any running
    /// session.
    pub fn start_watch(&mut self) -> Result<()> {
        self.mirror.stop();
        self.mirror = self.asset_mirror()?;
        self.mirror.watch()?;
        Ok(())
    }

    /// Watch the asset directories until the process is terminated.
    pub async fn watch(&mut self) -> Result<()> {
        self.start_watch()?;
        std::future::pending::<()>().await;
        Ok(())
    }

    pub fn stop_watch(&mut self) {
        self.mirror.stop();
    }

    fn asset_mirror(&self) -> Result<Mirror> {
        let mut mirror = Mirror::new(true);
        mirror.add(
            &self.paths.src_site_assets_dir(),
            &self.paths.build_site_assets_dir(),
            CopyOptions::default(),
        )?;
        mirror.add(
            &self.paths.src_uploads_dir(),
            &self.paths.build_uploads_dir(),
            CopyOptions::default(),
        )?;
        Ok(mirror)
    }
}

/// Empty the build directory, keeping `.git` so deploy checkouts survive.
/// A missing directory is fine.
async fn clean_output(paths: &SitePaths) -> Result<()> {
    let dir = &paths.build_dir;
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
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
    use crate::{document::PageDocument, render::PageOptions};
    use anyhow::bail;
    use std::{
        fs,
        path::Path,
        sync::atomic::{AtomicUsize, Ordering},
    };

    fn site(root: &Path, mode: &str) -> Site {
        let mut config = SiteConfig::from_str(&format!(
            r#"
            mode = "{mode}"

            [site]
            name = "Test Site"
            production_url = "https://example.com"
            development_url = "http://localhost:3000"

            [build]
            minify = false
        "#,
        ))
        .unwrap();
        config.update_with_root(root);
        Site::new(config).unwrap()
    }

    fn page(path: &str, indexable: bool) -> PageDocument {
        let mut doc = PageDocument {
            title: "T".into(),
            description: "D".into(),
            path: path.into(),
            updated_at: "2024-01-01".into(),
            ..Default::default()
        };
        doc.should_allow_indexing = indexable;
        doc
    }

    #[tokio::test]
    async fn test_generate_full_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("home", |ctx| async move {
            ctx.add_page(&page("index", true), "<h1>hi</h1>", &PageOptions::default())
                .await?;
            Ok(())
        });

        site.generate().await.unwrap();

        let build = site.paths().build_dir.clone();
        assert!(build.join("index.html").exists());
        assert!(build.join("sitemap.xml").exists());
        assert!(build.join("robots.txt").exists());
        assert!(build.join("404.html").exists());
        assert!(build.join("assets/site").is_dir());
    }

    #[tokio::test]
    async fn test_generate_without_scripts_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");

        let err = site.generate().await.unwrap_err();
        assert!(format!("{err:#}").contains("build process failed"));
    }

    #[tokio::test]
    async fn test_collect_failure_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("bad", |_ctx| async move { bail!("boom") });

        assert!(site.generate().await.is_err());
        // downstream stages never ran
        assert!(!site.paths().sitemap_file().exists());
        assert!(!site.paths().robots_file().exists());
    }

    #[tokio::test]
    async fn test_sitemap_filters_noindex_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("all", |ctx| async move {
            ctx.add_page(&page("public", true), "", &PageOptions::default())
                .await?;
            ctx.add_page(&page("hidden", false), "", &PageOptions::default())
                .await?;
            Ok(())
        });

        site.generate().await.unwrap();

        let xml = fs::read_to_string(site.paths().sitemap_file()).unwrap();
        assert!(xml.contains("public.html"));
        assert!(!xml.contains("hidden.html"));
        // the page itself is still built, just not advertised
        assert!(site.paths().build_dir.join("hidden.html").exists());
    }

    #[tokio::test]
    async fn test_production_clean_preserves_git() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join(".git")).unwrap();
        fs::write(build.join(".git/HEAD"), "ref").unwrap();
        fs::write(build.join("stale.html"), "old").unwrap();

        let mut site = site(dir.path(), "production");
        site.register_script("home", |ctx| async move {
            ctx.add_page(&page("index", true), "", &PageOptions::default())
                .await?;
            Ok(())
        });

        site.generate().await.unwrap();

        assert!(build.join(".git/HEAD").exists());
        assert!(!build.join("stale.html").exists());
        assert!(build.join("index.html").exists());
    }

    #[tokio::test]
    async fn test_hooks_run_in_order_after_build() {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("home", |ctx| async move {
            ctx.add_page(&page("index", true), "", &PageOptions::default())
                .await?;
            Ok(())
        });
        site.add_post_build_hook("first", || async {
            let seen = COUNTER.fetch_add(1, Ordering::SeqCst);
            assert_eq!(seen, 0);
            Ok(())
        });
        site.add_post_build_hook("second", || async {
            let seen = COUNTER.fetch_add(1, Ordering::SeqCst);
            assert_eq!(seen, 1);
            Ok(())
        });

        site.generate().await.unwrap();
        assert_eq!(COUNTER.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_hook_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("home", |ctx| async move {
            ctx.add_page(&page("index", true), "", &PageOptions::default())
                .await?;
            Ok(())
        });
        site.add_post_build_hook("deploy", || async { bail!("deploy failed") });

        let err = site.generate().await.unwrap_err();
        assert!(format!("{err:#}").contains("deploy"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_and_stop_watch() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");

        site.start_watch().unwrap();
        site.start_watch().unwrap();
        site.stop_watch();
        site.stop_watch();
    }

    #[tokio::test]
    async fn test_rebuild_resets_sitemap_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut site = site(dir.path(), "development");
        site.register_script("home", |ctx| async move {
            ctx.add_page(&page("index", true), "", &PageOptions::default())
                .await?;
            Ok(())
        });

        site.generate().await.unwrap();
        site.generate().await.unwrap();

        let xml = fs::read_to_string(site.paths().sitemap_file()).unwrap();
        // the page appears exactly once even after a second run
        assert_eq!(xml.matches("<loc>").count(), 1);
    }
}
