//! Directory mirroring: keep destination directories as copies of their
//! source directories.
//!
//! A `Mirror` holds a set of source-to-destination mappings. `copy` settles
//! every mapping even when some fail; per-mapping errors are logged and do
//! not abort the other mappings. `watch` (in the `watch` submodule) keeps
//! the destinations updated live.

pub mod watch;

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task::JoinSet;
use walkdir::WalkDir;

// ============================================================================
// Options
// ============================================================================

/// Filter callback deciding whether a source path is mirrored.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Per-mapping copy behavior.
#[derive(Clone)]
pub struct CopyOptions {
    /// Replace existing destination files.
    pub overwrite: bool,
    /// Treat an existing destination file as an error instead of skipping.
    pub error_on_exist: bool,
    /// Only paths the filter returns `true` for are mirrored.
    pub filter: Option<PathFilter>,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            error_on_exist: false,
            filter: None,
        }
    }
}

impl fmt::Debug for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOptions")
            .field("overwrite", &self.overwrite)
            .field("error_on_exist", &self.error_on_exist)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CopyOptions {
    fn allows(&self, path: &Path) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(path))
    }
}

// ============================================================================
// Mirror
// ============================================================================

/// One source directory mirrored to one destination directory.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub options: CopyOptions,
}

/// A set of directory mappings that can be copied or watched.
pub struct Mirror {
    mappings: Vec<Mapping>,
    clean_before_copy: bool,
    session: Option<watch::WatchSession>,
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("mappings", &self.mappings)
            .field("watching", &self.session.is_some())
            .finish()
    }
}

impl Mirror {
    pub fn new(clean_before_copy: bool) -> Self {
        Self {
            mappings: Vec::new(),
            clean_before_copy,
            session: None,
        }
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Register a mapping. Both directories are created if missing and the
    /// paths are stored in absolute form.
    ///
    /// A source already registered is rejected and the mapping set is left
    /// unchanged.
    pub fn add(
        &mut self,
        source: &Path,
        destination: &Path,
        options: CopyOptions,
    ) -> Result<()> {
        if source.as_os_str().is_empty() || destination.as_os_str().is_empty() {
            bail!("mirror mapping requires non-empty source and destination paths");
        }

        std::fs::create_dir_all(source)
            .with_context(|| format!("failed to create {}", source.display()))?;
        std::fs::create_dir_all(destination)
            .with_context(|| format!("failed to create {}", destination.display()))?;

        let source = source
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", source.display()))?;
        let destination = destination
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", destination.display()))?;

        if self.mappings.iter().any(|m| m.source == source) {
            bail!("source {} is already mirrored", source.display());
        }

        self.mappings.push(Mapping {
            source,
            destination,
            options,
        });
        Ok(())
    }

    /// Empty every destination directory, keeping the directories themselves.
    ///
    /// A destination that cannot be cleaned is logged and skipped; the
    /// remaining destinations are still cleaned.
    pub async fn clean(&self) {
        for mapping in &self.mappings {
            if let Err(err) = clean_dir(&mapping.destination).await {
                log!("error"; "failed to clean {}: {err:#}", mapping.destination.display());
            }
        }
    }

    /// Copy every mapping concurrently, cleaning all destinations first
    /// when the mirror was created with `clean_before_copy`.
    ///
    /// All mappings are attempted; a failing mapping is logged and does not
    /// stop the others.
    pub async fn copy(&self) -> Result<()> {
        if self.clean_before_copy {
            self.clean().await;
        }

        let mut set = JoinSet::new();
        for mapping in self.mappings.iter().cloned() {
            set.spawn(async move {
                let result = copy_tree(&mapping.source, &mapping.destination, &mapping.options)
                    .await;
                (mapping, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            let (mapping, result) = joined.context("mirror copy task panicked")?;
            match result {
                Ok(files) => {
                    log!("mirror"; "copied {files} files from {}", mapping.source.display());
                }
                Err(err) => {
                    log!("error"; "mirror {} failed: {err:#}", mapping.source.display());
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tree Operations
// ============================================================================

/// Remove every entry inside `dir` without removing `dir` itself.
pub async fn clean_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        tokio::fs::create_dir_all(dir).await?;
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}

/// Recursively copy `source` into `destination`, honoring the options.
/// Returns the number of files copied.
pub async fn copy_tree(
    source: &Path,
    destination: &Path,
    options: &CopyOptions,
) -> Result<u64> {
    let mut copied = 0;

    // filter_entry prunes rejected directories along with their subtrees
    let walker = WalkDir::new(source)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || options.allows(entry.path()));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("walked entry outside the source tree")?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target).await?;
        } else {
            if target.exists() {
                if options.error_on_exist {
                    bail!("destination {} already exists", target.display());
                }
                if !options.overwrite {
                    continue;
                }
            }
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(entry.path(), &target)
                .await
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_add_rejects_empty_paths() {
        let mut mirror = Mirror::new(true);
        let err = mirror.add(Path::new(""), Path::new("/tmp/x"), CopyOptions::default());
        assert!(err.is_err());
        assert!(mirror.mappings().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst_a = dir.path().join("a");
        let dst_b = dir.path().join("b");

        let mut mirror = Mirror::new(true);
        mirror.add(&src, &dst_a, CopyOptions::default()).unwrap();
        let err = mirror.add(&src, &dst_b, CopyOptions::default());

        assert!(err.is_err());
        assert_eq!(mirror.mappings().len(), 1);
    }

    #[test]
    fn test_add_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("deep/src");
        let dst = dir.path().join("deep/dst");

        let mut mirror = Mirror::new(true);
        mirror.add(&src, &dst, CopyOptions::default()).unwrap();

        assert!(src.is_dir());
        assert!(dst.is_dir());
        assert!(mirror.mappings()[0].source.is_absolute());
    }

    #[tokio::test]
    async fn test_copy_mirrors_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("a.txt"), "a");
        touch(&src.join("nested/b.txt"), "b");

        let mut mirror = Mirror::new(true);
        mirror.add(&src, &dst, CopyOptions::default()).unwrap();
        mirror.copy().await.unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.txt")).unwrap(), "b");
    }

    #[tokio::test]
    async fn test_copy_cleans_destination_first() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("keep.txt"), "k");
        touch(&dst.join("stale.txt"), "s");

        let mut mirror = Mirror::new(true);
        mirror.add(&src, &dst, CopyOptions::default()).unwrap();
        mirror.copy().await.unwrap();

        assert!(dst.join("keep.txt").exists());
        assert!(!dst.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_without_clean_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("keep.txt"), "k");
        touch(&dst.join("stale.txt"), "s");

        let mut mirror = Mirror::new(false);
        mirror.add(&src, &dst, CopyOptions::default()).unwrap();
        mirror.copy().await.unwrap();

        assert!(dst.join("keep.txt").exists());
        assert!(dst.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_applies_filter() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("page.html"), "h");
        touch(&src.join("notes.tmp"), "t");

        let options = CopyOptions {
            filter: Some(Arc::new(|path: &Path| {
                path.extension().is_none_or(|ext| ext != "tmp")
            })),
            ..Default::default()
        };

        let mut mirror = Mirror::new(true);
        mirror.add(&src, &dst, options).unwrap();
        mirror.copy().await.unwrap();

        assert!(dst.join("page.html").exists());
        assert!(!dst.join("notes.tmp").exists());
    }

    #[tokio::test]
    async fn test_copy_settles_all_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let src_a = dir.path().join("a");
        let src_b = dir.path().join("b");
        let dst_a = dir.path().join("out/a");
        let dst_b = dir.path().join("out/b");
        touch(&src_a.join("x.txt"), "x");
        touch(&src_b.join("y.txt"), "y");

        let mut mirror = Mirror::new(true);
        mirror.add(&src_a, &dst_a, CopyOptions::default()).unwrap();
        mirror.add(&src_b, &dst_b, CopyOptions::default()).unwrap();

        // break one source after registration
        fs::remove_dir_all(&src_a).unwrap();

        mirror.copy().await.unwrap();
        assert!(dst_b.join("y.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_survives_uncleanable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src_a = dir.path().join("a");
        let src_b = dir.path().join("b");
        let dst_a = dir.path().join("out/a");
        let dst_b = dir.path().join("out/b");
        touch(&src_a.join("x.txt"), "x");
        touch(&src_b.join("y.txt"), "y");

        let mut mirror = Mirror::new(true);
        mirror.add(&src_a, &dst_a, CopyOptions::default()).unwrap();
        mirror.add(&src_b, &dst_b, CopyOptions::default()).unwrap();

        // make one destination uncleanable by replacing it with a file
        fs::remove_dir_all(&dst_a).unwrap();
        fs::write(&dst_a, "not a directory").unwrap();

        mirror.copy().await.unwrap();
        assert!(dst_b.join("y.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_tree_error_on_exist() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("a.txt"), "new");
        touch(&dst.join("a.txt"), "old");

        let options = CopyOptions {
            error_on_exist: true,
            ..Default::default()
        };
        assert!(copy_tree(&src, &dst, &options).await.is_err());
    }

    #[tokio::test]
    async fn test_copy_tree_no_overwrite_skips() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        touch(&src.join("a.txt"), "new");
        touch(&dst.join("a.txt"), "old");

        let options = CopyOptions {
            overwrite: false,
            ..Default::default()
        };
        copy_tree(&src, &dst, &options).await.unwrap();
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "old");
    }
}
