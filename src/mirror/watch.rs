//! Live mirroring of watched source directories.
//!
//! A watch session performs an initial full copy of every mapping, then
//! applies filesystem events incrementally: created and modified paths are
//! re-copied, removed paths are removed from the destination. Event failures
//! are logged and never end the session.

use super::{Mapping, Mirror, copy_tree};
use crate::{log, logger::WatchStatus};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{path::Path, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};

/// Handle to a running watch session. Dropping it stops the watcher.
pub struct WatchSession {
    // kept alive for the duration of the session
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Mirror {
    /// Start mirroring live. Any previous session is stopped first.
    ///
    /// The session begins with a full copy of every mapping, then applies
    /// events as they arrive.
    pub fn watch(&mut self) -> Result<()> {
        self.stop_session();

        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = notify::recommended_watcher(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(err) => log!("error"; "watch event error: {err}"),
            },
        )
        .context("failed to create filesystem watcher")?;

        for mapping in &self.mappings {
            watcher
                .watch(&mapping.source, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", mapping.source.display()))?;
        }

        let mappings = Arc::new(self.mappings.clone());
        let task = tokio::spawn(run_session(mappings, rx));

        self.session = Some(WatchSession {
            _watcher: watcher,
            task,
        });
        Ok(())
    }

    /// Stop watching and clear the mapping set. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.stop_session();
        self.mappings.clear();
    }

    pub fn is_watching(&self) -> bool {
        self.session.is_some()
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            drop(session);
            log!("watch"; "stopped watching");
        }
    }
}

async fn run_session(mappings: Arc<Vec<Mapping>>, mut rx: mpsc::UnboundedReceiver<Event>) {
    // settle the initial state before applying events
    for mapping in mappings.iter() {
        match copy_tree(&mapping.source, &mapping.destination, &mapping.options).await {
            Ok(_) => log!("watch"; "watching {}", mapping.source.display()),
            Err(err) => {
                log!("error"; "initial copy of {} failed: {err:#}", mapping.source.display());
            }
        }
    }

    let mut status = WatchStatus::new();
    while let Some(event) = rx.recv().await {
        handle_event(&mappings, &event, &mut status).await;
    }
}

/// Apply one filesystem event to every mapping it falls under.
/// Failures are logged per path; the session keeps running.
async fn handle_event(mappings: &[Mapping], event: &Event, status: &mut WatchStatus) {
    let removed = matches!(event.kind, EventKind::Remove(_));
    if !removed && !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }

    for path in &event.paths {
        let Some(mapping) = mappings.iter().find(|m| path.starts_with(&m.source)) else {
            continue;
        };
        if !mapping.options.allows(path) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(&mapping.source) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = mapping.destination.join(relative);

        let result = if removed {
            remove_target(&target).await
        } else {
            sync_path(path, &target).await
        };

        match result {
            Ok(true) => status.success(&format!("synced: {}", relative.display())),
            Ok(false) => {}
            Err(err) => {
                status.error(&format!("failed to sync {}", relative.display()), &format!("{err:#}"));
            }
        }
    }
}

/// Copy a created or modified source path to its destination.
/// Returns false when there was nothing to do.
async fn sync_path(source: &Path, target: &Path) -> Result<bool> {
    let Ok(meta) = tokio::fs::metadata(source).await else {
        // the source is already gone; renames surface as a modify of the
        // old name, so the stale target has to go too
        return remove_target(target).await;
    };

    if meta.is_dir() {
        tokio::fs::create_dir_all(target).await?;
    } else {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(source, target).await?;
    }
    Ok(true)
}

async fn remove_target(target: &Path) -> Result<bool> {
    let Ok(meta) = tokio::fs::metadata(target).await else {
        return Ok(false);
    };

    if meta.is_dir() {
        tokio::fs::remove_dir_all(target).await?;
    } else {
        tokio::fs::remove_file(target).await?;
    }
    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================
