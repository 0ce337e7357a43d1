//! File system watcher for watch builds.
//!
//! Watches the project directory recursively and forwards relevant changes
//! through a channel. Output directories, `node_modules` and hidden entries
//! are ignored so that emitting a build never triggers the next one.

use crate::error::{Result, ResultExt};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Directory names never worth a rebuild.
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// Decides which paths trigger rebuilds.
#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    ignored: Vec<PathBuf>,
}

impl WatchFilter {
    /// Filter for `root`, ignoring everything below `ignored` directories.
    pub fn new(root: PathBuf, ignored: Vec<PathBuf>) -> Self {
        Self { root, ignored }
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        let rel_path = match path.strip_prefix(&self.root) {
            Ok(p) => p,
            Err(_) => return true,
        };

        if self.ignored.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        rel_path.components().any(|component| {
            component.as_os_str().to_str().is_some_and(|name| {
                IGNORED_DIRS.contains(&name) || (name.starts_with('.') && name != "." && name != "..")
            })
        })
    }
}

/// Recursive watcher over a project directory.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Starts watching `filter`'s root.
    ///
    /// Returns the watcher, which must be kept alive, and the receiver of
    /// changed paths.
    pub fn new(filter: WatchFilter) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        let root = filter.root.clone();
        std::fs::metadata(&root).with_path(&root)?;

        let (tx, rx) = mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {e}");
                    return;
                }
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if filter.should_ignore(&path) {
                    continue;
                }
                // The receiver is gone once watching stopped.
                if tx.blocking_send(path).is_err() {
                    return;
                }
            }
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_hint("On Linux, raise fs.inotify.max_user_watches or build without --watch")?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collects further changes until `interval` passes without waiting on the
/// first one. Returns the distinct changed paths including `first`, or
/// `None` when the channel closed.
pub async fn aggregate(
    first: PathBuf,
    rx: &mut mpsc::Receiver<PathBuf>,
    interval: Duration,
) -> Option<Vec<PathBuf>> {
    let mut changed = vec![first];
    let deadline = tokio::time::sleep(interval);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return Some(changed),
            next = rx.recv() => match next {
                Some(path) => {
                    if !changed.contains(&path) {
                        changed.push(path);
                    }
                }
                None => return None,
            },
        }
    }
}
