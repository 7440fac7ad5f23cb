use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::workspace::Workspace;

/// Immutable view of one document's text at a known revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub path: PathBuf,
    pub text: String,
    pub revision: u64,
}

impl DocumentSnapshot {
    pub fn line(&self, line: u32) -> Option<&str> {
        self.text.lines().nth(line as usize)
    }
}

/// Path-keyed snapshot cache with revision-equality freshness.
///
/// A cached snapshot is reused only while the host still reports the same
/// revision for its path; a different revision, or no live revision at all,
/// discards the entry and refetches. Entries are only touched from the
/// synchronous continuation of one event handler at a time, so the cache
/// carries no lock; wrap it in a mutex on a multi-threaded host.
#[derive(Debug, Default)]
pub struct DocumentCache {
    snapshots: HashMap<PathBuf, Arc<DocumentSnapshot>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `path`, reusing the cached snapshot while it is still fresh.
    pub fn get(&mut self, workspace: &dyn Workspace, path: &Path) -> Result<Arc<DocumentSnapshot>> {
        if let Some(cached) = self.snapshots.get(path) {
            if workspace.current_revision(path) == Some(cached.revision) {
                return Ok(Arc::clone(cached));
            }
            self.snapshots.remove(path);
        }

        let fetched = workspace.open_document(path)?;
        let snapshot = Arc::new(DocumentSnapshot {
            path: path.to_path_buf(),
            text: fetched.text,
            revision: fetched.revision,
        });
        self.snapshots.insert(path.to_path_buf(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the entry for one path.
    pub fn invalidate(&mut self, path: &Path) {
        self.snapshots.remove(path);
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
