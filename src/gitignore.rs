use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

use crate::logging;

/// Workspace ignore rules for cross-file scans.
///
/// Built from `<root>/.gitignore`. A missing root or a missing ignore file
/// yields a filter that ignores nothing.
#[derive(Debug)]
pub struct IgnoreFilter {
    matcher: Option<Gitignore>,
    root: Option<PathBuf>,
}

impl IgnoreFilter {
    pub fn load(root: Option<&Path>) -> Self {
        let Some(root) = root else {
            return Self {
                matcher: None,
                root: None,
            };
        };

        let ignore_file = root.join(".gitignore");
        if !ignore_file.is_file() {
            return Self {
                matcher: None,
                root: Some(root.to_path_buf()),
            };
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&ignore_file) {
            logging::warn(&format!("Failed to read {}: {}", ignore_file.display(), err));
        }
        let matcher = match builder.build() {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                logging::warn(&format!("Failed to build ignore rules: {}", err));
                None
            }
        };

        Self {
            matcher,
            root: Some(root.to_path_buf()),
        }
    }

    /// Whether a candidate file is excluded by the workspace's ignore rules.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };
        let relative = match &self.root {
            Some(root) => path.strip_prefix(root).unwrap_or(path),
            None => path,
        };
        matcher
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }
}
