use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::actions::{self, TextEdit};
use crate::config::Config;

/// A buffer fetched from the host: full text plus its current revision.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub text: String,
    pub revision: u64,
}

/// Abstraction over the host environment the engine runs in.
///
/// Production code talks to the filesystem through `FsWorkspace`; tests use
/// the in-memory double below with explicit revisions.
pub trait Workspace: Send + Sync {
    /// Workspace root, when one exists.
    fn root(&self) -> Option<&Path>;

    /// Read a document's full text and current revision.
    fn open_document(&self, path: &Path) -> Result<FetchedDocument>;

    /// Revision the host currently reports for this path, if any.
    fn current_revision(&self, path: &Path) -> Option<u64>;

    /// Enumerate workspace files matching `pattern`, minus `exclude` matches.
    /// Results are sorted so discovery order is deterministic.
    fn find_files(&self, pattern: &str, exclude: Option<&str>) -> Result<Vec<PathBuf>>;

    /// Apply a single edit to the document at `path`.
    fn apply_edit(&self, path: &Path, edit: &TextEdit) -> Result<()>;
}

/// Filesystem-backed workspace. Revisions are a fingerprint of the file's
/// modification time and size, so an unchanged file keeps its revision.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn fingerprint(path: &Path) -> Option<u64> {
        use std::hash::{Hash, Hasher};

        let meta = std::fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        meta.len().hash(&mut hasher);
        if let Ok(modified) = meta.modified() {
            if let Ok(elapsed) = modified.duration_since(std::time::UNIX_EPOCH) {
                elapsed.as_nanos().hash(&mut hasher);
            }
        }
        Some(hasher.finish())
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn open_document(&self, path: &Path) -> Result<FetchedDocument> {
        let revision = Self::fingerprint(path).unwrap_or(0);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        Ok(FetchedDocument { text, revision })
    }

    fn current_revision(&self, path: &Path) -> Option<u64> {
        Self::fingerprint(path)
    }

    fn find_files(&self, pattern: &str, exclude: Option<&str>) -> Result<Vec<PathBuf>> {
        let include = glob::Pattern::new(pattern)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        let exclude = exclude
            .map(glob::Pattern::new)
            .transpose()
            .with_context(|| "Invalid exclude pattern")?;

        let mut found = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if !include.matches_path(relative) {
                continue;
            }
            if exclude
                .as_ref()
                .is_some_and(|pattern| pattern.matches_path(relative))
            {
                continue;
            }
            // walkdir yields "./x" under a "." root; keep returned paths clean
            found.push(path.strip_prefix("./").unwrap_or(path).to_path_buf());
        }
        found.sort();
        Ok(found)
    }

    fn apply_edit(&self, path: &Path, edit: &TextEdit) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        let updated = actions::apply_to_text(&text, edit)
            .ok_or_else(|| anyhow::anyhow!("Edit out of bounds for {}", path.display()))?;
        std::fs::write(path, updated)
            .with_context(|| format!("Failed to write: {}", path.display()))?;
        Ok(())
    }
}

/// Enumerate every recognized locale file in the workspace, honoring the
/// configured exclude glob. Glob hits whose stem is not actually a
/// configured name (e.g. `en.d.ts`) are filtered back out.
pub fn find_locale_files(workspace: &dyn Workspace, config: &Config) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for name in &config.file_names {
        for path in workspace.find_files(&format!("**/{}.*", name), Some(&config.exclude))? {
            if config.is_recognized(&path) {
                found.insert(path);
            }
        }
    }
    Ok(found.into_iter().collect())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_workspace_enumerates_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("locales")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("locales/en.js"), "module.exports = {};\n").unwrap();
        std::fs::write(root.join("node_modules/pkg/en.js"), "module.exports = {};\n").unwrap();
        std::fs::write(root.join("locales/fr.js"), "module.exports = {};\n").unwrap();

        let workspace = FsWorkspace::new(root);
        let found = workspace
            .find_files("**/en.js", Some("**/node_modules/**"))
            .unwrap();
        assert_eq!(found, vec![root.join("locales/en.js")]);
    }

    #[test]
    fn fs_workspace_revision_tracks_content_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en.json");
        std::fs::write(&path, "\"a\": \"1\"\n").unwrap();

        let workspace = FsWorkspace::new(dir.path());
        let first = workspace.open_document(&path).unwrap();
        assert_eq!(workspace.current_revision(&path), Some(first.revision));

        std::fs::write(&path, "\"a\": \"1\",\n\"b\": \"2\"\n").unwrap();
        let second = workspace.open_document(&path).unwrap();
        assert_ne!(first.revision, second.revision);
        assert_ne!(first.text, second.text);
    }

    #[test]
    fn mock_workspace_bumps_revisions_on_edit() {
        use mock::InMemoryWorkspace;

        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, "\"a\": \"1\"\n");
        assert_eq!(workspace.current_revision(path), Some(1));

        workspace
            .apply_edit(path, &TextEdit::DeleteLine { line: 0 })
            .unwrap();
        assert_eq!(workspace.current_revision(path), Some(2));
        assert_eq!(workspace.document_text(path).unwrap(), "");
    }

    #[test]
    fn locale_enumeration_filters_by_stem() {
        use mock::InMemoryWorkspace;

        let workspace = InMemoryWorkspace::new();
        workspace.add_document("public/en.js", "");
        workspace.add_document("locales/en-US.ts", "");
        workspace.add_document("locales/fr.json", "");
        workspace.add_document("types/en.d.ts", "");
        workspace.add_document("node_modules/pkg/en.js", "");

        let files = find_locale_files(&workspace, &Config::default()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("locales/en-US.ts"),
                PathBuf::from("public/en.js"),
            ]
        );
    }
}
