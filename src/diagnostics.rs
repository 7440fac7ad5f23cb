use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Code carried by duplicate-key diagnostics, matched by the quick-fix provider.
pub const DUPLICATE_KEY_CODE: &str = "duplicate-key";

/// A zero-based line plus a byte-offset column span within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineSpan {
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl LineSpan {
    pub fn new(line: u32, start: u32, end: u32) -> Self {
        Self { line, start, end }
    }

    /// Span covering a whole line of `len` bytes.
    pub fn full_line(line: u32, len: u32) -> Self {
        Self {
            line,
            start: 0,
            end: len,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A secondary location cited as evidence for a warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedLocation {
    pub file: PathBuf,
    pub line: u32,
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub range: LineSpan,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    /// Key name targeted by remediation actions; set on duplicate-key errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedLocation>,
}

impl Diagnostic {
    /// Error diagnostic for one occurrence of a duplicated key.
    pub fn duplicate_key(key: &str, range: LineSpan) -> Self {
        Self {
            range,
            severity: Severity::Error,
            message: format!("Duplicate key \"{}\"", key),
            code: Some(DUPLICATE_KEY_CODE),
            key: Some(key.to_string()),
            related: Vec::new(),
        }
    }
}

/// Per-path diagnostic store with full-replace publication.
///
/// `set` always replaces the whole set for a path; nothing is appended
/// incrementally, so stale diagnostics cannot linger across re-analysis.
#[derive(Debug, Default)]
pub struct DiagnosticCollection {
    by_path: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full diagnostic set for a path; an empty set removes it.
    pub fn set(&mut self, path: &Path, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            self.by_path.remove(path);
        } else {
            self.by_path.insert(path.to_path_buf(), diagnostics);
        }
    }

    pub fn get(&self, path: &Path) -> &[Diagnostic] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self, path: &Path) {
        self.by_path.remove(path);
    }

    pub fn clear_all(&mut self) {
        self.by_path.clear();
    }

    /// Drop every diagnostic for `path` whose key name equals `key`.
    pub fn remove_key(&mut self, path: &Path, key: &str) {
        if let Some(diagnostics) = self.by_path.get_mut(path) {
            diagnostics.retain(|d| d.key.as_deref() != Some(key));
            if diagnostics.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
