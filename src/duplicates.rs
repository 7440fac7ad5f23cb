use indexmap::IndexMap;
use std::path::Path;

use crate::diagnostics::Diagnostic;
use crate::extract::{self, SourceEntry};

/// Key → entries for one document, buckets in first-seen key order.
pub type KeyIndex = IndexMap<String, Vec<SourceEntry>>;

/// Group entries by key, preserving document order within each bucket.
pub fn build_key_index(entries: Vec<SourceEntry>) -> KeyIndex {
    let mut index = KeyIndex::new();
    for entry in entries {
        index.entry(entry.key.clone()).or_default().push(entry);
    }
    index
}

/// One Error diagnostic per occurrence of every key appearing more than once.
/// Keys appearing exactly once produce nothing.
pub fn duplicate_diagnostics(index: &KeyIndex) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (key, bucket) in index {
        if bucket.len() < 2 {
            continue;
        }
        for entry in bucket {
            diagnostics.push(Diagnostic::duplicate_key(key, entry.range));
        }
    }
    diagnostics
}

/// Full duplicate-key pass over one document's text.
pub fn check_source(text: &str, path: &Path) -> Vec<Diagnostic> {
    duplicate_diagnostics(&build_key_index(extract::entries_or_empty(text, path)))
}
