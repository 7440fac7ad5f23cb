use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostic, LineSpan, RelatedLocation, Severity};
use crate::document::DocumentCache;
use crate::extract::{self, SourceEntry};
use crate::gitignore::IgnoreFilter;
use crate::logging;
use crate::workspace::Workspace;

/// Options for one value-detection pass.
#[derive(Debug, Clone)]
pub struct ValueScanOptions {
    pub cross_file: bool,
    pub exclude: String,
}

/// Detect other locations sharing the value at `line` of `path`.
///
/// Same-file matches skip the cursor's own line; cross-file matches, when
/// enabled, come from every non-ignored workspace file with the same base
/// name. Returns `None` when the line holds no entry, the value is empty, or
/// nothing else matches.
pub fn scan_line(
    workspace: &dyn Workspace,
    cache: &mut DocumentCache,
    path: &Path,
    line: u32,
    options: &ValueScanOptions,
) -> Result<Option<Diagnostic>> {
    let snapshot = cache.get(workspace, path)?;
    let entries = extract::entries_or_empty(&snapshot.text, path);
    let Some(current) = extract::entry_at_line(&entries, line) else {
        return Ok(None);
    };
    if current.value.is_empty() {
        return Ok(None);
    }
    let needle = extract::fold_value(&current.value);
    let value = current.value.clone();

    let mut related: Vec<RelatedLocation> = Vec::new();
    let mut seen: HashSet<(PathBuf, u32)> = HashSet::new();
    collect_value_matches(
        &mut related,
        &mut seen,
        &needle,
        &entries,
        &snapshot.text,
        path,
        Some(line),
    );

    if options.cross_file {
        scan_same_name_files(
            workspace,
            cache,
            path,
            &needle,
            &options.exclude,
            &mut related,
            &mut seen,
        )?;
    }

    if related.is_empty() {
        return Ok(None);
    }

    let line_len = snapshot.line(line).map(str::len).unwrap_or(0);
    Ok(Some(Diagnostic {
        range: LineSpan::full_line(line, line_len as u32),
        severity: Severity::Warning,
        message: format!(
            "Text \"{}\" already exists in {} other location(s)",
            value,
            related.len()
        ),
        code: None,
        key: None,
        related,
    }))
}

/// Fan out over every workspace file sharing the cursor file's base name,
/// skipping the file itself, ignored files, and files that fail to fetch.
fn scan_same_name_files(
    workspace: &dyn Workspace,
    cache: &mut DocumentCache,
    path: &Path,
    needle: &str,
    exclude: &str,
    related: &mut Vec<RelatedLocation>,
    seen: &mut HashSet<(PathBuf, u32)>,
) -> Result<()> {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Ok(());
    };

    let candidates = workspace.find_files(&format!("**/{}", name), Some(exclude))?;
    let ignore = IgnoreFilter::load(workspace.root());

    for candidate in candidates {
        if candidate.as_path() == path || ignore.is_ignored(&candidate) {
            continue;
        }
        let other = match cache.get(workspace, &candidate) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                logging::warn(&format!("Skipping {}: {:#}", candidate.display(), err));
                continue;
            }
        };
        let entries = extract::entries_or_empty(&other.text, &candidate);
        collect_value_matches(related, seen, needle, &entries, &other.text, &candidate, None);
    }
    Ok(())
}

/// Append every entry whose folded value equals `needle`, deduplicated by
/// (file, line) in discovery order.
fn collect_value_matches(
    related: &mut Vec<RelatedLocation>,
    seen: &mut HashSet<(PathBuf, u32)>,
    needle: &str,
    entries: &[SourceEntry],
    text: &str,
    path: &Path,
    skip_line: Option<u32>,
) {
    for entry in entries {
        if skip_line == Some(entry.range.line) {
            continue;
        }
        if entry.value.is_empty() || extract::fold_value(&entry.value) != needle {
            continue;
        }
        if !seen.insert((path.to_path_buf(), entry.range.line)) {
            continue;
        }
        let line_text = text
            .lines()
            .nth(entry.range.line as usize)
            .unwrap_or("")
            .to_string();
        related.push(RelatedLocation {
            file: path.to_path_buf(),
            line: entry.range.line,
            line_text,
        });
    }
}
