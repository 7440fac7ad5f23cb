pub mod actions;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod diagnostics;
pub mod document;
pub mod duplicates;
pub mod engine;
pub mod extract;
pub mod gitignore;
pub mod logging;
pub mod query;
pub mod value_scan;
pub mod watcher;
pub mod workspace;

#[cfg(feature = "napi")]
use napi::bindgen_prelude::*;
#[cfg(feature = "napi")]
use napi_derive::napi;

#[cfg(feature = "napi")]
use crate::config::{Config, NapiConfig};
#[cfg(feature = "napi")]
use crate::workspace::{FsWorkspace, Workspace as _};

/// Check locale files for duplicate keys
///
/// # Arguments
/// * `config` - Configuration object
/// * `paths` - Files to check; empty means every locale file in the workspace
///
/// # Returns
/// Returns a JSON string with one entry per duplicate occurrence. Ranges are
/// zero-based to match editor addressing.
#[napi]
#[cfg(feature = "napi")]
pub fn check_files(config: NapiConfig, paths: Vec<String>) -> Result<String> {
    let config = Config::from_napi(config);
    let workspace = FsWorkspace::new(".");

    let files: Vec<std::path::PathBuf> = if paths.is_empty() {
        crate::workspace::find_locale_files(&workspace, &config)
            .map_err(|e| napi::Error::from_reason(format!("Enumeration failed: {}", e)))?
    } else {
        paths.into_iter().map(std::path::PathBuf::from).collect()
    };

    let mut duplicates = Vec::new();
    let mut checked = 0usize;
    for path in &files {
        let document = match workspace.open_document(path) {
            Ok(document) => document,
            Err(err) => {
                crate::logging::warn(&format!("Skipping {}: {:#}", path.display(), err));
                continue;
            }
        };
        checked += 1;
        for diagnostic in crate::duplicates::check_source(&document.text, path) {
            duplicates.push(serde_json::json!({
                "file": path,
                "line": diagnostic.range.line,
                "start": diagnostic.range.start,
                "end": diagnostic.range.end,
                "key": diagnostic.key,
                "message": diagnostic.message,
            }));
        }
    }

    Ok(serde_json::json!({
        "files_checked": checked,
        "duplicates": duplicates,
    })
    .to_string())
}

/// Search locale values for a keyword
///
/// # Arguments
/// * `config` - Configuration object
/// * `keyword` - Case-insensitive substring to look for
///
/// # Returns
/// Returns a JSON string with the matching entries
#[napi]
#[cfg(feature = "napi")]
pub fn find_text(config: NapiConfig, keyword: String) -> Result<String> {
    let config = Config::from_napi(config);
    let workspace = FsWorkspace::new(".");
    let mut cache = crate::document::DocumentCache::new();
    let token = crate::debounce::CancelToken::new();

    let matches = crate::query::collect_matches(&workspace, &mut cache, &config, &keyword, &token)
        .map_err(|e| napi::Error::from_reason(format!("Search failed: {}", e)))?
        .unwrap_or_default();

    Ok(serde_json::json!({ "matches": matches }).to_string())
}
