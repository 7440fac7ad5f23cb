use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::duplicates;
use crate::workspace::{self, FsWorkspace, Workspace};

pub fn run(
    config: &Config,
    paths: Vec<PathBuf>,
    json: bool,
    fail_on_duplicates: bool,
) -> Result<()> {
    if !json {
        println!("=== locale-detector check ===\n");
        println!("Configuration:");
        println!("  File names: {:?}", config.file_names);
        println!("  Exclude: {}", config.exclude);
        println!();
    }

    let workspace = FsWorkspace::new(".");
    let files = resolve_files(&workspace, config, &paths)?;

    if files.is_empty() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "files_checked": 0, "duplicates": [] })
            );
        } else {
            println!("No locale files found.");
        }
        return Ok(());
    }

    if !json {
        println!("Checking {} file(s)...\n", files.len());
    }

    let results = check_files(&workspace, &files);

    let total: usize = results.iter().map(|(_, diagnostics)| diagnostics.len()).sum();
    let flagged_files = results
        .iter()
        .filter(|(_, diagnostics)| !diagnostics.is_empty())
        .count();

    if json {
        let duplicates: Vec<_> = results
            .iter()
            .flat_map(|(path, diagnostics)| {
                diagnostics.iter().map(move |diagnostic| {
                    serde_json::json!({
                        "file": path,
                        "line": diagnostic.range.line + 1,
                        "column": diagnostic.range.start + 1,
                        "key": diagnostic.key,
                        "message": diagnostic.message,
                    })
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "files_checked": results.len(),
                "duplicates": duplicates,
            })
        );
    } else {
        for (path, diagnostics) in &results {
            if diagnostics.is_empty() {
                continue;
            }
            println!("{}", path.display());
            for diagnostic in diagnostics {
                println!(
                    "  {}:{}  {}",
                    diagnostic.range.line + 1,
                    diagnostic.range.start + 1,
                    diagnostic.message
                );
            }
            println!();
        }

        println!("{}", "-".repeat(60));
        println!("\nSummary:");
        println!("  Files checked: {}", results.len());
        println!("  Files with duplicates: {}", flagged_files);
        println!("  Duplicates: {}", total);

        if total == 0 {
            println!("\nNo duplicate keys found. All locale files are clean!");
        }
    }

    if fail_on_duplicates && total > 0 {
        if !json {
            eprintln!(
                "\nFailed: {} duplicate(s) found (--fail-on-duplicates enabled)",
                total
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Explicit paths are taken as given (directories are scanned for locale
/// files); with no paths the whole workspace is scanned.
fn resolve_files(
    workspace: &FsWorkspace,
    config: &Config,
    paths: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return workspace::find_locale_files(workspace, config);
    }

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let scoped = FsWorkspace::new(path.clone());
            files.extend(workspace::find_locale_files(&scoped, config)?);
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Check files in parallel, skipping any that fail to read
fn check_files(workspace: &FsWorkspace, files: &[PathBuf]) -> Vec<(PathBuf, Vec<Diagnostic>)> {
    use rayon::prelude::*;

    files
        .par_iter()
        .filter_map(|path| match workspace.open_document(path) {
            Ok(document) => Some((path.clone(), duplicates::check_source(&document.text, path))),
            Err(err) => {
                eprintln!("Warning: {:#}", err);
                None
            }
        })
        .collect()
}
