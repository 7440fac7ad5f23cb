use anyhow::{Context, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::duplicates;
use crate::workspace::{self, FsWorkspace, Workspace};

/// Watches a workspace and re-checks locale files as they change.
pub struct FileWatcher {
    config: Config,
    root: PathBuf,
    debounce_duration: Duration,
    workspace: FsWorkspace,
    /// Duplicate count per file from the last pass
    issue_counts: HashMap<PathBuf, usize>,
}

impl FileWatcher {
    pub fn new(config: Config, root: PathBuf) -> Self {
        let debounce_duration = Duration::from_millis(config.debounce_ms);
        let workspace = FsWorkspace::new(root.clone());
        Self {
            config,
            root,
            debounce_duration,
            workspace,
            issue_counts: HashMap::new(),
        }
    }

    /// Run the file watcher, blocking until interrupted
    pub fn run(&mut self) -> Result<()> {
        let (tx, rx) = channel();

        let mut debouncer =
            new_debouncer(self.debounce_duration, tx).context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(&self.root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch directory: {}", self.root.display()))?;

        println!("Watching: {}", self.root.display());
        println!("\nWatching for changes... (Ctrl+C to stop)\n");

        // Initial full check
        self.full_check()?;

        loop {
            match rx.recv() {
                Ok(result) => {
                    self.handle_events(result)?;
                }
                Err(_) => {
                    // Channel closed, exit
                    break;
                }
            }
        }

        Ok(())
    }

    /// Whether a changed path is a locale file we track
    fn should_process(&self, path: &Path) -> bool {
        if !self.config.is_recognized(path) {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        match glob::Pattern::new(&self.config.exclude) {
            Ok(pattern) => !pattern.matches_path(relative),
            Err(_) => true,
        }
    }

    /// Check every locale file in the workspace once
    fn full_check(&mut self) -> Result<()> {
        println!("--- Initial check ---");

        let files = workspace::find_locale_files(&self.workspace, &self.config)?;
        let results = self.check_files(&files);

        let mut total = 0usize;
        for (path, diagnostics) in results {
            total += diagnostics.len();
            report_file(&path, &diagnostics);
            self.issue_counts.insert(path, diagnostics.len());
        }

        println!("  Files: {}", self.issue_counts.len());
        println!("  Duplicates: {}", total);
        println!("--- Ready ---\n");

        Ok(())
    }

    /// Handle debounced file events
    fn handle_events(&mut self, result: DebounceEventResult) -> Result<()> {
        let events = match result {
            Ok(events) => events,
            Err(error) => {
                eprintln!("Watch error: {:?}", error);
                return Ok(());
            }
        };

        let mut changed_files = Vec::new();
        let mut removed_files = Vec::new();

        for event in events {
            let path = event.path;

            if !self.should_process(&path) {
                continue;
            }

            if path.exists() {
                changed_files.push(path);
            } else {
                removed_files.push(path);
            }
        }

        // Deduplicate
        changed_files.sort();
        changed_files.dedup();
        removed_files.sort();
        removed_files.dedup();

        if changed_files.is_empty() && removed_files.is_empty() {
            return Ok(());
        }

        println!("--- Change detected ---");
        for path in &changed_files {
            println!("  Modified: {}", path.display());
        }
        for path in &removed_files {
            println!("  Removed: {}", path.display());
            self.issue_counts.remove(path);
        }

        // Re-check only changed files
        let results = self.check_files(&changed_files);
        for (path, diagnostics) in results {
            report_file(&path, &diagnostics);
            self.issue_counts.insert(path, diagnostics.len());
        }

        let open_issues: usize = self.issue_counts.values().sum();
        println!("--- {} duplicate(s) across workspace ---\n", open_issues);

        Ok(())
    }

    /// Check files in parallel, skipping any that fail to read
    fn check_files(&self, files: &[PathBuf]) -> Vec<(PathBuf, Vec<Diagnostic>)> {
        use rayon::prelude::*;

        files
            .par_iter()
            .filter_map(|path| match self.workspace.open_document(path) {
                Ok(document) => {
                    Some((path.clone(), duplicates::check_source(&document.text, path)))
                }
                Err(err) => {
                    eprintln!("  Warning: {:#}", err);
                    None
                }
            })
            .collect()
    }
}

fn report_file(path: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        println!(
            "  {}:{}:{}  {}",
            path.display(),
            diagnostic.range.line + 1,
            diagnostic.range.start + 1,
            diagnostic.message
        );
    }
}
