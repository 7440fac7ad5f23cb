use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::actions::{self, FixAction};
use crate::config::Config;
use crate::debounce::{CancelToken, SelectionDebouncer};
use crate::diagnostics::{Diagnostic, DiagnosticCollection};
use crate::document::DocumentCache;
use crate::duplicates;
use crate::logging;
use crate::query::{self, InsertionContext, QueryOutcome, UserInteraction};
use crate::value_scan::{self, ValueScanOptions};
use crate::workspace::Workspace;

/// Event-driven analysis session over one workspace.
///
/// The host forwards editor events (open, change, close, selection) and
/// periodically calls [`poll`](Engine::poll); the engine keeps two
/// independent diagnostic collections current: duplicate-key errors per
/// document and at most one value-match warning for the active cursor line.
pub struct Engine {
    config: Config,
    cache: DocumentCache,
    key_errors: DiagnosticCollection,
    value_warnings: DiagnosticCollection,
    debouncer: SelectionDebouncer,
    query_token: Option<CancelToken>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let window = Duration::from_millis(config.debounce_ms);
        Self {
            config,
            cache: DocumentCache::new(),
            key_errors: DiagnosticCollection::new(),
            value_warnings: DiagnosticCollection::new(),
            debouncer: SelectionDebouncer::new(window),
            query_token: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A document participates only when analysis is enabled and its base
    /// name is a recognized locale name.
    fn in_scope(&self, path: &Path) -> bool {
        self.config.enabled && self.config.is_recognized(path)
    }

    pub fn document_opened(&mut self, workspace: &dyn Workspace, path: &Path) {
        self.recheck_keys(workspace, path);
    }

    pub fn document_changed(&mut self, workspace: &dyn Workspace, path: &Path) {
        self.recheck_keys(workspace, path);
    }

    /// Re-extract the document and replace its duplicate-key diagnostics
    /// wholesale.
    fn recheck_keys(&mut self, workspace: &dyn Workspace, path: &Path) {
        if !self.in_scope(path) {
            return;
        }
        let snapshot = match self.cache.get(workspace, path) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                logging::warn(&format!("Skipping {}: {:#}", path.display(), err));
                return;
            }
        };
        let diagnostics = duplicates::check_source(&snapshot.text, path);
        self.key_errors.set(path, diagnostics);
    }

    pub fn document_closed(&mut self, path: &Path) {
        self.key_errors.clear(path);
        self.value_warnings.clear(path);
        self.cache.invalidate(path);
    }

    /// Called with the set of still-open documents. Once none of them are in
    /// scope the cache and the value warnings have nothing left to serve.
    pub fn open_documents_changed(&mut self, open: &[PathBuf]) {
        if !open.iter().any(|path| self.in_scope(path)) {
            self.cache.invalidate_all();
            self.value_warnings.clear_all();
        }
    }

    /// Record a cursor move. The scan itself runs from [`poll`](Engine::poll)
    /// once the quiescence window elapses; a newer selection supersedes an
    /// older pending one. Returns the scheduled generation, or `None` when
    /// the document is out of scope.
    pub fn selection_changed(&mut self, path: &Path, line: u32, now: Instant) -> Option<u64> {
        if !self.in_scope(path) {
            return None;
        }
        Some(self.debouncer.submit(path.to_path_buf(), line, now))
    }

    /// When the next pending selection scan becomes due, if any.
    pub fn next_scan_due(&self) -> Option<Instant> {
        self.debouncer.next_due()
    }

    /// Run the pending selection scan if its window has elapsed. Previous
    /// value warnings for the document are cleared before scanning; the
    /// result publishes only while its generation is still current.
    pub fn poll(&mut self, workspace: &dyn Workspace, now: Instant) {
        let Some(scan) = self.debouncer.take_due(now) else {
            return;
        };
        self.value_warnings.clear(&scan.path);

        let options = ValueScanOptions {
            cross_file: self.config.cross_file,
            exclude: self.config.exclude.clone(),
        };
        match value_scan::scan_line(workspace, &mut self.cache, &scan.path, scan.line, &options) {
            Ok(result) => {
                if !self.debouncer.is_current(scan.generation) {
                    return;
                }
                if let Some(diagnostic) = result {
                    self.value_warnings.set(&scan.path, vec![diagnostic]);
                }
            }
            Err(err) => logging::warn(&format!(
                "Value scan failed for {}: {:#}",
                scan.path.display(),
                err
            )),
        }
    }

    /// Quick fixes for the duplicate-key diagnostics on `line`.
    pub fn fix_actions(&self, path: &Path, line: u32) -> Vec<FixAction> {
        self.key_errors
            .get(path)
            .iter()
            .filter(|diagnostic| diagnostic.range.line == line)
            .flat_map(actions::actions_for_diagnostic)
            .collect()
    }

    /// Apply a quick fix and retire the fixed key's diagnostics without a
    /// re-analysis pass.
    pub fn apply_fix(
        &mut self,
        workspace: &dyn Workspace,
        path: &Path,
        action: &FixAction,
    ) -> Result<()> {
        workspace.apply_edit(path, &action.edit)?;
        self.key_errors.remove_key(path, &action.key);
        self.cache.invalidate(path);
        Ok(())
    }

    /// Cancel any in-flight text query and issue the token for a new one.
    pub fn begin_query(&mut self) -> CancelToken {
        if let Some(previous) = self.query_token.take() {
            previous.cancel();
        }
        let token = CancelToken::new();
        self.query_token = Some(token.clone());
        token
    }

    /// Run the interactive find-text-and-insert-key workflow.
    pub fn text_query(
        &mut self,
        workspace: &dyn Workspace,
        ui: &mut dyn UserInteraction,
        insertion: Option<&InsertionContext>,
    ) -> Result<QueryOutcome> {
        let token = self.begin_query();
        query::run_text_query(
            workspace,
            &mut self.cache,
            &self.config,
            ui,
            insertion,
            &token,
        )
    }

    pub fn key_diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.key_errors.get(path)
    }

    pub fn value_diagnostics(&self, path: &Path) -> &[Diagnostic] {
        self.value_warnings.get(path)
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FixKind;
    use crate::workspace::mock::InMemoryWorkspace;

    const DUPES: &str = "\"a\": \"1\"\n\"b\": \"2\"\n\"a\": \"3\"\n";

    fn engine() -> Engine {
        Engine::new(Config::default())
    }

    #[test]
    fn opening_a_document_publishes_one_error_per_occurrence() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, path);

        let diagnostics = engine.key_diagnostics(path);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|diagnostic| diagnostic.key.as_deref() == Some("a")));
        assert_eq!(diagnostics[0].range.line, 0);
        assert_eq!(diagnostics[1].range.line, 2);
    }

    #[test]
    fn edits_replace_the_diagnostic_set_wholesale() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, path);
        assert_eq!(engine.key_diagnostics(path).len(), 2);

        workspace.update_document(path, "\"a\": \"1\"\n\"b\": \"2\"\n");
        engine.document_changed(&workspace, path);
        assert!(engine.key_diagnostics(path).is_empty());

        workspace.update_document(path, "\"b\": \"2\"\n\"b\": \"9\"\n");
        engine.document_changed(&workspace, path);
        let diagnostics = engine.key_diagnostics(path);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|diagnostic| diagnostic.key.as_deref() == Some("b")));
    }

    #[test]
    fn disabled_or_unrecognized_documents_are_inert() {
        let workspace = InMemoryWorkspace::new();
        workspace.add_document("fr.json", DUPES);
        workspace.add_document("en.json", DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, Path::new("fr.json"));
        assert!(engine.key_diagnostics(Path::new("fr.json")).is_empty());
        assert!(engine
            .selection_changed(Path::new("fr.json"), 0, Instant::now())
            .is_none());

        let config = Config {
            enabled: false,
            ..Config::default()
        };
        let mut disabled = Engine::new(config);
        disabled.document_opened(&workspace, Path::new("en.json"));
        assert!(disabled.key_diagnostics(Path::new("en.json")).is_empty());
        assert!(disabled
            .selection_changed(Path::new("en.json"), 0, Instant::now())
            .is_none());
    }

    #[test]
    fn selection_scan_waits_for_the_quiet_window() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, "\"greeting\": \"Hello\"\n\"salute\": \"hello\"\n");

        let mut engine = engine();
        let start = Instant::now();
        engine.selection_changed(path, 0, start);

        engine.poll(&workspace, start + Duration::from_millis(100));
        assert!(engine.value_diagnostics(path).is_empty());

        engine.poll(&workspace, start + Duration::from_millis(200));
        let warnings = engine.value_diagnostics(path);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].related.len(), 1);
        assert_eq!(warnings[0].related[0].line, 1);
    }

    #[test]
    fn newer_selection_supersedes_a_pending_scan() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, "\"greeting\": \"Hello\"\n\"salute\": \"hello\"\n");

        let mut engine = engine();
        let start = Instant::now();
        engine.selection_changed(path, 0, start);
        engine.selection_changed(path, 1, start + Duration::from_millis(100));

        // the first submission's window has elapsed, but it was replaced
        engine.poll(&workspace, start + Duration::from_millis(250));
        assert!(engine.value_diagnostics(path).is_empty());

        engine.poll(&workspace, start + Duration::from_millis(300));
        let warnings = engine.value_diagnostics(path);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].related[0].line, 0);
    }

    #[test]
    fn moving_to_a_plain_line_clears_the_previous_warning() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(
            path,
            "\"greeting\": \"Hello\"\n\"salute\": \"hello\"\nplain text\n",
        );

        let mut engine = engine();
        let start = Instant::now();
        engine.selection_changed(path, 0, start);
        engine.poll(&workspace, start + Duration::from_millis(200));
        assert_eq!(engine.value_diagnostics(path).len(), 1);

        engine.selection_changed(path, 2, start + Duration::from_millis(300));
        engine.poll(&workspace, start + Duration::from_millis(500));
        assert!(engine.value_diagnostics(path).is_empty());
    }

    #[test]
    fn closing_a_document_drops_its_diagnostics_and_snapshot() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, path);
        assert_eq!(engine.cached_documents(), 1);

        engine.document_closed(path);
        assert!(engine.key_diagnostics(path).is_empty());
        assert!(engine.value_diagnostics(path).is_empty());
        assert_eq!(engine.cached_documents(), 0);
    }

    #[test]
    fn cache_drops_once_no_relevant_document_stays_open() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, path);
        assert_eq!(engine.cached_documents(), 1);

        engine.open_documents_changed(&[PathBuf::from("en.json"), PathBuf::from("notes.md")]);
        assert_eq!(engine.cached_documents(), 1);

        engine.open_documents_changed(&[PathBuf::from("notes.md")]);
        assert_eq!(engine.cached_documents(), 0);
    }

    #[test]
    fn fixing_one_key_leaves_other_keys_diagnostics_alone() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, "\"a\": \"1\"\n\"a\": \"2\"\n\"b\": \"3\"\n\"b\": \"4\"\n");

        let mut engine = engine();
        engine.document_opened(&workspace, path);
        assert_eq!(engine.key_diagnostics(path).len(), 4);

        let actions = engine.fix_actions(path, 0);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].kind, FixKind::DeleteLine);

        engine.apply_fix(&workspace, path, &actions[0]).unwrap();
        assert_eq!(
            workspace.document_text(path).unwrap(),
            "\"a\": \"2\"\n\"b\": \"3\"\n\"b\": \"4\"\n"
        );
        let remaining = engine.key_diagnostics(path);
        assert_eq!(remaining.len(), 2);
        assert!(remaining
            .iter()
            .all(|diagnostic| diagnostic.key.as_deref() == Some("b")));
    }

    #[test]
    fn lines_without_duplicates_offer_no_actions() {
        let workspace = InMemoryWorkspace::new();
        let path = Path::new("en.json");
        workspace.add_document(path, DUPES);

        let mut engine = engine();
        engine.document_opened(&workspace, path);
        assert!(engine.fix_actions(path, 1).is_empty());
    }

    #[test]
    fn starting_a_query_cancels_the_previous_one() {
        let mut engine = engine();
        let first = engine.begin_query();
        assert!(!first.is_cancelled());

        let second = engine.begin_query();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }
}
