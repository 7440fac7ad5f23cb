use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::actions::TextEdit;
use crate::config::Config;
use crate::debounce::CancelToken;
use crate::diagnostics::LineSpan;
use crate::document::DocumentCache;
use crate::extract;
use crate::logging;
use crate::workspace::Workspace;

/// One entry whose value contains the queried text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMatch {
    pub key: String,
    pub value: String,
    pub file: PathBuf,
}

/// How a text query ended.
#[derive(Debug, PartialEq)]
pub enum QueryOutcome {
    /// Prompt dismissed, keyword empty, or the query was superseded.
    Cancelled,
    NoMatches,
    /// A match was chosen but there was nowhere to insert it.
    Picked(QueryMatch),
    /// The chosen key replaced every active selection.
    Inserted { chosen: QueryMatch, count: usize },
}

/// Prompt and picker surface the query workflow runs against.
pub trait UserInteraction {
    /// Ask for the search keyword. `None` means the prompt was dismissed.
    fn prompt_keyword(&mut self) -> Option<String>;

    /// Offer `matches` and return the chosen index, or `None` if dismissed.
    fn pick_match(&mut self, matches: &[QueryMatch]) -> Option<usize>;

    /// Show an informational message.
    fn notify(&mut self, message: &str);
}

/// Where a chosen key is written: one replacement per selection.
#[derive(Debug, Clone)]
pub struct InsertionContext {
    pub path: PathBuf,
    pub selections: Vec<LineSpan>,
}

/// Search the configured locale globs for entries whose value contains
/// `keyword`, case-insensitively. Files reached through more than one glob
/// are scanned once. Returns `None` when `token` is cancelled mid-scan.
pub fn collect_matches(
    workspace: &dyn Workspace,
    cache: &mut DocumentCache,
    config: &Config,
    keyword: &str,
    token: &CancelToken,
) -> Result<Option<Vec<QueryMatch>>> {
    let needle = extract::fold_value(keyword);
    let mut matches = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    for pattern in &config.query_globs {
        for path in workspace.find_files(pattern, None)? {
            if token.is_cancelled() {
                return Ok(None);
            }
            if !visited.insert(path.clone()) {
                continue;
            }
            let snapshot = match cache.get(workspace, &path) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    logging::warn(&format!("Skipping {}: {:#}", path.display(), err));
                    continue;
                }
            };
            for entry in extract::entries_or_empty(&snapshot.text, &path) {
                if entry.value.is_empty() {
                    continue;
                }
                if extract::fold_value(&entry.value).contains(&needle) {
                    matches.push(QueryMatch {
                        key: entry.key,
                        value: entry.value,
                        file: path.clone(),
                    });
                }
            }
        }
    }
    Ok(Some(matches))
}

/// Run the full prompt, search, pick, insert workflow.
pub fn run_text_query(
    workspace: &dyn Workspace,
    cache: &mut DocumentCache,
    config: &Config,
    ui: &mut dyn UserInteraction,
    insertion: Option<&InsertionContext>,
    token: &CancelToken,
) -> Result<QueryOutcome> {
    let Some(keyword) = ui.prompt_keyword() else {
        return Ok(QueryOutcome::Cancelled);
    };
    let keyword = keyword.trim().to_string();
    if keyword.is_empty() {
        return Ok(QueryOutcome::Cancelled);
    }

    let Some(matches) = collect_matches(workspace, cache, config, &keyword, token)? else {
        return Ok(QueryOutcome::Cancelled);
    };
    if matches.is_empty() {
        ui.notify(&format!("No text containing \"{}\" was found", keyword));
        return Ok(QueryOutcome::NoMatches);
    }

    let Some(index) = ui.pick_match(&matches) else {
        return Ok(QueryOutcome::Cancelled);
    };
    let chosen = matches
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow::anyhow!("Picker returned index {} out of range", index))?;

    match insertion {
        Some(context) if !context.selections.is_empty() => {
            let count = insert_key(workspace, &chosen.key, context)?;
            Ok(QueryOutcome::Inserted { chosen, count })
        }
        _ => Ok(QueryOutcome::Picked(chosen)),
    }
}

/// Replace every selection with `key`, last span first so earlier edits
/// never shift the spans still waiting.
fn insert_key(workspace: &dyn Workspace, key: &str, context: &InsertionContext) -> Result<usize> {
    let mut selections = context.selections.clone();
    selections.sort_by(|a, b| (b.line, b.start).cmp(&(a.line, a.start)));
    for span in &selections {
        workspace.apply_edit(
            &context.path,
            &TextEdit::Replace {
                span: *span,
                new_text: key.to_string(),
            },
        )?;
    }
    Ok(selections.len())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::mock::InMemoryWorkspace;
    use mock::ScriptedUi;
    use std::path::Path;

    fn fixture_workspace() -> InMemoryWorkspace {
        let workspace = InMemoryWorkspace::new();
        workspace.add_document(
            "public/templates/en.js",
            "module.exports = {\n  \"day1\": \"Monday\",\n  \"day2\": \"Tuesday\"\n};\n",
        );
        workspace.add_document(
            "app/locales/pages/en-US.ts",
            "export default {\n  \"weekStart\": \"monday morning\"\n};\n",
        );
        workspace
    }

    #[test]
    fn keyword_matching_is_case_insensitive_substring() {
        let workspace = fixture_workspace();
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let matches = collect_matches(&workspace, &mut cache, &config, "Monday", &token)
            .unwrap()
            .unwrap();
        let keys: Vec<&str> = matches.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["day1", "weekStart"]);
        assert_eq!(matches[1].value, "monday morning");
        assert_eq!(matches[1].file, Path::new("app/locales/pages/en-US.ts"));
    }

    #[test]
    fn overlapping_globs_scan_each_file_once() {
        let workspace = InMemoryWorkspace::new();
        workspace.add_document(
            "templates/en.js",
            "module.exports = {\n  \"greet\": \"Hello\"\n};\n",
        );
        let mut cache = DocumentCache::new();
        let config = Config {
            query_globs: vec!["**/en.js".to_string(), "**/templates/en.js".to_string()],
            ..Config::default()
        };
        let token = CancelToken::new();

        let matches = collect_matches(&workspace, &mut cache, &config, "hello", &token)
            .unwrap()
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let workspace = fixture_workspace();
        workspace.poison("old/locales/x/en-US.ts");
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let matches = collect_matches(&workspace, &mut cache, &config, "tuesday", &token)
            .unwrap()
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "day2");
    }

    #[test]
    fn cancelled_token_aborts_the_scan() {
        let workspace = fixture_workspace();
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();
        token.cancel();

        let result = collect_matches(&workspace, &mut cache, &config, "monday", &token).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn dismissed_prompt_cancels_the_query() {
        let workspace = fixture_workspace();
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let mut ui = ScriptedUi::new(None, None);
        let outcome =
            run_text_query(&workspace, &mut cache, &config, &mut ui, None, &token).unwrap();
        assert_eq!(outcome, QueryOutcome::Cancelled);

        let mut ui = ScriptedUi::new(Some("   "), None);
        let outcome =
            run_text_query(&workspace, &mut cache, &config, &mut ui, None, &token).unwrap();
        assert_eq!(outcome, QueryOutcome::Cancelled);
    }

    #[test]
    fn no_matches_notifies_with_the_keyword() {
        let workspace = fixture_workspace();
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let mut ui = ScriptedUi::new(Some("zzz"), None);
        let outcome =
            run_text_query(&workspace, &mut cache, &config, &mut ui, None, &token).unwrap();
        assert_eq!(outcome, QueryOutcome::NoMatches);
        assert_eq!(
            ui.notifications,
            vec!["No text containing \"zzz\" was found"]
        );
    }

    #[test]
    fn picking_without_selections_returns_the_match() {
        let workspace = fixture_workspace();
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let mut ui = ScriptedUi::new(Some("tuesday"), Some(0));
        let outcome =
            run_text_query(&workspace, &mut cache, &config, &mut ui, None, &token).unwrap();
        match outcome {
            QueryOutcome::Picked(chosen) => assert_eq!(chosen.key, "day2"),
            other => panic!("expected Picked, got {:?}", other),
        }
        assert_eq!(ui.offered.len(), 1);
    }

    #[test]
    fn insertion_replaces_selections_without_shifting_spans() {
        let workspace = fixture_workspace();
        workspace.add_document("src/page.tsx", "t('XX') and t('XX')\n");
        let mut cache = DocumentCache::new();
        let config = Config::default();
        let token = CancelToken::new();

        let context = InsertionContext {
            path: "src/page.tsx".into(),
            selections: vec![LineSpan::new(0, 3, 5), LineSpan::new(0, 15, 17)],
        };
        let mut ui = ScriptedUi::new(Some("Monday"), Some(0));
        let outcome = run_text_query(
            &workspace,
            &mut cache,
            &config,
            &mut ui,
            Some(&context),
            &token,
        )
        .unwrap();

        match outcome {
            QueryOutcome::Inserted { chosen, count } => {
                assert_eq!(chosen.key, "day1");
                assert_eq!(count, 2);
            }
            other => panic!("expected Inserted, got {:?}", other),
        }
        assert_eq!(
            workspace.document_text("src/page.tsx").unwrap(),
            "t('day1') and t('day1')\n"
        );
    }
}
