use crate::diagnostics::{Diagnostic, LineSpan, DUPLICATE_KEY_CODE};

/// Suffix appended by the rename fix.
pub const RENAME_SUFFIX: &str = "_new";

/// The three remediation shapes for a duplicate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    DeleteLine,
    DeleteKey,
    RenameKey,
}

impl FixKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "delete-line" => Some(Self::DeleteLine),
            "delete-key" => Some(Self::DeleteKey),
            "rename-key" => Some(Self::RenameKey),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteLine => "delete-line",
            Self::DeleteKey => "delete-key",
            Self::RenameKey => "rename-key",
        }
    }
}

/// A single line-local text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    /// Remove a full line including its terminator.
    DeleteLine { line: u32 },
    /// Replace a byte span within one line.
    Replace { span: LineSpan, new_text: String },
}

/// One quick fix offered for a duplicate-key diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct FixAction {
    pub kind: FixKind,
    pub title: String,
    pub key: String,
    pub edit: TextEdit,
}

/// Build the quick fixes for one diagnostic. Non-duplicate-key diagnostics
/// get no fixes.
pub fn actions_for_diagnostic(diagnostic: &Diagnostic) -> Vec<FixAction> {
    if diagnostic.code != Some(DUPLICATE_KEY_CODE) {
        return Vec::new();
    }
    let Some(key) = diagnostic.key.clone() else {
        return Vec::new();
    };

    vec![
        FixAction {
            kind: FixKind::DeleteLine,
            title: "Delete entire line".to_string(),
            key: key.clone(),
            edit: TextEdit::DeleteLine {
                line: diagnostic.range.line,
            },
        },
        FixAction {
            kind: FixKind::DeleteKey,
            title: "Delete key only".to_string(),
            key: key.clone(),
            edit: TextEdit::Replace {
                span: diagnostic.range,
                new_text: String::new(),
            },
        },
        FixAction {
            kind: FixKind::RenameKey,
            title: format!("Rename key to \"{}{}\"", key, RENAME_SUFFIX),
            key: key.clone(),
            edit: TextEdit::Replace {
                span: diagnostic.range,
                new_text: format!("{}{}", key, RENAME_SUFFIX),
            },
        },
    ]
}

/// Apply an edit to a document's text, returning the updated text.
/// `None` when the edit's line or span falls outside the document.
pub fn apply_to_text(text: &str, edit: &TextEdit) -> Option<String> {
    match edit {
        TextEdit::DeleteLine { line } => {
            let (start, end) = line_bounds(text, *line as usize)?;
            let mut updated = String::with_capacity(text.len());
            updated.push_str(&text[..start]);
            updated.push_str(&text[end..]);
            Some(updated)
        }
        TextEdit::Replace { span, new_text } => {
            let (line_start, line_end) = line_bounds(text, span.line as usize)?;
            let content = &text[line_start..line_end];
            let content = content.strip_suffix('\n').unwrap_or(content);
            let content = content.strip_suffix('\r').unwrap_or(content);

            let (start, end) = (span.start as usize, span.end as usize);
            if start > end || end > content.len() {
                return None;
            }
            if !content.is_char_boundary(start) || !content.is_char_boundary(end) {
                return None;
            }

            let mut updated = String::with_capacity(text.len() + new_text.len());
            updated.push_str(&text[..line_start + start]);
            updated.push_str(new_text);
            updated.push_str(&text[line_start + end..]);
            Some(updated)
        }
    }
}

/// Byte range of line `line`, terminator included.
fn line_bounds(text: &str, line: usize) -> Option<(usize, usize)> {
    let mut start = 0;
    for (idx, chunk) in text.split_inclusive('\n').enumerate() {
        if idx == line {
            return Some((start, start + chunk.len()));
        }
        start += chunk.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[test]
    fn delete_line_removes_the_terminator() {
        let text = "\"a\": \"1\",\n\"b\": \"2\",\n\"c\": \"3\"\n";
        let edit = TextEdit::DeleteLine { line: 1 };
        assert_eq!(
            apply_to_text(text, &edit).unwrap(),
            "\"a\": \"1\",\n\"c\": \"3\"\n"
        );
    }

    #[test]
    fn delete_last_line_without_terminator() {
        let text = "\"a\": \"1\",\n\"b\": \"2\"";
        let edit = TextEdit::DeleteLine { line: 1 };
        assert_eq!(apply_to_text(text, &edit).unwrap(), "\"a\": \"1\",\n");
    }

    #[test]
    fn delete_line_handles_crlf() {
        let text = "\"a\": \"1\",\r\n\"b\": \"2\",\r\n";
        let edit = TextEdit::DeleteLine { line: 0 };
        assert_eq!(apply_to_text(text, &edit).unwrap(), "\"b\": \"2\",\r\n");
    }

    #[test]
    fn replace_edits_only_the_key_span() {
        // key "b" sits at bytes 1..2 of line 1
        let text = "\"a\": \"1\",\n\"b\": \"2\",\n";
        let edit = TextEdit::Replace {
            span: LineSpan::new(1, 1, 2),
            new_text: "b_new".to_string(),
        };
        assert_eq!(
            apply_to_text(text, &edit).unwrap(),
            "\"a\": \"1\",\n\"b_new\": \"2\",\n"
        );
    }

    #[test]
    fn replace_with_empty_deletes_the_key() {
        let text = "\"greeting\": \"Hello\"\n";
        let edit = TextEdit::Replace {
            span: LineSpan::new(0, 1, 9),
            new_text: String::new(),
        };
        assert_eq!(apply_to_text(text, &edit).unwrap(), "\"\": \"Hello\"\n");
    }

    #[test]
    fn out_of_bounds_edits_are_rejected() {
        let text = "\"a\": \"1\"\n";
        assert!(apply_to_text(text, &TextEdit::DeleteLine { line: 5 }).is_none());
        let edit = TextEdit::Replace {
            span: LineSpan::new(0, 4, 200),
            new_text: "x".to_string(),
        };
        assert!(apply_to_text(text, &edit).is_none());
    }

    #[test]
    fn duplicate_key_diagnostics_get_three_fixes() {
        let diagnostic = Diagnostic::duplicate_key("title", LineSpan::new(2, 1, 6));
        let actions = actions_for_diagnostic(&diagnostic);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0].kind, FixKind::DeleteLine);
        assert_eq!(actions[1].kind, FixKind::DeleteKey);
        assert_eq!(actions[2].kind, FixKind::RenameKey);
        assert!(actions[2].title.contains("title_new"));
        assert!(actions.iter().all(|a| a.key == "title"));
    }

    #[test]
    fn value_warnings_get_no_fixes() {
        let diagnostic = Diagnostic {
            range: LineSpan::full_line(3, 20),
            severity: Severity::Warning,
            message: "duplicate text".to_string(),
            code: None,
            key: None,
            related: Vec::new(),
        };
        assert!(actions_for_diagnostic(&diagnostic).is_empty());
    }
}
