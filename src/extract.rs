use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{
    AssignOp, AssignTarget, Expr, Lit, Module, ModuleDecl, ModuleItem, ObjectLit, Prop, PropName,
    PropOrSpread, SimpleAssignTarget, Stmt, Str,
};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::diagnostics::LineSpan;
use crate::logging;

/// One key/value literal pair extracted from a document. The range points at
/// the key token (quotes excluded), with a zero-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub key: String,
    pub value: String,
    pub range: LineSpan,
}

/// Extraction failure surfaced to callers that can log it and move on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Parse error in {}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
}

/// How entries are pulled out of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// One quoted `key: value` pair per line, any file kind.
    LineRegex,
    /// Top-level object literal of an assignment or default export.
    Structural,
}

const STRUCTURAL_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

impl ExtractionStrategy {
    /// Pick the strategy for a path by its extension.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if STRUCTURAL_EXTENSIONS.contains(&ext) => Self::Structural,
            _ => Self::LineRegex,
        }
    }

    /// Extract every entry from `text`. The line strategy cannot fail; the
    /// structural strategy reports syntax errors.
    pub fn extract(self, text: &str, path: &Path) -> Result<Vec<SourceEntry>, ExtractError> {
        match self {
            Self::LineRegex => Ok(extract_lines(text)),
            Self::Structural => extract_structural(text, path),
        }
    }
}

/// Extract with the path's strategy, logging and swallowing parse failures.
/// Callers always get a usable (possibly empty) entry list.
pub fn entries_or_empty(text: &str, path: &Path) -> Vec<SourceEntry> {
    match ExtractionStrategy::for_path(path).extract(text, path) {
        Ok(entries) => entries,
        Err(err) => {
            logging::warn(&err.to_string());
            Vec::new()
        }
    }
}

/// First entry on `line`, in document order.
pub fn entry_at_line(entries: &[SourceEntry], line: u32) -> Option<&SourceEntry> {
    entries.iter().find(|entry| entry.range.line == line)
}

/// Case-fold a value for comparison: NFC normalization plus lowercasing.
pub fn fold_value(value: &str) -> String {
    value.nfc().collect::<String>().to_lowercase()
}

fn pair_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"["'](.*?)["']\s*:\s*["'](.*?)["']"#).expect("pair pattern must compile")
    })
}

/// Line strategy: match the first quoted `key: value` pair of each line,
/// after removing thousand-separator commas.
fn extract_lines(text: &str) -> Vec<SourceEntry> {
    let mut entries = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let (stripped, offsets) = strip_commas(line);
        let Some(caps) = pair_pattern().captures(&stripped) else {
            continue;
        };
        let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (start, end) = original_span(&offsets, key.start(), key.end());
        entries.push(SourceEntry {
            key: key.as_str().to_string(),
            value: value.as_str().to_string(),
            range: LineSpan::new(line_idx as u32, start, end),
        });
    }
    entries
}

/// Remove every comma, recording for each remaining byte its offset in the
/// original line.
fn strip_commas(line: &str) -> (String, Vec<usize>) {
    let mut stripped = String::with_capacity(line.len());
    let mut offsets = Vec::with_capacity(line.len());
    for (idx, ch) in line.char_indices() {
        if ch == ',' {
            continue;
        }
        for byte in 0..ch.len_utf8() {
            offsets.push(idx + byte);
        }
        stripped.push(ch);
    }
    (stripped, offsets)
}

/// Map a byte span in the comma-stripped line back to the original line.
fn original_span(offsets: &[usize], start: usize, end: usize) -> (u32, u32) {
    let original_start = offsets.get(start).copied().unwrap_or(0);
    let original_end = if end > start {
        offsets.get(end - 1).copied().unwrap_or(original_start) + 1
    } else {
        original_start
    };
    (original_start as u32, original_end as u32)
}

/// Structural strategy: parse the document and walk the top-level properties
/// of its locale table, when it has one.
fn extract_structural(text: &str, path: &Path) -> Result<Vec<SourceEntry>, ExtractError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Real(path.to_path_buf()).into(), text.to_string());

    let is_tsx = path
        .extension()
        .map(|ext| ext == "tsx" || ext == "jsx")
        .unwrap_or(false);

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: is_tsx,
        decorators: true,
        ..Default::default()
    });

    let lexer = Lexer::new(syntax, Default::default(), StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    let module = match parser.parse_module() {
        Ok(module) => module,
        Err(err) => {
            let loc = cm.lookup_char_pos(err.span().lo);
            return Err(ExtractError::Parse {
                path: path.to_path_buf(),
                line: loc.line,
                column: loc.col_display + 1,
                message: format!("{:?}", err.kind()),
            });
        }
    };

    let Some(table) = top_level_table(&module) else {
        return Ok(Vec::new());
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();
    for prop in &table.props {
        let PropOrSpread::Prop(prop) = prop else {
            continue;
        };
        let Prop::KeyValue(kv) = prop.as_ref() else {
            continue;
        };
        let Some((key, span, quoted)) = literal_key(&kv.key) else {
            continue;
        };
        let value = literal_value(kv.value.as_ref());
        let range = key_range(&cm, &lines, span, quoted);
        entries.push(SourceEntry { key, value, range });
    }
    Ok(entries)
}

/// The object literal holding the locale table, if the module has one:
/// `<expr>.<prop> = {...}` as the first statement, or `export default {...}`
/// anywhere at the top level.
fn top_level_table(module: &Module) -> Option<&ObjectLit> {
    if let Some(ModuleItem::Stmt(Stmt::Expr(stmt))) = module.body.first() {
        if let Expr::Assign(assign) = stmt.expr.as_ref() {
            if assign.op == AssignOp::Assign
                && matches!(assign.left, AssignTarget::Simple(SimpleAssignTarget::Member(_)))
            {
                if let Expr::Object(object) = assign.right.as_ref() {
                    return Some(object);
                }
            }
        }
    }

    module.body.iter().find_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
            match export.expr.as_ref() {
                Expr::Object(object) => Some(object),
                _ => None,
            }
        }
        _ => None,
    })
}

/// Key name and span for literal property names; computed keys are skipped.
fn literal_key(name: &PropName) -> Option<(String, Span, bool)> {
    match name {
        PropName::Ident(ident) => Some((ident.sym.to_string(), ident.span, false)),
        PropName::Str(s) => Some((str_value(s), s.span, true)),
        PropName::Num(num) => Some((num.value.to_string(), num.span, false)),
        _ => None,
    }
}

/// String or number literal values compare by content; anything else yields
/// an empty value, which never participates in value matching.
fn literal_value(expr: &Expr) -> String {
    match expr {
        Expr::Lit(Lit::Str(s)) => str_value(s),
        Expr::Lit(Lit::Num(num)) => num.value.to_string(),
        _ => String::new(),
    }
}

fn str_value(s: &Str) -> String {
    s.value.as_str().map(|value| value.to_string()).unwrap_or_default()
}

/// Convert a key token's span to a zero-based line plus byte columns within
/// that line, trimming the quotes of string-literal keys.
fn key_range(cm: &SourceMap, lines: &[&str], span: Span, quoted: bool) -> LineSpan {
    let loc = cm.lookup_char_pos(span.lo);
    let line_idx = loc.line.saturating_sub(1);
    let line = lines.get(line_idx).copied().unwrap_or("");

    let start = byte_offset_of_char(line, loc.col.0);
    let token_len = (span.hi.0 - span.lo.0) as usize;
    let end = (start + token_len).min(line.len());

    let (start, end) = if quoted && end - start >= 2 {
        (start + 1, end - 1)
    } else {
        (start, end)
    };
    LineSpan::new(line_idx as u32, start as u32, end as u32)
}

fn byte_offset_of_char(line: &str, char_offset: usize) -> usize {
    line.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}
