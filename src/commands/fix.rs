use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::actions::{self, FixKind};
use crate::duplicates;
use crate::workspace::{FsWorkspace, Workspace};

pub fn run(file: PathBuf, line: u32, kind: &str) -> Result<()> {
    println!("=== locale-detector fix ===\n");

    let Some(kind) = FixKind::parse(kind) else {
        bail!(
            "Unknown fix kind: {}. Expected delete-line, delete-key, or rename-key",
            kind
        );
    };
    if line == 0 {
        bail!("Line numbers are 1-based");
    }
    let target = line - 1;

    let workspace = FsWorkspace::new(".");
    let document = workspace.open_document(&file)?;
    let diagnostics = duplicates::check_source(&document.text, &file);

    let Some(diagnostic) = diagnostics
        .iter()
        .find(|diagnostic| diagnostic.range.line == target)
    else {
        bail!("No duplicate key at {}:{}", file.display(), line);
    };

    let offered = actions::actions_for_diagnostic(diagnostic);
    let Some(action) = offered.iter().find(|action| action.kind == kind) else {
        bail!("No {} fix available for this diagnostic", kind.as_str());
    };

    workspace.apply_edit(&file, &action.edit)?;
    println!("Applied: {}", action.title);

    let document = workspace.open_document(&file)?;
    let remaining = duplicates::check_source(&document.text, &file);
    println!("Remaining duplicates in file: {}", remaining.len());

    Ok(())
}
