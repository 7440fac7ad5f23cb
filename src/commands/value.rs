use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::document::DocumentCache;
use crate::value_scan::{self, ValueScanOptions};
use crate::workspace::FsWorkspace;

pub fn run(config: &Config, file: PathBuf, line: u32, cross_file: bool) -> Result<()> {
    println!("=== locale-detector value ===\n");

    if line == 0 {
        bail!("Line numbers are 1-based");
    }
    let target = line - 1;

    let workspace = FsWorkspace::new(".");
    let mut cache = DocumentCache::new();
    let options = ValueScanOptions {
        cross_file: cross_file || config.cross_file,
        exclude: config.exclude.clone(),
    };

    println!("Scanning {}:{}...", file.display(), line);

    match value_scan::scan_line(&workspace, &mut cache, &file, target, &options)? {
        Some(diagnostic) => {
            println!("\n{}", diagnostic.message);
            println!("{}", "-".repeat(60));
            for location in &diagnostic.related {
                println!(
                    "  {}:{}  {}",
                    location.file.display(),
                    location.line + 1,
                    location.line_text.trim()
                );
            }
        }
        None => println!("\nNo matching values found."),
    }

    Ok(())
}
