use anyhow::Result;

use crate::config::Config;
use crate::debounce::CancelToken;
use crate::document::DocumentCache;
use crate::query;
use crate::workspace::FsWorkspace;

pub fn run(config: &Config, keyword: &str, json: bool) -> Result<()> {
    if !json {
        println!("=== locale-detector find ===\n");
        println!("Searching for \"{}\"...\n", keyword);
    }

    let workspace = FsWorkspace::new(".");
    let mut cache = DocumentCache::new();
    let token = CancelToken::new();

    let matches = query::collect_matches(&workspace, &mut cache, config, keyword, &token)?
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::json!({ "matches": matches }));
        return Ok(());
    }

    if matches.is_empty() {
        println!("No text containing \"{}\" was found", keyword);
        return Ok(());
    }

    println!("Found {} match(es):", matches.len());
    println!("{}", "-".repeat(60));
    for found in &matches {
        println!(
            "  {} = \"{}\"  ({})",
            found.key,
            found.value,
            found.file.display()
        );
    }

    Ok(())
}
