use anyhow::{bail, Result};
use std::path::Path;

pub fn run(force: bool) -> Result<()> {
    println!("=== locale-detector init ===\n");

    let config_path = Path::new("locale-detector.json");

    // Check if config already exists
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = serde_json::json!({
        "enabled": true,
        "crossFile": false,
        "fileNames": ["en", "en-US"],
        "queryGlobs": ["**/public/templates/en.js", "**/locales/**/en-US.ts"],
        "exclude": "**/node_modules/**",
        "debounceMs": 200
    });

    let config_str = serde_json::to_string_pretty(&config)?;
    std::fs::write(config_path, format!("{}\n", config_str))?;

    println!("Created configuration file: {}\n", config_path.display());
    println!("Configuration:");
    println!("  File names: [\"en\", \"en-US\"]");
    println!("  Query globs: [\"**/public/templates/en.js\", \"**/locales/**/en-US.ts\"]");
    println!("  Exclude: **/node_modules/**");
    println!("  Debounce: 200ms");

    println!("\nNext steps:");
    println!("  1. Run 'locale-detector check' to scan for duplicate keys");
    println!("  2. Run 'locale-detector watch' for continuous checking");
    println!("  3. Run 'locale-detector find <keyword>' to search locale values");

    println!("\nDone!");
    Ok(())
}
