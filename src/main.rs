use anyhow::Result;
use clap::{Parser, Subcommand};
use locale_detector::commands;
use locale_detector::config::Config;
use locale_detector::logging::{self, LogLevel};
use locale_detector::watcher::FileWatcher;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "locale-detector")]
#[command(author, version, about = "Duplicate detector for localization files", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check locale files for duplicate keys
    Check {
        /// Files or directories to check (defaults to the whole workspace)
        paths: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Exit nonzero when duplicates are found
        #[arg(long)]
        fail_on_duplicates: bool,
    },

    /// Report other locations sharing the value on a line
    Value {
        /// Locale file to inspect
        file: PathBuf,

        /// Line number (1-based)
        #[arg(short, long)]
        line: u32,

        /// Also scan same-name files across the workspace
        #[arg(long)]
        cross_file: bool,
    },

    /// Search locale values for a keyword
    Find {
        /// Keyword to look for (case-insensitive substring)
        keyword: String,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a quick fix for a duplicate key
    Fix {
        /// Locale file to fix
        file: PathBuf,

        /// Line number (1-based)
        #[arg(short, long)]
        line: u32,

        /// Fix to apply: delete-line, delete-key, or rename-key
        kind: String,
    },

    /// Watch the workspace and re-check locale files on change
    Watch {
        /// Directory to watch (defaults to the current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Create a starter configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose || cli.quiet {
        logging::set_level(LogLevel::from_flags(cli.verbose, cli.quiet));
    } else {
        logging::set_level_from_env();
    }

    // Load configuration
    let config = Config::load_or_default(cli.config.as_ref())?;

    match cli.command {
        Commands::Check {
            paths,
            json,
            fail_on_duplicates,
        } => {
            commands::check::run(&config, paths, json, fail_on_duplicates)?;
        }
        Commands::Value {
            file,
            line,
            cross_file,
        } => {
            commands::value::run(&config, file, line, cross_file)?;
        }
        Commands::Find { keyword, json } => {
            commands::find::run(&config, &keyword, json)?;
        }
        Commands::Fix { file, line, kind } => {
            commands::fix::run(file, line, &kind)?;
        }
        Commands::Watch { root } => {
            println!("=== locale-detector watch ===\n");
            let root = root.unwrap_or_else(|| PathBuf::from("."));
            let mut watcher = FileWatcher::new(config, root);
            watcher.run()?;
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
    }

    Ok(())
}
