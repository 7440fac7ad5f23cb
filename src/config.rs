use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration for locale-detector
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Master switch; every analysis no-ops when false
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Compare values against same-name files across the workspace
    #[serde(default)]
    pub cross_file: bool,

    /// Recognized locale base names without extension (e.g., ["en", "en-US"])
    #[serde(default = "default_file_names")]
    pub file_names: Vec<String>,

    /// Glob patterns scanned by the text query
    #[serde(default = "default_query_globs")]
    pub query_globs: Vec<String>,

    /// Exclude glob for workspace file enumeration
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// Quiescence window for selection-triggered scans, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[cfg(feature = "napi")]
use napi_derive::napi;

#[cfg(feature = "napi")]
#[napi(object)]
#[allow(non_snake_case)]
pub struct NapiConfig {
    pub enabled: Option<bool>,
    pub crossFile: Option<bool>,
    pub fileNames: Option<Vec<String>>,
    pub queryGlobs: Option<Vec<String>>,
    pub exclude: Option<String>,
    pub debounceMs: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

fn default_file_names() -> Vec<String> {
    vec!["en".to_string(), "en-US".to_string()]
}

fn default_query_globs() -> Vec<String> {
    vec![
        "**/public/templates/en.js".to_string(),
        "**/locales/**/en-US.ts".to_string(),
    ]
}

fn default_exclude() -> String {
    "**/node_modules/**".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            cross_file: false,
            file_names: default_file_names(),
            query_globs: default_query_globs(),
            exclude: default_exclude(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json_string(json_str: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(json_str).with_context(|| "Failed to parse config JSON string")?;
        Ok(config)
    }

    /// Try to load from the default config file, or return default config
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new("locale-detector.json");
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Whether a path's base name (without extension) is a recognized locale file
    pub fn is_recognized(&self, path: &Path) -> bool {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| self.file_names.iter().any(|name| name == stem))
            .unwrap_or(false)
    }

    #[cfg(feature = "napi")]
    pub fn from_napi(config: NapiConfig) -> Self {
        let defaults = Config::default();
        Config {
            enabled: config.enabled.unwrap_or(defaults.enabled),
            cross_file: config.crossFile.unwrap_or(defaults.cross_file),
            file_names: config.fileNames.unwrap_or(defaults.file_names),
            query_globs: config.queryGlobs.unwrap_or(defaults.query_globs),
            exclude: config.exclude.unwrap_or(defaults.exclude),
            debounce_ms: config
                .debounceMs
                .map(u64::from)
                .unwrap_or(defaults.debounce_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config = Config::from_json_string(r#"{ "crossFile": true }"#).unwrap();
        assert!(config.enabled);
        assert!(config.cross_file);
        assert_eq!(config.file_names, vec!["en", "en-US"]);
        assert_eq!(config.exclude, "**/node_modules/**");
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn camel_case_field_names() {
        let config = Config::from_json_string(
            r#"{ "fileNames": ["zh-CN"], "queryGlobs": ["**/zh-CN.ts"], "debounceMs": 50 }"#,
        )
        .unwrap();
        assert_eq!(config.file_names, vec!["zh-CN"]);
        assert_eq!(config.query_globs, vec!["**/zh-CN.ts"]);
        assert_eq!(config.debounce_ms, 50);
    }

    #[test]
    fn recognizes_stems_not_full_names() {
        let config = Config::default();
        assert!(config.is_recognized(Path::new("/ws/public/templates/en.js")));
        assert!(config.is_recognized(Path::new("locales/en-US.ts")));
        assert!(config.is_recognized(Path::new("en.json")));
        assert!(!config.is_recognized(Path::new("locales/fr.ts")));
        assert!(!config.is_recognized(Path::new("english.ts")));
    }
}
