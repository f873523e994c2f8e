use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::fetch::merged_headers;

pub const ENV_PREFIX: &str = "TWITCH_SCRAPER";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_file: PathBuf,
    pub output_format: String,
    pub output_dir: PathBuf,
    pub max_streams_per_category: usize,
    pub http: HttpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/inputs.sample.json"),
            output_format: "json".to_string(),
            output_dir: PathBuf::from("data"),
            max_streams_per_category: 100,
            http: HttpSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    pub headers: BTreeMap<String, String>,
    pub base_url: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            headers: merged_headers(&BTreeMap::new()),
            base_url: "https://www.twitch.tv".to_string(),
        }
    }
}

/// Layer defaults, the JSON settings file and `TWITCH_SCRAPER_*` env vars.
///
/// A missing file is a warning and an unreadable one an error; both fall back
/// to defaults rather than aborting the run.
pub fn load_settings(path: &Path) -> Settings {
    if !path.exists() {
        warn!("Settings file not found at {}, using defaults", path.display());
    }

    let built = Config::builder()
        .add_source(File::from(path).format(FileFormat::Json).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize::<Settings>());

    match built {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings from {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

/// Read `{"categories": [...]}`, keeping trimmed non-blank strings.
pub fn load_categories(path: &Path) -> Vec<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            error!("Input file not found at {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            error!("Failed to read input file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let payload: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            error!("Failed to parse input file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let entries = match payload.get("categories") {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            error!("Invalid input format: 'categories' must be a list");
            return Vec::new();
        }
    };

    let categories: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if categories.is_empty() {
        error!("No valid categories found in input file");
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("nope.json"));
        assert_eq!(settings.max_streams_per_category, 100);
        assert_eq!(settings.output_format, "json");
        assert_eq!(settings.http.timeout_seconds, 15);
    }

    #[test]
    fn partial_http_section_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "settings.json",
            r#"{"output_format": "csv", "max_streams_per_category": 25, "http": {"timeout_seconds": 5}}"#,
        );
        let settings = load_settings(&path);
        assert_eq!(settings.output_format, "csv");
        assert_eq!(settings.max_streams_per_category, 25);
        assert_eq!(settings.http.timeout_seconds, 5);
        assert_eq!(settings.http.base_url, "https://www.twitch.tv");
        assert_eq!(settings.http.headers.len(), 2);
        assert_eq!(settings.input_file, PathBuf::from("data/inputs.sample.json"));
    }

    #[test]
    fn malformed_settings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "settings.json", "{ not json");
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn categories_filtered_and_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "inputs.json",
            r#"{"categories": ["Just Chatting", "  ", 42, " Fortnite ", null]}"#,
        );
        assert_eq!(load_categories(&path), vec!["Just Chatting", "Fortnite"]);
    }

    #[test]
    fn categories_must_be_a_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "inputs.json", r#"{"categories": "Just Chatting"}"#);
        assert!(load_categories(&path).is_empty());
    }

    #[test]
    fn categories_missing_or_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_categories(&dir.path().join("absent.json")).is_empty());
        let path = write_file(&dir, "broken.json", "[1, 2");
        assert!(load_categories(&path).is_empty());
    }
}
