use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Options for dataset and API generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Use the book's common name instead of its id in chapter paths.
    pub use_common_name: bool,
    /// Rewrite audio links to local paths and emit files that fetch them.
    pub download_audio: bool,
    /// Prepended to every output path, e.g. "/v1".
    pub path_prefix: String,
    /// Emit `/api/<translation>/complete.json`.
    pub generate_complete_translations: bool,
    pub pretty_json: bool,
    /// Parse input files with rayon.
    pub parallel: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            use_common_name: false,
            download_audio: false,
            path_prefix: String::new(),
            generate_complete_translations: false,
            pretty_json: false,
            parallel: true,
        }
    }
}

impl GenerationSettings {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Defaults, overridden by any `API_*` environment variables that are set.
    pub fn from_env() -> Self {
        let mut settings = GenerationSettings::default();
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("API_USE_COMMON_NAME").and_then(|v| parse_bool(&v)) {
            self.use_common_name = v;
        }
        if let Some(v) = var("API_DOWNLOAD_AUDIO").and_then(|v| parse_bool(&v)) {
            self.download_audio = v;
        }
        if let Some(v) = var("API_PATH_PREFIX") {
            self.path_prefix = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = var("API_COMPLETE_TRANSLATIONS").and_then(|v| parse_bool(&v)) {
            self.generate_complete_translations = v;
        }
        if let Some(v) = var("API_PRETTY_JSON").and_then(|v| parse_bool(&v)) {
            self.pretty_json = v;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = GenerationSettings::from_json_str(r#"{ "useCommonName": true, "pathPrefix": "/v1" }"#).unwrap();
        assert!(settings.use_common_name);
        assert_eq!(settings.path_prefix, "/v1");
        assert!(settings.parallel);
        assert!(!settings.download_audio);
    }

    #[test]
    fn test_apply_env() {
        let mut settings = GenerationSettings::default();
        settings.apply_env(|key| match key {
            "API_DOWNLOAD_AUDIO" => Some("yes".to_string()),
            "API_PATH_PREFIX" => Some("/v2/".to_string()),
            "API_PRETTY_JSON" => Some("maybe".to_string()),
            _ => None,
        });
        assert!(settings.download_audio);
        assert_eq!(settings.path_prefix, "/v2");
        assert!(!settings.pretty_json);
    }
}
