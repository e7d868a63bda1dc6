use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::collection::{Language, MarkerSet};

/// Bundled public prompt collection.
///
/// ```toml
/// [collection]
/// directory = "data"
/// default_language = "zh"
///
/// [collection.languages.en]
/// file = "prompts_en.md"
/// role_marker = "- **Role**:"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Directory holding the collection documents.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Language served when a request does not name one.
    #[serde(default)]
    pub default_language: Language,

    /// Per-language overrides of file name and markers.
    #[serde(default)]
    pub languages: HashMap<Language, LanguageConfig>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            default_language: Language::default(),
            languages: HashMap::new(),
        }
    }
}

impl CollectionConfig {
    /// File name of the document for `language`.
    pub fn file_name(&self, language: Language) -> String {
        self.languages
            .get(&language)
            .and_then(|c| c.file.clone())
            .unwrap_or_else(|| language.default_file_name().to_string())
    }

    /// Markers for `language`: the built-in defaults with any configured
    /// override applied.
    pub fn markers(&self, language: Language) -> MarkerSet {
        let mut markers = MarkerSet::for_language(language);
        if let Some(overrides) = self.languages.get(&language) {
            if let Some(heading) = &overrides.heading_marker {
                markers.heading = heading.clone();
            }
            if let Some(role) = &overrides.role_marker {
                markers.role = role.clone();
            }
            if let Some(prompt) = &overrides.prompt_marker {
                markers.prompt = prompt.clone();
            }
        }
        markers
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (language, config) in &self.languages {
            if let Some(file) = &config.file
                && (file.is_empty() || file.contains(['/', '\\']))
            {
                return Err(ConfigError::Validation(format!(
                    "collection.languages.{language}.file must be a bare file name, got '{file}'"
                )));
            }

            let markers = [
                ("heading_marker", &config.heading_marker),
                ("role_marker", &config.role_marker),
                ("prompt_marker", &config.prompt_marker),
            ];
            for (name, value) in markers {
                if value.as_deref().is_some_and(|m| m.trim().is_empty()) {
                    return Err(ConfigError::Validation(format!(
                        "collection.languages.{language}.{name} cannot be blank"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Overrides for one collection language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageConfig {
    /// Document file name inside `collection.directory`.
    #[serde(default)]
    pub file: Option<String>,

    /// Marker that opens a category section.
    #[serde(default)]
    pub heading_marker: Option<String>,

    /// Marker that opens an entry and precedes its role.
    #[serde(default)]
    pub role_marker: Option<String>,

    /// Label in front of the prompt text, removed from the prompt body.
    #[serde(default)]
    pub prompt_marker: Option<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: CollectionConfig = toml::from_str("").unwrap();
        assert_eq!(config.directory, PathBuf::from("data"));
        assert_eq!(config.default_language, Language::Zh);
        assert_eq!(config.file_name(Language::Zh), "prompts_zh.md");
        assert_eq!(config.file_name(Language::En), "prompts_en.md");
        assert_eq!(config.markers(Language::Zh), MarkerSet::for_language(Language::Zh));
    }

    #[test]
    fn test_language_overrides() {
        let config: CollectionConfig = toml::from_str(
            r#"
            default_language = "en"

            [languages.en]
            file = "english.md"
            role_marker = "- **Role**:"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.file_name(Language::En), "english.md");

        let markers = config.markers(Language::En);
        assert_eq!(markers.role, "- **Role**:");
        assert_eq!(markers.prompt, MarkerSet::for_language(Language::En).prompt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_path_in_file_name() {
        let config: CollectionConfig = toml::from_str(
            r#"
            [languages.zh]
            file = "../secrets.md"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_marker() {
        let config: CollectionConfig = toml::from_str(
            r#"
            [languages.zh]
            prompt_marker = " "
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_language_key_rejected() {
        let result: Result<CollectionConfig, _> = toml::from_str(
            r#"
            [languages.fr]
            file = "prompts_fr.md"
            "#,
        );
        assert!(result.is_err());
    }
}
