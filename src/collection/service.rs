use std::path::PathBuf;

use super::{CollectionError, Language, MarkerSet, ParseReport, parse_document};
use crate::config::CollectionConfig;

/// Reads and parses the bundled collection documents.
///
/// Documents are read fresh on every call so an edited file is picked up
/// without a restart.
#[derive(Debug, Clone)]
pub struct CollectionService {
    config: CollectionConfig,
}

impl CollectionService {
    pub fn new(config: CollectionConfig) -> Self {
        Self { config }
    }

    pub fn default_language(&self) -> Language {
        self.config.default_language
    }

    /// Location of the document for `language`.
    pub fn document_path(&self, language: Language) -> PathBuf {
        self.config
            .directory
            .join(self.config.file_name(language))
    }

    pub fn markers(&self, language: Language) -> MarkerSet {
        self.config.markers(language)
    }

    /// Load and parse the document for `language`.
    pub async fn load(&self, language: Language) -> Result<ParseReport, CollectionError> {
        let path = self.document_path(language);

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CollectionError::from_io(e, &path))?;
        let source = String::from_utf8(bytes)
            .map_err(|e| CollectionError::InvalidUtf8(path.clone(), e.utf8_error()))?;

        let report = parse_document(&source, &self.markers(language));

        for warning in &report.warnings {
            tracing::warn!(
                path = %path.display(),
                language = %language,
                %warning,
                "Collection document parsed with warnings"
            );
        }
        tracing::debug!(
            path = %path.display(),
            entries = report.entries.len(),
            "Loaded prompt collection"
        );

        Ok(report)
    }
}
