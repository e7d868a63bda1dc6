use std::fmt;

use serde::{Deserialize, Serialize};

/// Language of a collection document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    /// Resolve a request tag. `zh` (any case) selects Chinese; every other
    /// tag falls back to English.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("zh") {
            Language::Zh
        } else {
            Language::En
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            Language::Zh => "prompts_zh.md",
            Language::En => "prompts_en.md",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line prefixes that give a collection document its structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerSet {
    /// Opens a section; the rest of the line is the category.
    pub heading: String,
    /// Opens an entry; the rest of the line is the role.
    pub role: String,
    /// Label in front of the prompt text. Removed from the prompt body.
    pub prompt: String,
}

impl MarkerSet {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Zh => Self {
                heading: "### ".to_string(),
                role: "- **角色/类别**:".to_string(),
                prompt: "**提示词**:".to_string(),
            },
            Language::En => Self {
                heading: "### ".to_string(),
                role: "- **Role/Category**:".to_string(),
                prompt: "**Prompt**:".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zh("zh", Language::Zh)]
    #[case::zh_upper("ZH", Language::Zh)]
    #[case::en("en", Language::En)]
    #[case::unknown("fr", Language::En)]
    #[case::empty("", Language::En)]
    fn test_from_tag(#[case] tag: &str, #[case] expected: Language) {
        assert_eq!(Language::from_tag(tag), expected);
    }

    #[test]
    fn test_markers_differ_by_language() {
        let zh = MarkerSet::for_language(Language::Zh);
        let en = MarkerSet::for_language(Language::En);
        assert_eq!(zh.heading, en.heading);
        assert_ne!(zh.role, en.role);
        assert_ne!(zh.prompt, en.prompt);
    }
}
