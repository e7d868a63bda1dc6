use std::borrow::Cow;

use validator::ValidationError;

/// Maximum length for a single tag
const MAX_TAG_LENGTH: usize = 50;

/// Maximum number of tags per prompt
const MAX_TAGS_COUNT: usize = 20;

/// Validate the tag list of a prompt.
///
/// Ensures that:
/// - No more than MAX_TAGS_COUNT tags are provided
/// - No tag is empty or whitespace-only
/// - No tag exceeds MAX_TAG_LENGTH characters
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS_COUNT {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(Cow::Owned(format!(
            "Maximum {} tags allowed",
            MAX_TAGS_COUNT
        )));
        return Err(err);
    }

    for tag in tags {
        if tag.trim().is_empty() {
            let mut err = ValidationError::new("empty_tag");
            err.message = Some(Cow::Borrowed("Tags cannot be empty or whitespace-only"));
            return Err(err);
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            let mut err = ValidationError::new("tag_too_long");
            err.message = Some(Cow::Owned(format!(
                "Tags cannot exceed {} characters",
                MAX_TAG_LENGTH
            )));
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tags_accepts_normal_tags() {
        let tags = vec!["writing".to_string(), "编辑".to_string()];
        assert!(validate_tags(&tags).is_ok());
    }

    #[test]
    fn test_validate_tags_too_many() {
        let tags: Vec<String> = (0..21).map(|i| format!("tag{i}")).collect();
        let err = validate_tags(&tags).unwrap_err();
        assert_eq!(err.code, "too_many_tags");
    }

    #[test]
    fn test_validate_tags_too_long() {
        let tags = vec!["x".repeat(51)];
        let err = validate_tags(&tags).unwrap_err();
        assert_eq!(err.code, "tag_too_long");
    }

    #[test]
    fn test_validate_tags_counts_chars_not_bytes() {
        // 50 CJK characters is 150 bytes but still within the limit
        let tags = vec!["字".repeat(50)];
        assert!(validate_tags(&tags).is_ok());
    }
}
