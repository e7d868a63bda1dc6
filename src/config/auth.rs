use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Authentication configuration.
///
/// Sign-in happens at an identity provider in front of this service. The
/// provider's proxy forwards the authenticated user's id in a header; the
/// service only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Header carrying the authenticated user's id (a UUID).
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity_header.trim().is_empty() {
            return Err(ConfigError::Validation(
                "auth.identity_header cannot be empty".into(),
            ));
        }
        if http::HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::Validation(format!(
                "auth.identity_header '{}' is not a valid header name",
                self.identity_header
            )));
        }
        Ok(())
    }
}

fn default_identity_header() -> String {
    "X-User-Id".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_identity_header() {
        let config: AuthConfig = toml::from_str("").unwrap();
        assert_eq!(config.identity_header, "X-User-Id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_identity_header() {
        let config = AuthConfig {
            identity_header: "bad header".to_string(),
        };
        assert!(config.validate().is_err());

        let config = AuthConfig {
            identity_header: "  ".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
