//! Intake configuration
//!
//! Layered as defaults → TOML file → environment; the binary applies its own
//! flags last.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default submission endpoint
pub const DEFAULT_SUBMISSION_URL: &str =
    "https://us-central1-crm-sdk.cloudfunctions.net/flightInfoChallenge";

/// Default extraction endpoint
pub const DEFAULT_EXTRACTION_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default vision model
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o-mini";

/// Images above this size are downscaled before upload (5 MiB)
pub const DEFAULT_COMPRESS_THRESHOLD: u64 = 5 * 1024 * 1024;

/// Bounding box edge for downscaled images
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Environment variables read by [`IntakeConfig::apply_env`]
pub mod env {
    pub const SUBMISSION_URL: &str = "FLIGHT_INTAKE_URL";
    pub const TOKEN: &str = "FLIGHT_INTAKE_TOKEN";
    pub const CANDIDATE: &str = "FLIGHT_INTAKE_CANDIDATE";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const EMAIL: &str = "FLIGHT_INTAKE_EMAIL";
    pub const DATA_DIR: &str = "FLIGHT_INTAKE_DATA_DIR";
}

const REDACTED: &str = "<redacted>";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub submission: SubmissionConfig,
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub http: HttpConfig,
}

/// Remote submission endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    pub url: String,
    /// Static `token` header
    pub token: Option<String>,
    /// `candidate` header
    pub candidate: Option<String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SUBMISSION_URL.to_string(),
            token: None,
            candidate: None,
        }
    }
}

/// Vision extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub compress_threshold_bytes: u64,
    pub max_dimension: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EXTRACTION_URL.to_string(),
            api_key: None,
            model: DEFAULT_EXTRACTION_MODEL.to_string(),
            max_tokens: 100,
            compress_threshold_bytes: DEFAULT_COMPRESS_THRESHOLD,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Local history location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the history file; platform data dir when unset
    pub data_dir: Option<PathBuf>,
}

/// Signed-in user, as handed over by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Transport-level timeout; `0` disables it
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl IntakeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Overlay values from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay values from an environment lookup
    #[must_use]
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(env::SUBMISSION_URL) {
            self.submission.url = url;
        }
        if let Some(token) = get(env::TOKEN) {
            self.submission.token = Some(token);
        }
        if let Some(candidate) = get(env::CANDIDATE) {
            self.submission.candidate = Some(candidate);
        }
        if let Some(key) = get(env::OPENAI_API_KEY) {
            self.extraction.api_key = Some(key);
        }
        if let Some(email) = get(env::EMAIL) {
            self.identity.email = Some(email);
        }
        if let Some(dir) = get(env::DATA_DIR) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// With submission credentials
    #[inline]
    #[must_use]
    pub fn with_submission_auth(
        mut self,
        token: impl Into<String>,
        candidate: impl Into<String>,
    ) -> Self {
        self.submission.token = Some(token.into());
        self.submission.candidate = Some(candidate.into());
        self
    }

    /// With submission endpoint
    #[inline]
    #[must_use]
    pub fn with_submission_url(mut self, url: impl Into<String>) -> Self {
        self.submission.url = url.into();
        self
    }

    /// With extraction endpoint
    #[inline]
    #[must_use]
    pub fn with_extraction_url(mut self, url: impl Into<String>) -> Self {
        self.extraction.url = url.into();
        self
    }

    /// With extraction API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.extraction.api_key = Some(key.into());
        self
    }

    /// With signed-in email
    #[inline]
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.identity.email = Some(email.into());
        self
    }

    /// With history directory
    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(dir.into());
        self
    }

    /// Check everything a submission needs is present
    pub fn validate_for_submission(&self) -> Result<(), ConfigError> {
        require_url("submission.url", &self.submission.url)?;
        require("submission.token", self.submission.token.as_deref())?;
        require("submission.candidate", self.submission.candidate.as_deref())?;
        Ok(())
    }

    /// Check everything an extraction needs is present
    pub fn validate_for_extraction(&self) -> Result<(), ConfigError> {
        require_url("extraction.url", &self.extraction.url)?;
        require("extraction.api_key", self.extraction.api_key.as_deref())?;
        if self.extraction.max_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "extraction.max_dimension",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Copy safe to print: secrets replaced
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let mask = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some(REDACTED.to_string());
            }
        };
        mask(&mut copy.submission.token);
        mask(&mut copy.extraction.api_key);
        copy
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            key: "config",
            reason: e.to_string(),
        })
    }
}

fn require(key: &'static str, value: Option<&str>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn require_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("not an http(s) url: {url:?}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_public_endpoints() {
        let config = IntakeConfig::new();
        assert_eq!(config.submission.url, DEFAULT_SUBMISSION_URL);
        assert_eq!(config.extraction.model, "gpt-4o-mini");
        assert_eq!(config.extraction.compress_threshold_bytes, 5 * 1024 * 1024);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn parses_partial_toml() {
        let config = IntakeConfig::from_toml_str(
            r#"
            [submission]
            token = "t0k"
            candidate = "Hari"

            [identity]
            email = "crew@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.submission.token.as_deref(), Some("t0k"));
        assert_eq!(config.submission.url, DEFAULT_SUBMISSION_URL);
        assert_eq!(config.identity.email.as_deref(), Some("crew@example.com"));
        assert!(config.validate_for_submission().is_ok());
    }

    #[test]
    fn rejects_unknown_types() {
        let result = IntakeConfig::from_toml_str("[http]\ntimeout_secs = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_file() {
        let vars: HashMap<&str, &str> = [
            (env::TOKEN, "from-env"),
            (env::OPENAI_API_KEY, "sk-test"),
            (env::EMAIL, ""),
        ]
        .into_iter()
        .collect();

        let config = IntakeConfig::new()
            .with_email("file@example.com")
            .apply_env_with(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.submission.token.as_deref(), Some("from-env"));
        assert_eq!(config.extraction.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.identity.email.as_deref(), Some("file@example.com"));
    }

    #[test]
    fn submission_requires_credentials() {
        let err = IntakeConfig::new().validate_for_submission().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("submission.token")));

        let err = IntakeConfig::new()
            .with_submission_auth("t", "c")
            .with_submission_url("ftp://nope")
            .validate_for_submission()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "submission.url", .. }));
    }

    #[test]
    fn redacted_hides_secrets() {
        let config = IntakeConfig::new()
            .with_submission_auth("secret-token", "Hari")
            .with_api_key("sk-secret");
        let text = config.redacted().to_toml_string().unwrap();

        assert!(!text.contains("secret-token"));
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("Hari"));
    }
}
