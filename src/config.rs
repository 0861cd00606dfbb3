use anyhow::{Context, bail};
use serde::Deserialize;
use std::fmt;

use crate::cors::DEFAULT_ALLOWED_ORIGINS;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";

const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-pro";

/// Server-held secret. Never printed, never serialized back out.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub allowed_origins: Vec<String>,
    pub identity: IdentitySettings,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Full URL of the `accounts:lookup` endpoint.
    pub endpoint: String,
    pub api_key: ApiKey,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_base: String,
    pub api_key: ApiKey,
    /// Used when a request does not name a model.
    pub default_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            identity: IdentitySettings::default(),
            gemini: GeminiSettings::default(),
        }
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
            api_key: ApiKey::default(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: ApiKey::default(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path))?;
        Ok(config)
    }

    /// Reads the optional config file, layers the secret environment
    /// variables on top and checks that both upstream keys are present.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(GEMINI_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.gemini.api_key = ApiKey::new(key);
        }
        if let Some(key) = lookup(FIREBASE_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.identity.api_key = ApiKey::new(key);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gemini.api_key.is_empty() {
            bail!("Gemini API key is not configured (set {} or gemini.api_key)", GEMINI_API_KEY_ENV);
        }
        if self.identity.api_key.is_empty() {
            bail!("identity API key is not configured (set {} or identity.api_key)", FIREBASE_API_KEY_ENV);
        }
        if self.gemini.default_model.trim().is_empty() {
            bail!("gemini.default_model must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_is_sparse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gemini:\n  api_key: from-file").unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.gemini.api_key.expose(), "from-file");
        assert_eq!(config.gemini.default_model, "gemini-pro");
        assert_eq!(config.gemini.api_base, DEFAULT_GEMINI_API_BASE);
        assert_eq!(config.identity.endpoint, DEFAULT_IDENTITY_ENDPOINT);
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "http://localhost:4173", "https://promptbox.app"]
        );
    }

    #[test]
    fn test_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
allowed_origins:
  - https://example.test
identity:
  endpoint: http://127.0.0.1:9099/v1/accounts:lookup
  api_key: id-key
gemini:
  api_base: http://127.0.0.1:9100/v1beta
  api_key: gem-key
  default_model: gemini-1.5-flash
"#
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.allowed_origins, vec!["https://example.test"]);
        assert_eq!(config.identity.api_key.expose(), "id-key");
        assert_eq!(config.gemini.default_model, "gemini-1.5-flash");
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides_file_keys() {
        let mut config = Config::default();
        config.gemini.api_key = ApiKey::new("file-gemini");
        let env: HashMap<&str, &str> = HashMap::from([
            (GEMINI_API_KEY_ENV, "env-gemini"),
            (FIREBASE_API_KEY_ENV, "env-firebase"),
        ]);

        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.gemini.api_key.expose(), "env-gemini");
        assert_eq!(config.identity.api_key.expose(), "env-firebase");
    }

    #[test]
    fn test_blank_env_value_is_ignored() {
        let mut config = Config::default();
        config.gemini.api_key = ApiKey::new("file-gemini");

        config.apply_env_overrides(|_| Some("  ".to_string()));

        assert_eq!(config.gemini.api_key.expose(), "file-gemini");
    }

    #[test]
    fn test_validate_requires_both_keys() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.gemini.api_key = ApiKey::new("g");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(FIREBASE_API_KEY_ENV));

        config.identity.api_key = ApiKey::new("f");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::from_file("/definitely/not/here.yaml").is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let mut config = Config::default();
        config.gemini.api_key = ApiKey::new("super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
