//! Server configuration types.
//!
//! `finquest-server` reads `finquest.toml` into [`ServerConfig`] and then lets
//! environment variables override individual fields. The advisor crate reads
//! the `[llm]` section to build its gateway client.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "finquest.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Top-level server configuration (persisted as `finquest.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            data_dir: default_data_dir(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    /// Shared HS256 secret of the auth provider. Empty disables authentication,
    /// which makes every protected route answer 401.
    #[serde(default)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Any OpenAI-compatible chat completions gateway.
    #[default]
    Openai,
    Anthropic,
    Gemini,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::Openai),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "gemini" | "google" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Openai => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Openai => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5-20250929",
            Self::Gemini => "gemini-2.0-flash",
        }
    }

    /// Provider-specific env var consulted when `FINQUEST_LLM_API_KEY` is unset.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Openai => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Overrides the provider's public endpoint (gateways, proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            model: None,
            api_key: None,
            timeout_secs: default_llm_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(self.provider.default_model())
    }

    /// Advisors are available only with an API key.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_port() -> u16 {
    3000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_max_tokens() -> u32 {
    2048
}

impl ServerConfig {
    /// Parse a config file. A missing file is an error; use [`Self::default`]
    /// when no file was requested.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` when given, then apply process env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style lookups. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = get("FINQUEST_DATA_DIR") {
            self.server.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = get("BASE_URL") {
            self.server.base_url = url;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(provider) = get("FINQUEST_LLM_PROVIDER") {
            self.llm.provider =
                LlmProvider::parse(&provider).ok_or_else(|| ConfigError::InvalidValue {
                    key: "FINQUEST_LLM_PROVIDER",
                    value: provider.clone(),
                })?;
        }
        if let Some(url) = get("FINQUEST_LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = get("FINQUEST_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(key) = get("FINQUEST_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        } else if !self.llm.is_configured() {
            self.llm.api_key = get(self.llm.provider.api_key_env());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_stable() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.llm.provider, LlmProvider::Openai);
        assert_eq!(cfg.llm.timeout_secs, 60);
        assert_eq!(cfg.llm.base_url(), "https://api.openai.com/v1");
        assert!(!cfg.llm.is_configured());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: ServerConfig = toml::from_str(
            r#"
[server]
port = 8080

[llm]
provider = "anthropic"
model = "claude-test"
"#,
        )
        .expect("parse toml");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.base_url, "http://localhost:3000");
        assert_eq!(cfg.llm.provider, LlmProvider::Anthropic);
        assert_eq!(cfg.llm.model(), "claude-test");
        assert_eq!(cfg.llm.max_tokens, 2048);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env(env(&[
            ("PORT", "4100"),
            ("JWT_SECRET", "s3cret"),
            ("FINQUEST_LLM_PROVIDER", "gemini"),
            ("FINQUEST_LLM_BASE_URL", "http://127.0.0.1:9999/"),
        ]))
        .unwrap();
        assert_eq!(cfg.server.port, 4100);
        assert_eq!(cfg.auth.jwt_secret, "s3cret");
        assert_eq!(cfg.llm.provider, LlmProvider::Gemini);
        assert_eq!(cfg.llm.base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn provider_key_is_a_fallback() {
        let mut cfg = ServerConfig::default();
        cfg.apply_env(env(&[("OPENAI_API_KEY", "sk-provider")])).unwrap();
        assert_eq!(cfg.llm.api_key.as_deref(), Some("sk-provider"));

        let mut cfg = ServerConfig::default();
        cfg.apply_env(env(&[
            ("OPENAI_API_KEY", "sk-provider"),
            ("FINQUEST_LLM_API_KEY", "sk-explicit"),
        ]))
        .unwrap();
        assert_eq!(cfg.llm.api_key.as_deref(), Some("sk-explicit"));

        let mut cfg = ServerConfig::default();
        cfg.apply_env(env(&[
            ("FINQUEST_LLM_PROVIDER", "anthropic"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]))
        .unwrap();
        assert!(cfg.llm.api_key.is_none());
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let mut cfg = ServerConfig::default();
        let err = cfg.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(cfg.apply_env(env(&[("FINQUEST_LLM_PROVIDER", "mystery")])).is_err());
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[auth]\njwt_secret = \"abc\"\n").unwrap();
        assert_eq!(ServerConfig::from_file(&path).unwrap().auth.jwt_secret, "abc");

        std::fs::write(&path, "[server\n").unwrap();
        let err = ServerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ServerConfig::from_file(&missing).unwrap_err(),
            ConfigError::Read { .. }
        ));
    }
}
