use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CriticError;
use crate::types::ReviewMode;

/// Top-level configuration loaded from `.critic.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// Secrets are never read from the file; see [`CriticConfig::apply_env`].
///
/// # Examples
///
/// ```
/// use critic_core::CriticConfig;
///
/// let config = CriticConfig::default();
/// assert_eq!(config.llm.max_tokens, 500);
/// assert_eq!(config.github.api_url, "https://api.github.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticConfig {
    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl CriticConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::FileNotFound`] if the file does not exist,
    /// [`CriticError::Io`] if it cannot be read, or [`CriticError::Toml`] if
    /// the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, CriticError> {
        if !path.exists() {
            return Err(CriticError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::{CriticConfig, ReviewMode};
    ///
    /// let toml = r#"
    /// [review]
    /// mode = "summary"
    /// "#;
    /// let config = CriticConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.mode, ReviewMode::Summary);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CriticError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    ///
    /// `lookup` resolves a variable name; pass `|k| std::env::var(k).ok()` in
    /// production. Empty values are ignored.
    ///
    /// Recognized variables: `OPENAI_BASE_URL`, `CRITIC_MODEL`,
    /// `GITHUB_API_URL`. The API key itself travels with the run's
    /// [`Credentials`](crate::Credentials).
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::CriticConfig;
    ///
    /// let mut config = CriticConfig::default();
    /// config.apply_env(|k| (k == "CRITIC_MODEL").then(|| "gpt-4o-mini".to_string()));
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// ```
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = get("CRITIC_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("GITHUB_API_URL") {
            self.github.api_url = url;
        }
    }
}

/// LLM provider configuration.
///
/// # Examples
///
/// ```
/// use critic_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-4");
/// assert_eq!(config.temperature, 0.3);
/// assert!(config.api_key.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider. Never read from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Upper bound on generated tokens per review.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_model() -> String {
    "gpt-4".into()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// GitHub API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root used for posting comments.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

/// Review behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Per-file inline comments, or one summary comment for the whole PR.
    #[serde(default)]
    pub mode: ReviewMode,
}
