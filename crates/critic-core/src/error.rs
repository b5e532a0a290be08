use std::path::PathBuf;

/// Errors that can occur while running a review.
///
/// The two `Missing*` variants are the configuration failures that end a run
/// before any network call. [`CriticError::GitHub`] carries a non-success
/// response from the source-hosting API.
///
/// # Examples
///
/// ```
/// use critic_core::CriticError;
///
/// let err = CriticError::MissingEventData("GITHUB_EVENT_PATH is not set".into());
/// assert!(err.to_string().contains("GITHUB_EVENT_PATH"));
/// assert!(err.is_configuration());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CriticError {
    /// The trigger payload is absent, unreadable, or has no `pull_request`.
    #[error("missing event data: {0}")]
    #[diagnostic(code(critic::missing_event_data))]
    MissingEventData(String),

    /// A required identifier or token could not be resolved.
    #[error("missing credentials: {0}")]
    #[diagnostic(
        code(critic::missing_credentials),
        help("set GITHUB_REPOSITORY and GITHUB_TOKEN in the job environment")
    )]
    MissingCredentials(String),

    /// Invalid configuration file or value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-success response from the GitHub API.
    #[error("GitHub API error {status}: {body}")]
    GitHub {
        /// HTTP status code returned by the API.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Network failure talking to the GitHub API.
    #[error("GitHub request failed: {0}")]
    Transport(String),

    /// LLM completion failure.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl CriticError {
    /// Whether this error is one of the configuration failures that end a
    /// run before it starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CriticError::MissingEventData(_)
                | CriticError::MissingCredentials(_)
                | CriticError::Config(_)
                | CriticError::FileNotFound(_)
        )
    }
}

/// Failure of a chat-completion request.
///
/// Every variant is currently downgraded to the same fallback review text,
/// but callers can tell them apart.
///
/// # Examples
///
/// ```
/// use critic_core::LlmError;
///
/// let err = LlmError::RateLimited("insufficient_quota".into());
/// assert!(err.to_string().contains("rate limited"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum LlmError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("LLM transport error: {0}")]
    Transport(String),

    /// Missing, invalid, or unauthorized API key.
    #[error("LLM authentication failed: {0}")]
    Authentication(String),

    /// Rate limit or exhausted quota.
    #[error("LLM rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success status.
    #[error("LLM API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The response could not be decoded or carried no completion.
    #[error("unexpected LLM response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Classify a non-success HTTP status from the completion endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::LlmError;
    ///
    /// assert!(matches!(LlmError::from_status(401, String::new()), LlmError::Authentication(_)));
    /// assert!(matches!(LlmError::from_status(429, String::new()), LlmError::RateLimited(_)));
    /// assert!(matches!(LlmError::from_status(500, String::new()), LlmError::Api { status: 500, .. }));
    /// ```
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => LlmError::Authentication(body),
            429 => LlmError::RateLimited(body),
            _ => LlmError::Api { status, body },
        }
    }
}
