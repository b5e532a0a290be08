use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The pull request a run was triggered for.
///
/// Built once by the event loader and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use critic_core::PullRequestEvent;
///
/// let event = PullRequestEvent {
///     number: 42,
///     api_url: "https://api.github.com/repos/octo/hello/pulls/42".into(),
///     head_commit_id: "6dcb09b".into(),
///     repository: "octo/hello".into(),
/// };
/// assert_eq!(event.files_url(), "https://api.github.com/repos/octo/hello/pulls/42/files");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEvent {
    /// Pull request number.
    pub number: u64,
    /// API URL of the pull request (`pull_request.url`).
    pub api_url: String,
    /// SHA of the head commit comments are attached to.
    pub head_commit_id: String,
    /// Repository identifier, `owner/name`.
    pub repository: String,
}

impl PullRequestEvent {
    /// URL of the changed-files listing endpoint.
    pub fn files_url(&self) -> String {
        format!("{}/files", self.api_url.trim_end_matches('/'))
    }
}

/// A file changed by the pull request.
///
/// `patch` is absent for binary files and for diffs too large for the API
/// to inline.
///
/// # Examples
///
/// ```
/// use critic_core::ChangedFile;
///
/// let file: ChangedFile = serde_json::from_str(r#"{"filename":"logo.png","status":"added"}"#).unwrap();
/// assert!(file.reviewable_patch().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path of the file relative to the repository root.
    pub filename: String,
    /// Unified diff fragment for this file.
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// The patch text, if present and non-empty.
    pub fn reviewable_patch(&self) -> Option<&str> {
        self.patch.as_deref().filter(|p| !p.is_empty())
    }
}

/// A generated review for one file, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// File the comment is anchored to.
    pub file_path: String,
    /// Comment text.
    pub comment_body: String,
}

/// Secrets resolved from the environment at start-up.
///
/// `Debug` never prints the values.
///
/// # Examples
///
/// ```
/// use critic_core::Credentials;
///
/// let creds = Credentials {
///     access_token: "ghs_secret".into(),
///     llm_api_key: Some("sk-secret".into()),
/// };
/// let printed = format!("{creds:?}");
/// assert!(!printed.contains("secret"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// GitHub access token.
    pub access_token: String,
    /// API key for the completion endpoint.
    pub llm_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// How reviews are posted back to the pull request.
///
/// # Examples
///
/// ```
/// use critic_core::ReviewMode;
///
/// let mode: ReviewMode = "summary".parse().unwrap();
/// assert_eq!(mode, ReviewMode::Summary);
/// assert_eq!(ReviewMode::default().to_string(), "inline");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// One review per file, posted as an inline comment on that file.
    #[default]
    Inline,
    /// One review of all patches, posted as a top-level PR comment.
    Summary,
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewMode::Inline => write!(f, "inline"),
            ReviewMode::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inline" => Ok(ReviewMode::Inline),
            "summary" => Ok(ReviewMode::Summary),
            other => Err(format!("unknown review mode: {other}")),
        }
    }
}
