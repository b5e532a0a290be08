use critic_core::{LlmConfig, LlmError};
use tracing::warn;

use crate::llm::{ChatMessage, LlmClient};
use crate::prompt;

/// Comment body posted when the completion request fails.
pub const FALLBACK_REVIEW: &str = "Unable to generate review comment.";

/// Outcome of asking the LLM for a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewText {
    /// Trimmed text of the first completion choice.
    Generated(String),
    /// The request failed; the body is [`FALLBACK_REVIEW`].
    Fallback(LlmError),
}

impl ReviewText {
    /// The text to publish.
    ///
    /// # Examples
    ///
    /// ```
    /// use critic_core::LlmError;
    /// use critic_review::reviewer::{ReviewText, FALLBACK_REVIEW};
    ///
    /// let failed = ReviewText::Fallback(LlmError::Transport("timeout".into()));
    /// assert_eq!(failed.body(), FALLBACK_REVIEW);
    /// assert_eq!(ReviewText::Generated("LGTM".into()).body(), "LGTM");
    /// ```
    pub fn body(&self) -> &str {
        match self {
            ReviewText::Generated(text) => text,
            ReviewText::Fallback(_) => FALLBACK_REVIEW,
        }
    }

    /// Whether the fallback text was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ReviewText::Fallback(_))
    }
}

/// Generates natural-language reviews of diffs.
pub struct ReviewGenerator {
    llm: LlmClient,
}

impl ReviewGenerator {
    /// Build a generator from explicit LLM settings, API key included.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            llm: LlmClient::new(config)?,
        })
    }

    /// Model used for reviews.
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Request a review of `diff`.
    ///
    /// # Errors
    ///
    /// Propagates the [`LlmError`] from the completion request.
    pub async fn generate(&self, diff: &str) -> Result<String, LlmError> {
        let messages = [
            ChatMessage::system(prompt::build_system_prompt()),
            ChatMessage::user(prompt::build_review_prompt(diff)),
        ];
        let text = self.llm.chat(&messages).await?;
        Ok(text.trim().to_string())
    }

    /// Request a review of `diff`, falling back to [`FALLBACK_REVIEW`] on failure.
    pub async fn review(&self, diff: &str) -> ReviewText {
        match self.generate(diff).await {
            Ok(text) => ReviewText::Generated(text),
            Err(e) => {
                match &e {
                    LlmError::Authentication(_) => warn!("LLM rejected credentials: {e}"),
                    LlmError::RateLimited(_) => warn!("LLM quota or rate limit hit: {e}"),
                    _ => warn!("LLM API error: {e}"),
                }
                ReviewText::Fallback(e)
            }
        }
    }
}
