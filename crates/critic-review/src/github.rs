use critic_core::{ChangedFile, CriticError, ReviewResult};
use tracing::{debug, info, warn};

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";

/// Line every inline comment is anchored to.
pub const COMMENT_LINE: u32 = 1;

/// GitHub REST client for listing PR changes and posting review comments.
///
/// Listing and diff calls take the pull request's API URL straight from the
/// event payload; comment calls are built from the configured API root.
///
/// # Examples
///
/// ```
/// use critic_review::github::GitHubClient;
///
/// let client = GitHubClient::new("ghs_xxxx", "https://api.github.com/").unwrap();
/// assert_eq!(client.api_url(), "https://api.github.com");
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
}

impl GitHubClient {
    /// Create a client authenticating with `token` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::Transport`] if the HTTP client cannot be built.
    pub fn new(token: &str, api_url: &str) -> Result<Self, CriticError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("critic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CriticError::Transport(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            http,
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// The API root comments are posted to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// List the files changed by a pull request, in the order GitHub returns them.
    ///
    /// Never fails: a non-success status or transport error is logged and
    /// treated as "no changed files".
    pub async fn list_changed_files(&self, pr_url: &str) -> Vec<ChangedFile> {
        match self.try_list_changed_files(pr_url).await {
            Ok(files) => files,
            Err(e) => {
                warn!("error fetching changed files: {e}");
                Vec::new()
            }
        }
    }

    /// Like [`list_changed_files`](Self::list_changed_files), but surfaces the failure.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::GitHub`] on a non-success status,
    /// [`CriticError::Transport`] on network errors, or
    /// [`CriticError::Serialization`] if the body is not a file list.
    pub async fn try_list_changed_files(
        &self,
        pr_url: &str,
    ) -> Result<Vec<ChangedFile>, CriticError> {
        let url = format!("{}/files", pr_url.trim_end_matches('/'));
        debug!(%url, "listing changed files");

        let response = self
            .http
            .get(&url)
            .header("Accept", JSON_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CriticError::Transport(format!("failed to list changed files: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CriticError::Transport(format!("failed to read file list: {e}")))?;
        if !status.is_success() {
            return Err(CriticError::GitHub {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the raw unified diff of the whole pull request.
    ///
    /// The result is not narrowed to a single file. On any failure the error
    /// is logged and an empty string is returned.
    pub async fn fetch_pr_diff(&self, pr_url: &str) -> String {
        match self.try_fetch_pr_diff(pr_url).await {
            Ok(diff) => diff,
            Err(e) => {
                warn!("error fetching PR diff: {e}");
                String::new()
            }
        }
    }

    async fn try_fetch_pr_diff(&self, pr_url: &str) -> Result<String, CriticError> {
        let response = self
            .http
            .get(pr_url)
            .header("Accept", DIFF_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| CriticError::Transport(format!("failed to fetch PR diff: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CriticError::Transport(format!("failed to read diff response: {e}")))?;
        if !status.is_success() {
            return Err(CriticError::GitHub {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Post `review` as an inline comment on line 1 of the file's new side.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::GitHub`] for any status other than 201 Created,
    /// or [`CriticError::Transport`] on network errors.
    pub async fn post_review_comment(
        &self,
        repository: &str,
        pr_number: u64,
        commit_id: &str,
        review: &ReviewResult,
    ) -> Result<(), CriticError> {
        let url = format!("{}/repos/{repository}/pulls/{pr_number}/comments", self.api_url);
        let payload = serde_json::json!({
            "body": review.comment_body,
            "commit_id": commit_id,
            "path": review.file_path,
            "line": COMMENT_LINE,
            "side": "RIGHT",
        });

        self.post_created(&url, &payload).await?;
        info!(file = %review.file_path, "comment posted");
        Ok(())
    }

    /// Post `body` as a top-level comment on the pull request conversation.
    ///
    /// # Errors
    ///
    /// Returns [`CriticError::GitHub`] for any status other than 201 Created,
    /// or [`CriticError::Transport`] on network errors.
    pub async fn post_summary_comment(
        &self,
        repository: &str,
        pr_number: u64,
        body: &str,
    ) -> Result<(), CriticError> {
        let url = format!("{}/repos/{repository}/issues/{pr_number}/comments", self.api_url);
        let payload = serde_json::json!({ "body": body });

        self.post_created(&url, &payload).await?;
        info!(pr = pr_number, "summary comment posted");
        Ok(())
    }

    async fn post_created(&self, url: &str, payload: &serde_json::Value) -> Result<(), CriticError> {
        debug!(%url, "posting comment");
        let response = self
            .http
            .post(url)
            .header("Accept", JSON_MEDIA_TYPE)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await
            .map_err(|e| CriticError::Transport(format!("failed to post comment: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(CriticError::GitHub {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
