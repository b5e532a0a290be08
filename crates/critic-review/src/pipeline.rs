use std::fmt;
use std::path::PathBuf;

use critic_core::{
    ChangedFile, CriticConfig, CriticError, Credentials, PullRequestEvent, ReviewMode,
    ReviewResult,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::event::load_event;
use crate::github::GitHubClient;
use crate::prompt;
use crate::reviewer::{ReviewGenerator, ReviewText};

/// Counters describing one run.
///
/// # Examples
///
/// ```
/// use critic_review::pipeline::RunStats;
///
/// let stats = RunStats {
///     files_listed: 3,
///     files_skipped: 1,
///     reviews_generated: 2,
///     fallbacks: 0,
///     comments_posted: 2,
///     comments_failed: 0,
/// };
/// assert_eq!(
///     stats.to_string(),
///     "files: 3 listed, 1 skipped | reviews: 2 (0 fallback) | comments: 2 posted, 0 failed"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Files returned by the listing endpoint.
    pub files_listed: usize,
    /// Files skipped because they carried no patch text.
    pub files_skipped: usize,
    /// Completion requests made.
    pub reviews_generated: usize,
    /// Reviews that fell back to the fixed failure text.
    pub fallbacks: usize,
    /// Comments GitHub accepted.
    pub comments_posted: usize,
    /// Comment posts that failed.
    pub comments_failed: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "files: {} listed, {} skipped | reviews: {} ({} fallback) | comments: {} posted, {} failed",
            self.files_listed,
            self.files_skipped,
            self.reviews_generated,
            self.fallbacks,
            self.comments_posted,
            self.comments_failed,
        )
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Run counters.
    pub stats: RunStats,
    /// Per-file reviews, in listing order (inline mode).
    pub reviews: Vec<ReviewResult>,
    /// The whole-PR review (summary mode).
    pub summary: Option<String>,
}

/// Sequential list → review → publish driver for one pull request.
pub struct ReviewPipeline {
    github: GitHubClient,
    reviewer: ReviewGenerator,
    mode: ReviewMode,
    dry_run: bool,
}

impl ReviewPipeline {
    /// Create a pipeline posting inline comments.
    pub fn new(github: GitHubClient, reviewer: ReviewGenerator) -> Self {
        Self {
            github,
            reviewer,
            mode: ReviewMode::Inline,
            dry_run: false,
        }
    }

    /// Build the GitHub and LLM clients from configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn from_config(config: &CriticConfig, credentials: &Credentials) -> Result<Self, CriticError> {
        let github = GitHubClient::new(&credentials.access_token, &config.github.api_url)?;
        let mut llm = config.llm.clone();
        llm.api_key = credentials.llm_api_key.clone();
        let reviewer = ReviewGenerator::new(&llm)?;
        Ok(Self::new(github, reviewer).with_mode(config.review.mode))
    }

    /// Select inline or summary posting.
    pub fn with_mode(mut self, mode: ReviewMode) -> Self {
        self.mode = mode;
        self
    }

    /// Generate reviews without posting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Review every changed file of `event`.
    ///
    /// Failures after the event is loaded are logged and never abort the run.
    pub async fn run(&self, event: &PullRequestEvent) -> RunReport {
        let mut report = RunReport::default();

        let files = self.github.list_changed_files(&event.api_url).await;
        report.stats.files_listed = files.len();
        if files.is_empty() {
            info!("no changed files detected");
            return report;
        }

        info!(
            files = files.len(),
            mode = %self.mode,
            model = self.reviewer.model(),
            "reviewing pull request #{}",
            event.number
        );
        match self.mode {
            ReviewMode::Inline => self.review_inline(event, &files, &mut report).await,
            ReviewMode::Summary => self.review_summary(event, &files, &mut report).await,
        }
        report
    }

    async fn review_inline(
        &self,
        event: &PullRequestEvent,
        files: &[ChangedFile],
        report: &mut RunReport,
    ) {
        for file in files {
            let Some(patch) = file.reviewable_patch() else {
                skip(file, &mut report.stats);
                continue;
            };

            info!(file = %file.filename, "reviewing");
            let text = self.review(patch, &mut report.stats).await;
            let review = ReviewResult {
                file_path: file.filename.clone(),
                comment_body: text.body().to_string(),
            };

            if !self.dry_run {
                let posted = self
                    .github
                    .post_review_comment(&event.repository, event.number, &event.head_commit_id, &review)
                    .await;
                record_post(posted, &file.filename, &mut report.stats);
            }
            report.reviews.push(review);
        }
    }

    async fn review_summary(
        &self,
        event: &PullRequestEvent,
        files: &[ChangedFile],
        report: &mut RunReport,
    ) {
        for file in files.iter().filter(|f| f.reviewable_patch().is_none()) {
            skip(file, &mut report.stats);
        }

        let diff = prompt::build_summary_diff(files);
        if diff.trim().is_empty() {
            info!("no patch content available to review");
            return;
        }

        let text = self.review(&diff, &mut report.stats).await;
        let body = text.body().to_string();
        if !self.dry_run {
            let posted = self
                .github
                .post_summary_comment(&event.repository, event.number, &body)
                .await;
            record_post(posted, "summary", &mut report.stats);
        }
        report.summary = Some(body);
    }

    async fn review(&self, diff: &str, stats: &mut RunStats) -> ReviewText {
        let text = self.reviewer.review(diff).await;
        stats.reviews_generated += 1;
        if text.is_fallback() {
            stats.fallbacks += 1;
        }
        text
    }
}

fn skip(file: &ChangedFile, stats: &mut RunStats) {
    info!(file = %file.filename, "skipping (no patch)");
    stats.files_skipped += 1;
}

fn record_post(result: Result<(), CriticError>, target: &str, stats: &mut RunStats) {
    match result {
        Ok(()) => stats.comments_posted += 1,
        Err(e) => {
            warn!(file = target, "failed to post review comment: {e}");
            stats.comments_failed += 1;
        }
    }
}

/// Settings for a single invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Event payload path; falls back to `GITHUB_EVENT_PATH`.
    pub event_path: Option<PathBuf>,
    /// Resolved configuration.
    pub config: CriticConfig,
    /// Generate reviews without posting them.
    pub dry_run: bool,
}

/// Load the triggering event and review it.
///
/// `env` resolves environment variables; pass `|k| std::env::var(k).ok()` in
/// production.
///
/// # Errors
///
/// Returns [`CriticError::MissingEventData`] or
/// [`CriticError::MissingCredentials`] before any network call when the event
/// cannot be resolved. Everything after that is logged, not returned.
pub async fn run<F>(options: &RunOptions, env: F) -> Result<RunReport, CriticError>
where
    F: Fn(&str) -> Option<String>,
{
    let loaded = load_event(options.event_path.as_deref(), env)?;
    info!(
        pr = loaded.event.number,
        repository = %loaded.event.repository,
        commit = %loaded.event.head_commit_id,
        "loaded pull request event"
    );

    let pipeline = ReviewPipeline::from_config(&options.config, &loaded.credentials)?
        .with_dry_run(options.dry_run);
    let report = pipeline.run(&loaded.event).await;
    info!("{}", report.stats);
    Ok(report)
}

/// Load the triggering event and fetch the whole pull request's raw diff.
///
/// # Errors
///
/// Returns the same configuration errors as [`run`].
pub async fn fetch_diff<F>(options: &RunOptions, env: F) -> Result<String, CriticError>
where
    F: Fn(&str) -> Option<String>,
{
    let loaded = load_event(options.event_path.as_deref(), env)?;
    let github = GitHubClient::new(&loaded.credentials.access_token, &options.config.github.api_url)?;
    Ok(github.fetch_pr_diff(&loaded.event.api_url).await)
}
