use std::path::Path;

use critic_core::{CriticError, Credentials, PullRequestEvent};
use serde::Deserialize;

/// Environment variable naming the trigger payload file.
pub const EVENT_PATH_VAR: &str = "GITHUB_EVENT_PATH";
/// Environment variable holding the `owner/name` repository identifier.
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Environment variable holding the GitHub access token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Environment variable holding the completion endpoint API key.
pub const LLM_KEY_VAR: &str = "OPENAI_API_KEY";

/// A pull request event together with the credentials needed to act on it.
#[derive(Debug, Clone)]
pub struct LoadedEvent {
    /// The triggering pull request.
    pub event: PullRequestEvent,
    /// Tokens resolved from the environment.
    pub credentials: Credentials,
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestPayload>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: Option<u64>,
    url: Option<String>,
    head: Option<HeadPayload>,
}

#[derive(Deserialize)]
struct HeadPayload {
    sha: Option<String>,
}

/// Load the triggering pull request event.
///
/// `event_path` overrides `GITHUB_EVENT_PATH`; `env` resolves environment
/// variables (pass `|k| std::env::var(k).ok()` in production).
///
/// # Errors
///
/// Returns [`CriticError::MissingEventData`] if no event path is configured,
/// the file cannot be read or parsed, or it has no `pull_request` object.
/// Returns [`CriticError::MissingCredentials`] if the PR number, PR URL,
/// head commit, repository, or access token cannot be resolved.
///
/// # Examples
///
/// ```
/// use critic_core::CriticError;
/// use critic_review::event::load_event;
///
/// let err = load_event(None, |_| None).unwrap_err();
/// assert!(matches!(err, CriticError::MissingEventData(_)));
/// ```
pub fn load_event<F>(event_path: Option<&Path>, env: F) -> Result<LoadedEvent, CriticError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let path = match event_path {
        Some(p) => p.to_path_buf(),
        None => get(EVENT_PATH_VAR)
            .map(Into::into)
            .ok_or_else(|| CriticError::MissingEventData(format!("{EVENT_PATH_VAR} is not set")))?,
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        CriticError::MissingEventData(format!("failed to read {}: {e}", path.display()))
    })?;
    let payload: EventPayload = serde_json::from_str(&content).map_err(|e| {
        CriticError::MissingEventData(format!("failed to parse {}: {e}", path.display()))
    })?;
    let Some(pr) = payload.pull_request else {
        return Err(CriticError::MissingEventData(
            "no pull_request data found".into(),
        ));
    };

    let number = pr.number.filter(|n| *n > 0);
    let api_url = pr.url.filter(|u| !u.is_empty());
    let head_commit_id = pr.head.and_then(|h| h.sha).filter(|s| !s.is_empty());
    let repository = get(REPOSITORY_VAR);
    let access_token = get(TOKEN_VAR);

    let mut missing = Vec::new();
    if number.is_none() {
        missing.push("pull_request.number");
    }
    if api_url.is_none() {
        missing.push("pull_request.url");
    }
    if head_commit_id.is_none() {
        missing.push("pull_request.head.sha");
    }
    if repository.is_none() {
        missing.push(REPOSITORY_VAR);
    }
    if access_token.is_none() {
        missing.push(TOKEN_VAR);
    }

    match (number, api_url, head_commit_id, repository, access_token) {
        (Some(number), Some(api_url), Some(head_commit_id), Some(repository), Some(access_token)) => {
            Ok(LoadedEvent {
                event: PullRequestEvent {
                    number,
                    api_url,
                    head_commit_id,
                    repository,
                },
                credentials: Credentials {
                    access_token,
                    llm_api_key: get(LLM_KEY_VAR),
                },
            })
        }
        _ => Err(CriticError::MissingCredentials(missing.join(", "))),
    }
}
