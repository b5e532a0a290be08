use std::fmt::Write;

use critic_core::ChangedFile;

const SYSTEM_PROMPT: &str = "\
You are a senior software engineer reviewing a pull request. \
Give detailed, constructive feedback focusing on code quality, readability, bugs, and best practices.";

/// Build the system prompt establishing the reviewer persona.
///
/// # Examples
///
/// ```
/// use critic_review::prompt::build_system_prompt;
///
/// let prompt = build_system_prompt();
/// assert!(prompt.contains("senior software engineer"));
/// ```
pub fn build_system_prompt() -> String {
    SYSTEM_PROMPT.to_string()
}

/// Build the user prompt embedding `diff` verbatim.
///
/// # Examples
///
/// ```
/// use critic_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("+new line");
/// assert_eq!(prompt, "Please review the following code diff:\n\n+new line");
/// ```
pub fn build_review_prompt(diff: &str) -> String {
    format!("Please review the following code diff:\n\n{diff}")
}

/// Concatenate every reviewable patch under a `--- filename ---` header.
///
/// Files without a patch are left out. Returns an empty string when no file
/// has patch text.
///
/// # Examples
///
/// ```
/// use critic_core::ChangedFile;
/// use critic_review::prompt::build_summary_diff;
///
/// let files = vec![
///     ChangedFile { filename: "a.py".into(), patch: Some("+x".into()) },
///     ChangedFile { filename: "b.png".into(), patch: None },
/// ];
/// assert_eq!(build_summary_diff(&files), "\n--- a.py ---\n+x\n");
/// ```
pub fn build_summary_diff(files: &[ChangedFile]) -> String {
    let mut text = String::new();
    for file in files {
        if let Some(patch) = file.reviewable_patch() {
            let _ = write!(text, "\n--- {} ---\n{patch}\n", file.filename);
        }
    }
    text
}
