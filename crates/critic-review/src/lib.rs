//! Pull request review pipeline.
//!
//! Loads the triggering event, lists the PR's changed files, asks an
//! OpenAI-compatible endpoint for a review of each patch, and posts the
//! result back to GitHub.

pub mod event;
pub mod github;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod reviewer;
