//! Core types, configuration, and error handling for critic.
//!
//! This crate provides the shared foundation used by the review pipeline:
//! - [`CriticError`] and [`LlmError`]: error types using `thiserror`
//! - [`CriticConfig`]: configuration loaded from `.critic.toml` and the environment
//! - Shared types: [`PullRequestEvent`], [`ChangedFile`], [`ReviewResult`],
//!   [`Credentials`], [`ReviewMode`]

mod config;
mod error;
mod types;

pub use config::{CriticConfig, GitHubConfig, LlmConfig, ReviewConfig};
pub use error::{CriticError, LlmError};
pub use types::{ChangedFile, Credentials, PullRequestEvent, ReviewMode, ReviewResult};

/// A convenience `Result` type for critic operations.
pub type Result<T> = std::result::Result<T, CriticError>;
