use std::path::PathBuf;

use contacts_core::{ApiError, ConfigError, SessionError, TransportError};
use thiserror::Error;

/// Errors that can end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP client setup failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not persist session: {0}")]
    Session(#[from] SessionError),

    #[error("could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not logged in")]
    NotLoggedIn,
}

impl CliError {
    /// The line shown to the user.
    ///
    /// Session rejections become a prompt to log in again; server-side
    /// validation failures list each message.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Api(ApiError::Auth { .. }) => {
                "session rejected, log in again (contacts login)".to_string()
            }
            CliError::NotLoggedIn => "not logged in (contacts login)".to_string(),
            CliError::Api(err @ ApiError::Client { detail, .. }) => {
                let messages = detail.messages();
                if messages.is_empty() {
                    err.to_string()
                } else {
                    messages.join("; ")
                }
            }
            CliError::Api(ApiError::NotFound) => "contact not found".to_string(),
            CliError::Api(ApiError::Network(reason)) => {
                format!("cannot reach the contacts server: {reason}")
            }
            other => other.to_string(),
        }
    }
}
