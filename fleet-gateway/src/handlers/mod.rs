//! The six gateway operations.
//!
//! Every handler is a stateless, single-shot async function from a byte
//! payload to a response string. Each one re-reads its secrets and rebuilds
//! its clients from scratch; no state survives an invocation. Failures are
//! returned as [`HandlerError`], classified retryable or not, and serialized
//! for the caller as an [`ErrorMessage`] — a handler never terminates the
//! process.

pub mod apply_service;
pub mod cluster_status;
pub mod delete_spec;
pub mod list_specs;
pub mod save_spec;
pub mod service_logs;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleet_config::SecretStoreError;

use crate::authentication::AuthError;
use crate::git::RepoError;
use crate::k8s::K8sError;
use crate::service::ServiceNameError;

/// Response payload of a successful mutating spec operation.
pub const STATUS_OK: &str = r#"{"status":"OK"}"#;

/// Errors a handler can fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid request payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Name(#[from] ServiceNameError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Secret(#[from] SecretStoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Cluster(#[from] K8sError),

    /// The blocking git task was cancelled or panicked.
    #[error("the repository operation did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl HandlerError {
    /// Whether the caller may succeed by retrying the whole invocation.
    ///
    /// Transport failures, push rejections and transient cluster errors are
    /// retryable; malformed input, missing files and bad credentials are
    /// not.
    pub fn retryable(&self) -> bool {
        match self {
            HandlerError::Repo(err) => err.is_retryable(),
            HandlerError::Cluster(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Serialized error payload returned to the dispatch runtime.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
    pub retryable: bool,
}

impl From<&HandlerError> for ErrorMessage {
    fn from(err: &HandlerError) -> Self {
        Self {
            error: err.to_string(),
            retryable: err.retryable(),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, HandlerError> {
    serde_json::from_slice(payload).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_failures_are_retryable_but_missing_specs_are_not() {
        let push = HandlerError::Repo(RepoError::Push(git2::Error::from_str("rejected")));
        assert!(push.retryable());

        let missing = HandlerError::Repo(RepoError::SpecNotFound("web".to_owned()));
        assert!(!missing.retryable());
    }

    #[test]
    fn payload_errors_are_not_retryable() {
        let err: HandlerError = serde_json::from_slice::<serde_json::Value>(b"{")
            .map_err(HandlerError::from)
            .unwrap_err();
        assert!(!err.retryable());
    }

    #[test]
    fn error_message_carries_the_classification() {
        let err = HandlerError::Repo(RepoError::SpecNotFound("web".to_owned()));
        let message = ErrorMessage::from(&err);
        assert!(message.error.contains("web"));
        assert!(!message.retryable);
    }
}
