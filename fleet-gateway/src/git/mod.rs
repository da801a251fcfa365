//! The git-backed specification store.
//!
//! Mutating flows ([`SpecStore`]) clone the remote into an ephemeral
//! [`Workspace`], apply exactly one file change, commit as the gateway bot
//! and push back. The read-only aggregation flow ([`list_all_specs`]) clones
//! bare into a self-deleting scratch directory and never touches a working
//! tree. Conflicting concurrent writers are serialized by the remote's
//! push-acceptance rule; this module does no merge logic.

mod auth;
mod list;
mod store;
mod workspace;

pub use auth::HostKeyPolicy;
pub use list::list_all_specs;
pub use store::SpecStore;
pub use workspace::Workspace;

use thiserror::Error;

/// Errors raised by spec repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The configured key material does not look like a private key.
    #[error("the repository key material is not a private key")]
    InvalidKey,

    /// The workspace or a file inside it could not be prepared.
    #[error("cannot prepare the working directory: {0}")]
    Workspace(#[from] std::io::Error),

    /// Cloning the remote failed (bad URL, rejected credentials, network).
    #[error("cannot clone the spec repository: {0}")]
    Clone(#[source] git2::Error),

    /// A delete targeted a service with no spec file.
    #[error("no spec file exists for service `{0}`")]
    SpecNotFound(String),

    /// The service record could not be serialized to YAML.
    #[error("cannot serialize the service spec: {0}")]
    Encode(#[from] serde_yaml_ng::Error),

    /// Staging the file change failed.
    #[error("cannot stage the change: {0}")]
    Stage(#[source] git2::Error),

    /// Creating the commit failed.
    #[error("cannot commit the change: {0}")]
    Commit(#[source] git2::Error),

    /// The push was refused or failed in transit. A non-fast-forward
    /// rejection lands here; the caller retries the whole invocation.
    #[error("cannot push to the spec repository: {0}")]
    Push(#[source] git2::Error),

    /// The repository head could not be resolved.
    #[error("cannot resolve the repository head: {0}")]
    Head(#[source] git2::Error),

    /// A tree or blob could not be read during aggregation.
    #[error("cannot read the repository tree: {0}")]
    Read(#[source] git2::Error),

    /// A spec file in the repository is not valid YAML.
    #[error("spec file `{0}` is not valid YAML: {1}")]
    Decode(String, #[source] serde_yaml_ng::Error),
}

impl RepoError {
    /// Whether retrying the whole invocation may succeed without operator
    /// action.
    ///
    /// Transport failures and push rejections are worth a retry; credential
    /// problems, missing files and malformed content are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            RepoError::Clone(err) | RepoError::Push(err) => {
                !matches!(err.class(), git2::ErrorClass::Ssh)
            }
            _ => false,
        }
    }
}
