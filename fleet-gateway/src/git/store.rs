use git2::build::RepoBuilder;
use git2::{FetchOptions, PushOptions, Repository, Signature};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use fleet_config::shared::GitConfig;

use crate::service::{ServiceName, ServiceRecord};

use super::auth::{ensure_key_material, remote_callbacks};
use super::{HostKeyPolicy, RepoError, Workspace};

/// Author identity of gateway commits.
const BOT_NAME: &str = "Fleet Bot";
const BOT_EMAIL: &str = "fleet-bot@fleet.dev";

/// Wall-clock budget for the initial clone transfer.
const CLONE_TIMEOUT: Duration = Duration::from_secs(120);

/// The mutating side of the spec repository.
///
/// Each operation clones the remote's default branch into a fresh
/// [`Workspace`], applies exactly one file change, commits as the gateway
/// bot and pushes back. No merge or rebase is ever attempted: when two
/// invocations race on the same branch the remote accepts exactly one push
/// and rejects the other, which surfaces as a retryable [`RepoError::Push`].
#[derive(Debug)]
pub struct SpecStore {
    config: GitConfig,
    policy: HostKeyPolicy,
    workspace_parent: PathBuf,
}

impl SpecStore {
    /// Builds a store from the git credential bundle.
    ///
    /// Fails up front when the key material cannot be a private key, before
    /// any workspace or network work starts.
    pub fn new(config: GitConfig) -> Result<Self, RepoError> {
        ensure_key_material(&config)?;
        let policy = HostKeyPolicy::from_config(&config);
        Ok(Self {
            config,
            policy,
            workspace_parent: std::env::temp_dir(),
        })
    }

    /// Overrides the directory workspaces are created under.
    pub fn with_workspace_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.workspace_parent = parent.into();
        self
    }

    /// Writes (or overwrites) `<name>.yaml` with the serialized record,
    /// commits and pushes.
    ///
    /// Blocking: call from `spawn_blocking` in async contexts.
    pub fn save(&self, name: &ServiceName, record: &ServiceRecord) -> Result<(), RepoError> {
        let workspace = Workspace::acquire_in(&self.workspace_parent)?;
        let repo = self.clone_into(workspace.path())?;

        let yaml = serde_yaml_ng::to_string(record)?;
        let file_name = name.spec_file_name();
        write_spec_file(&workspace.path().join(&file_name), &yaml)?;

        let mut index = repo.index().map_err(RepoError::Stage)?;
        index
            .add_path(Path::new(&file_name))
            .map_err(RepoError::Stage)?;
        index.write().map_err(RepoError::Stage)?;

        self.commit(&repo, &format!("[FLEET] Update {} spec", name.raw()))?;
        self.push(&repo)?;

        info!(service = %name, file = file_name, "spec saved and pushed");
        Ok(())
    }

    /// Stages the removal of `<name>.yaml`, commits and pushes.
    ///
    /// Fails with [`RepoError::SpecNotFound`] when no spec file exists for
    /// the service. Blocking, like [`SpecStore::save`].
    pub fn delete(&self, name: &ServiceName) -> Result<(), RepoError> {
        let workspace = Workspace::acquire_in(&self.workspace_parent)?;
        let repo = self.clone_into(workspace.path())?;

        let file_name = name.spec_file_name();
        let mut index = repo.index().map_err(RepoError::Stage)?;
        if index.get_path(Path::new(&file_name), 0).is_none() {
            return Err(RepoError::SpecNotFound(name.as_str().to_owned()));
        }
        index
            .remove_path(Path::new(&file_name))
            .map_err(RepoError::Stage)?;
        index.write().map_err(RepoError::Stage)?;

        self.commit(&repo, &format!("[FLEET] Remove service {}", name.raw()))?;
        self.push(&repo)?;

        info!(service = %name, file = file_name, "spec removed and pushed");
        Ok(())
    }

    fn clone_into(&self, path: &Path) -> Result<Repository, RepoError> {
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(
            &self.config,
            self.policy.clone(),
            Some(Instant::now() + CLONE_TIMEOUT),
        ));

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(&self.config.repository_url, path)
            .map_err(RepoError::Clone)
    }

    fn commit(&self, repo: &Repository, message: &str) -> Result<(), RepoError> {
        let mut index = repo.index().map_err(RepoError::Commit)?;
        let tree_oid = index.write_tree().map_err(RepoError::Commit)?;
        let tree = repo.find_tree(tree_oid).map_err(RepoError::Commit)?;

        let signature = Signature::now(BOT_NAME, BOT_EMAIL).map_err(RepoError::Commit)?;
        let parent = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(RepoError::Commit)?;

        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )
        .map_err(RepoError::Commit)?;

        Ok(())
    }

    fn push(&self, repo: &Repository) -> Result<(), RepoError> {
        let head = repo.head().map_err(RepoError::Head)?;
        let branch = head
            .shorthand()
            .ok_or_else(|| RepoError::Head(git2::Error::from_str("HEAD is not a named branch")))?
            .to_owned();

        let mut callbacks = remote_callbacks(&self.config, self.policy.clone(), None);
        callbacks.push_update_reference(|reference, status| {
            // A non-fast-forward rejection arrives here as a status message.
            if let Some(message) = status {
                return Err(git2::Error::from_str(&format!(
                    "push of {reference} was rejected: {message}"
                )));
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let mut remote = repo.find_remote("origin").map_err(RepoError::Push)?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(RepoError::Push)
    }
}

fn write_spec_file(path: &Path, contents: &str) -> Result<(), RepoError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}
