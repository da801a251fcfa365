use git2::build::RepoBuilder;
use git2::{FetchOptions, ObjectType};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use fleet_config::shared::GitConfig;

use super::auth::{ensure_key_material, remote_callbacks};
use super::{HostKeyPolicy, RepoError};

/// Wall-clock budget for the listing clone transfer.
const LIST_TIMEOUT: Duration = Duration::from_secs(120);

/// Collects every spec in the repository as one JSON array.
///
/// The remote is cloned bare into a scratch directory that deletes itself
/// when the call returns, so the flow is strictly read-only: no working
/// tree, no spec-file writes, nothing persisted. Every blob reachable from
/// the tip of the default branch is converted from YAML to JSON; a single
/// unreadable or malformed file fails the whole listing rather than
/// producing a partial array.
///
/// The array order is whatever the tree walk yields and is not part of the
/// contract.
///
/// Blocking: call from `spawn_blocking` in async contexts.
pub fn list_all_specs(config: &GitConfig) -> Result<Vec<Value>, RepoError> {
    ensure_key_material(config)?;
    let policy = HostKeyPolicy::from_config(config);

    let scratch = tempfile::tempdir()?;

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(
        config,
        policy,
        Some(Instant::now() + LIST_TIMEOUT),
    ));

    let repo = RepoBuilder::new()
        .bare(true)
        .fetch_options(fetch_options)
        .clone(&config.repository_url, scratch.path())
        .map_err(RepoError::Clone)?;

    let tip = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(RepoError::Head)?;
    let root = tip.tree().map_err(RepoError::Read)?;

    let mut specs = Vec::new();
    let mut pending = VecDeque::from([(root, PathBuf::new())]);
    while let Some((tree, prefix)) = pending.pop_front() {
        for entry in tree.iter() {
            let name = String::from_utf8_lossy(entry.name_bytes()).into_owned();
            match entry.kind() {
                Some(ObjectType::Tree) => {
                    let subtree = repo.find_tree(entry.id()).map_err(RepoError::Read)?;
                    pending.push_back((subtree, prefix.join(&name)));
                }
                Some(ObjectType::Blob) => {
                    let blob = repo.find_blob(entry.id()).map_err(RepoError::Read)?;
                    let path = prefix.join(&name).display().to_string();
                    let spec: Value = serde_yaml_ng::from_slice(blob.content())
                        .map_err(|source| RepoError::Decode(path, source))?;
                    specs.push(spec);
                }
                _ => {}
            }
        }
    }

    Ok(specs)
}
