use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::git::list_all_specs;

use super::HandlerError;

/// Lists every service spec in the repository as one JSON array.
///
/// Read-only: the repository is cloned bare into a scratch directory that
/// is gone by the time the response is produced. A single malformed spec
/// file fails the whole listing; consumers never see a partial array.
pub async fn handle(payload: &[u8]) -> Result<String, HandlerError> {
    let store = SecretStore::from_env();
    run(&store, api_key_from_env().as_deref(), payload).await
}

pub async fn run(
    store: &SecretStore,
    api_key: Option<&str>,
    _payload: &[u8],
) -> Result<String, HandlerError> {
    validate_api_key(store, api_key)?;

    let config = store.load_git_config()?;
    let specs = tokio::task::spawn_blocking(move || list_all_specs(&config)).await??;

    Ok(serde_json::to_string(&specs)?)
}
