use serde::{Deserialize, Serialize};

use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::git::SpecStore;
use crate::service::{ServiceName, ServiceRecord};

use super::{HandlerError, STATUS_OK, decode};

/// Request payload of the save operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSpecRequest {
    pub service_name: String,
    pub service: ServiceRecord,
}

/// Saves one service spec to the repository.
///
/// Clones the remote, writes `<name>.yaml` (creating or overwriting),
/// commits and pushes. Responds with a fixed OK payload; there are no
/// partial results.
pub async fn handle(payload: &[u8]) -> Result<String, HandlerError> {
    let store = SecretStore::from_env();
    run(&store, api_key_from_env().as_deref(), payload).await
}

pub async fn run(
    store: &SecretStore,
    api_key: Option<&str>,
    payload: &[u8],
) -> Result<String, HandlerError> {
    validate_api_key(store, api_key)?;

    let request: SaveSpecRequest = decode(payload)?;
    let name = ServiceName::parse(&request.service_name)?;
    let record = request.service;

    let spec_store = SpecStore::new(store.load_git_config()?)?;
    tokio::task::spawn_blocking(move || spec_store.save(&name, &record)).await??;

    Ok(STATUS_OK.to_owned())
}
