use serde::{Deserialize, Serialize};

use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::git::SpecStore;
use crate::service::ServiceName;

use super::{HandlerError, STATUS_OK, decode};

/// Request payload of the delete operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSpecRequest {
    pub service_name: String,
}

/// Removes one service spec from the repository.
///
/// Fails when no spec file exists for the service. Removing the file does
/// NOT remove the live `Service` resource from the cluster: spec deletion
/// and cluster teardown are separate, deliberate steps, and the second one
/// belongs to the operator.
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

    let request: DeleteSpecRequest = decode(payload)?;
    let name = ServiceName::parse(&request.service_name)?;

    let spec_store = SpecStore::new(store.load_git_config()?)?;
    tokio::task::spawn_blocking(move || spec_store.delete(&name)).await??;

    Ok(STATUS_OK.to_owned())
}
