use serde::{Deserialize, Serialize};

use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::k8s::http::HttpServiceApi;
use crate::k8s::{ServiceApi, upsert_service};
use crate::service::{ServiceName, ServiceRecord};

use super::{HandlerError, decode};

/// Request payload of the apply operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyServiceRequest {
    pub service: ServiceRecord,
}

/// Creates or updates the `Service` resource projected from the spec.
///
/// The stored resource — post-create or post-update — is returned as the
/// response, resource version included.
pub async fn handle(payload: &[u8]) -> Result<String, HandlerError> {
    let store = SecretStore::from_env();
    validate_api_key(&store, api_key_from_env().as_deref())?;

    let client = HttpServiceApi::connect(&store.load_kube_config()?).await?;
    run(&client, payload).await
}

pub async fn run<C>(client: &C, payload: &[u8]) -> Result<String, HandlerError>
where
    C: ServiceApi + ?Sized,
{
    let request: ApplyServiceRequest = decode(payload)?;
    let name = ServiceName::parse(&request.service.name)?;
    let candidate = request.service.to_resource(&name);

    let stored = upsert_service(client, candidate).await?;
    Ok(serde_json::to_string(&stored)?)
}
