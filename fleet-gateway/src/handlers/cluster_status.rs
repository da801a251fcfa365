use k8s_openapi::api::core::v1::Node;
use serde::Serialize;

use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::k8s::ServiceApi;
use crate::k8s::http::HttpServiceApi;

use super::HandlerError;

/// Response payload of the status operation.
#[derive(Debug, Serialize)]
pub struct NodeListResponse {
    pub items: Vec<Node>,
}

/// Reports the cluster's node list.
pub async fn handle(payload: &[u8]) -> Result<String, HandlerError> {
    let store = SecretStore::from_env();
    validate_api_key(&store, api_key_from_env().as_deref())?;

    let client = HttpServiceApi::connect(&store.load_kube_config()?).await?;
    run(&client, payload).await
}

pub async fn run<C>(client: &C, _payload: &[u8]) -> Result<String, HandlerError>
where
    C: ServiceApi + ?Sized,
{
    let items = client.list_nodes().await?;
    Ok(serde_json::to_string(&NodeListResponse { items })?)
}
