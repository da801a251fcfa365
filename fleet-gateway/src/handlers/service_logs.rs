use serde::{Deserialize, Serialize};

use fleet_config::SecretStore;

use crate::authentication::{api_key_from_env, validate_api_key};
use crate::k8s::http::HttpServiceApi;
use crate::k8s::{ServiceApi, first_pod_with_prefix};
use crate::service::ServiceName;

use super::{HandlerError, decode};

/// Returned when no pod matches the requested service.
pub const LOGS_NOT_FOUND: &str = "Service logs not found";

/// Request payload of the logs operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLogsRequest {
    pub service_name: String,
}

/// Returns the log output of the first pod backing the service.
///
/// Pods are matched by name prefix in the order the cluster API returned
/// them. A service without a matching pod is a soft miss answered with the
/// [`LOGS_NOT_FOUND`] sentinel rather than a failure — the one operation
/// where "nothing there" is an answer, not an error.
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
    let request: ServiceLogsRequest = decode(payload)?;
    let name = ServiceName::parse(&request.service_name)?;

    let pod_names = client.list_pod_names().await?;
    match first_pod_with_prefix(&pod_names, name.as_str()) {
        Some(pod_name) => Ok(client.pod_logs(pod_name).await?),
        None => Ok(LOGS_NOT_FOUND.to_owned()),
    }
}
