use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use thiserror::Error;

use crate::service::Service;

/// Errors emitted by the cluster integration.
#[derive(Debug, Error)]
pub enum K8sError {
    /// The kubeconfig text could not be parsed or turned into a client.
    #[error("cannot build a cluster client from the provided kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// A resource with the requested name already exists. Create calls
    /// surface this so the caller can fall back to an update.
    #[error("resource `{0}` already exists")]
    AlreadyExists(String),

    /// The requested resource does not exist.
    #[error("resource `{0}` was not found")]
    NotFound(String),

    /// Any other error returned by the cluster API.
    #[error("cluster API error: {0}")]
    Api(#[from] kube::Error),
}

impl K8sError {
    /// Whether retrying the whole invocation may succeed without operator
    /// action. Transient API failures are worth a retry; a bad kubeconfig or
    /// a missing resource is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, K8sError::Api(_))
    }
}

/// The cluster operations the handlers need.
///
/// Kept narrow so tests can substitute an in-memory cluster for the
/// [`kube`]-backed implementation.
#[async_trait]
pub trait ServiceApi: Send + Sync {
    /// Creates the service resource in the services namespace.
    async fn create_service(&self, service: &Service) -> Result<Service, K8sError>;

    /// Fetches the current service resource by name.
    async fn get_service(&self, name: &str) -> Result<Service, K8sError>;

    /// Replaces the service resource. The passed object must carry the
    /// resource version of the object it replaces.
    async fn replace_service(&self, name: &str, service: &Service) -> Result<Service, K8sError>;

    /// Lists the cluster nodes.
    async fn list_nodes(&self) -> Result<Vec<Node>, K8sError>;

    /// Lists the pod names in the services namespace, in API order.
    async fn list_pod_names(&self) -> Result<Vec<String>, K8sError>;

    /// Returns the full log output of one pod.
    async fn pod_logs(&self, pod_name: &str) -> Result<String, K8sError>;
}

/// Creates the service, falling back to fetch-then-replace when a resource
/// of the same name already exists.
///
/// The cluster API has no native upsert verb, so the conflict arm fetches
/// the current object to obtain its resource version and replays the
/// candidate with that token, which is how the API protects against lost
/// updates. The token is fetched immediately before the replace and the
/// sequence is not retried: a writer that advances the version in between
/// surfaces as a hard failure for the caller to retry.
pub async fn upsert_service<C>(client: &C, mut candidate: Service) -> Result<Service, K8sError>
where
    C: ServiceApi + ?Sized,
{
    let name = candidate.name_any();
    match client.create_service(&candidate).await {
        Ok(stored) => Ok(stored),
        Err(K8sError::AlreadyExists(_)) => {
            let existing = client.get_service(&name).await?;
            candidate.metadata.resource_version = existing.metadata.resource_version.clone();
            client.replace_service(&name, &candidate).await
        }
        Err(err) => Err(err),
    }
}

/// Picks the first pod whose name starts with `prefix`, in the order the
/// cluster API returned them.
pub fn first_pod_with_prefix<'a>(pod_names: &'a [String], prefix: &str) -> Option<&'a str> {
    pod_names
        .iter()
        .map(String::as_str)
        .find(|name| name.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_pod_wins_in_api_order() {
        let pods = vec![
            "svca-7f9".to_owned(),
            "svca-2b1".to_owned(),
            "svcb-1".to_owned(),
        ];
        assert_eq!(first_pod_with_prefix(&pods, "svca"), Some("svca-7f9"));
        assert_eq!(first_pod_with_prefix(&pods, "svcb"), Some("svcb-1"));
    }

    #[test]
    fn no_prefix_match_yields_none() {
        let pods = vec!["svca-7f9".to_owned()];
        assert_eq!(first_pod_with_prefix(&pods, "svcc"), None);
        assert_eq!(first_pod_with_prefix(&[], "svca"), None);
    }
}
