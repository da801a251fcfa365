use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{Api, ListParams, LogParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, ResourceExt};
use std::time::Duration;

use fleet_config::shared::KubernetesConfig;

use crate::service::Service;

use super::{K8sError, ServiceApi};

/// Namespace service resources and their pods live in.
const SERVICES_NAMESPACE: &str = "default";

/// Budget for establishing a connection to the API server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Budget for one API response, log streaming included.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// [`ServiceApi`] implementation backed by the [`kube`] client.
///
/// Built from scratch for every invocation out of the kubeconfig secret;
/// nothing is pooled or shared across invocations.
pub struct HttpServiceApi {
    client: Client,
}

impl HttpServiceApi {
    /// Builds a client from the raw kubeconfig text of the cluster secret.
    pub async fn connect(config: &KubernetesConfig) -> Result<Self, K8sError> {
        let kubeconfig = Kubeconfig::from_yaml(config.kubeconfig.expose())?;
        let mut client_config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        client_config.connect_timeout = Some(CONNECT_TIMEOUT);
        client_config.read_timeout = Some(READ_TIMEOUT);

        let client = Client::try_from(client_config)?;
        Ok(Self { client })
    }

    fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), SERVICES_NAMESPACE)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), SERVICES_NAMESPACE)
    }
}

/// Maps an API failure onto the structured error kinds the upsert logic
/// dispatches on. Conflicts and misses are recognized by status code, never
/// by matching message text.
fn classify(name: &str, err: kube::Error) -> K8sError {
    match err {
        kube::Error::Api(ref response) if response.code == 409 => {
            K8sError::AlreadyExists(name.to_owned())
        }
        kube::Error::Api(ref response) if response.code == 404 => {
            K8sError::NotFound(name.to_owned())
        }
        other => K8sError::Api(other),
    }
}

#[async_trait]
impl ServiceApi for HttpServiceApi {
    async fn create_service(&self, service: &Service) -> Result<Service, K8sError> {
        let name = service.name_any();
        self.services()
            .create(&PostParams::default(), service)
            .await
            .map_err(|err| classify(&name, err))
    }

    async fn get_service(&self, name: &str) -> Result<Service, K8sError> {
        self.services()
            .get(name)
            .await
            .map_err(|err| classify(name, err))
    }

    async fn replace_service(&self, name: &str, service: &Service) -> Result<Service, K8sError> {
        self.services()
            .replace(name, &PostParams::default(), service)
            .await
            .map_err(|err| classify(name, err))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, K8sError> {
        let nodes = Api::<Node>::all(self.client.clone())
            .list(&ListParams::default())
            .await?;
        Ok(nodes.items)
    }

    async fn list_pod_names(&self) -> Result<Vec<String>, K8sError> {
        let pods = self.pods().list(&ListParams::default()).await?;
        Ok(pods
            .items
            .into_iter()
            .filter_map(|pod| pod.metadata.name)
            .collect())
    }

    async fn pod_logs(&self, pod_name: &str) -> Result<String, K8sError> {
        self.pods()
            .logs(pod_name, &LogParams::default())
            .await
            .map_err(|err| classify(pod_name, err))
    }
}
