use async_trait::async_trait;
use fleet_gateway::k8s::{K8sError, ServiceApi};
use fleet_gateway::service::Service;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// In-memory stand-in for the cluster.
///
/// Mirrors the create/get/replace semantics the gateway relies on: create
/// conflicts on an existing name, replace demands the current resource
/// version. Versions are a monotonically increasing counter, stringified
/// like the real API's opaque tokens.
#[derive(Default)]
pub struct MockServiceApi {
    pub services: Mutex<BTreeMap<String, Service>>,
    pub next_version: AtomicU64,
    pub create_calls: AtomicUsize,
    pub replace_calls: AtomicUsize,
    pub nodes: Vec<String>,
    pub pods: Vec<(String, String)>,
}

impl MockServiceApi {
    pub fn new() -> Self {
        Self {
            next_version: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn with_pods(pods: &[(&str, &str)]) -> Self {
        Self {
            pods: pods
                .iter()
                .map(|(name, logs)| ((*name).to_owned(), (*logs).to_owned()))
                .collect(),
            ..Self::new()
        }
    }

    fn bump(&self) -> String {
        self.next_version.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

#[async_trait]
impl ServiceApi for MockServiceApi {
    async fn create_service(&self, service: &Service) -> Result<Service, K8sError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let name = service.name_any();
        let mut services = self.services.lock().unwrap();
        if services.contains_key(&name) {
            return Err(K8sError::AlreadyExists(name));
        }
        let mut stored = service.clone();
        stored.metadata.resource_version = Some(self.bump());
        services.insert(name, stored.clone());
        Ok(stored)
    }

    async fn get_service(&self, name: &str) -> Result<Service, K8sError> {
        self.services
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| K8sError::NotFound(name.to_owned()))
    }

    async fn replace_service(&self, name: &str, service: &Service) -> Result<Service, K8sError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        let mut services = self.services.lock().unwrap();
        let Some(existing) = services.get(name) else {
            return Err(K8sError::NotFound(name.to_owned()));
        };
        // A replace without the current token is a conflict, like the real API.
        if service.metadata.resource_version != existing.metadata.resource_version {
            return Err(K8sError::AlreadyExists(name.to_owned()));
        }
        let mut stored = service.clone();
        stored.metadata.resource_version = Some(self.bump());
        services.insert(name.to_owned(), stored.clone());
        Ok(stored)
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, K8sError> {
        Ok(self
            .nodes
            .iter()
            .map(|name| Node {
                metadata: ObjectMeta {
                    name: Some(name.clone()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect())
    }

    async fn list_pod_names(&self) -> Result<Vec<String>, K8sError> {
        Ok(self.pods.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn pod_logs(&self, pod_name: &str) -> Result<String, K8sError> {
        self.pods
            .iter()
            .find(|(name, _)| name == pod_name)
            .map(|(_, logs)| logs.clone())
            .ok_or_else(|| K8sError::NotFound(pod_name.to_owned()))
    }
}
