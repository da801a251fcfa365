use serde::{Deserialize, Serialize};

use crate::SecretText;

/// Cluster access configuration for one invocation.
#[derive(Debug, Clone)]
pub struct KubernetesConfig {
    /// Raw kubeconfig text, handed to the cluster client as-is.
    pub kubeconfig: SecretText,
}

/// On-disk layout of the `KubeConfig` secret: `{"kubeconfig": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSecretBundle {
    pub kubeconfig: SecretText,
}

impl From<ClusterSecretBundle> for KubernetesConfig {
    fn from(bundle: ClusterSecretBundle) -> Self {
        Self {
            kubeconfig: bundle.kubeconfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_mounted_secret_layout() {
        let payload = r#"{"kubeconfig": "apiVersion: v1\nkind: Config\n"}"#;
        let bundle: ClusterSecretBundle = serde_json::from_str(payload).unwrap();
        let config: KubernetesConfig = bundle.into();
        assert!(config.kubeconfig.expose().starts_with("apiVersion"));
    }
}
