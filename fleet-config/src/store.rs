use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shared::{ClusterSecretBundle, GitSecretBundle, KubernetesConfig};
use crate::{SecretText, shared::GitConfig};

/// Default root directory the platform mounts secrets under.
const DEFAULT_SECRETS_DIR: &str = "/var/fleet/secrets";

/// Environment variable overriding the secrets root, used by tests.
const SECRETS_DIR_ENV_NAME: &str = "FLEET_SECRETS_DIR";

/// Name of the secret holding the git credential bundle.
const GIT_CONFIG_SECRET_NAME: &str = "GitConfig";

/// Name of the secret holding the cluster kubeconfig bundle.
const KUBE_CONFIG_SECRET_NAME: &str = "KubeConfig";

/// Name of the optional secret holding the gateway API key.
const API_KEY_SECRET_NAME: &str = "ApiKey";

/// Errors raised while reading or decoding a secret.
#[derive(Debug, Error)]
pub enum SecretStoreError {
    /// No secret with the requested name exists under the store root.
    #[error("secret `{0}` was not found in the secret store")]
    NotFound(String),

    /// The secret exists but could not be read.
    #[error("secret `{name}` could not be read: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The secret payload does not decode into the expected schema.
    #[error("secret `{name}` is malformed: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only, name-keyed access to the secrets mounted for one invocation.
///
/// There is deliberately no caching layer: every invocation constructs a
/// fresh store and re-reads whatever it needs, so rotated secrets are picked
/// up on the next request without coordination.
#[derive(Debug, Clone)]
pub struct SecretStore {
    root: PathBuf,
}

impl SecretStore {
    /// Opens the store at the platform default root, honoring the
    /// `FLEET_SECRETS_DIR` override.
    pub fn from_env() -> Self {
        let root = std::env::var(SECRETS_DIR_ENV_NAME)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_DIR));
        Self { root }
    }

    /// Opens the store rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loads the git credential bundle.
    pub fn load_git_config(&self) -> Result<GitConfig, SecretStoreError> {
        let bundle: GitSecretBundle = self.load_json(GIT_CONFIG_SECRET_NAME)?;
        Ok(bundle.git)
    }

    /// Loads the cluster kubeconfig bundle.
    pub fn load_kube_config(&self) -> Result<KubernetesConfig, SecretStoreError> {
        let bundle: ClusterSecretBundle = self.load_json(KUBE_CONFIG_SECRET_NAME)?;
        Ok(bundle.into())
    }

    /// Loads the gateway API key, if one is configured.
    ///
    /// The key secret is optional: a store without one accepts any caller
    /// that presents a non-empty key.
    pub fn load_api_key(&self) -> Result<Option<SecretText>, SecretStoreError> {
        match self.read(API_KEY_SECRET_NAME) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).trim().to_owned();
                Ok(Some(SecretText::from(text)))
            }
            Err(SecretStoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, SecretStoreError> {
        let bytes = self.read(name)?;
        serde_json::from_slice(&bytes).map_err(|source| SecretStoreError::Malformed {
            name: name.to_owned(),
            source,
        })
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, SecretStoreError> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(SecretStoreError::NotFound(name.to_owned()))
            }
            Err(source) => Err(SecretStoreError::Unreadable {
                name: name.to_owned(),
                source,
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
