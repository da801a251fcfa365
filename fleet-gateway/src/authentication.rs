use constant_time_eq::constant_time_eq;
use fleet_config::{SecretStore, SecretStoreError};
use thiserror::Error;

/// Environment variable the dispatch runtime maps the `X-Api-Key` request
/// header to.
pub const API_KEY_ENV_NAME: &str = "Http_X_Api_Key";

/// Errors raised while validating the caller's API key.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no API key was provided with the request")]
    MissingKey,

    #[error("the provided API key is not valid")]
    InvalidKey,

    #[error(transparent)]
    Secret(#[from] SecretStoreError),
}

/// Validates the caller's API key for one invocation.
///
/// When the secret store carries an `ApiKey` secret the provided key must
/// match it, compared in constant time. Without one, any non-empty key is
/// accepted and verification is left to the gateway in front of the
/// handlers.
pub fn validate_api_key(store: &SecretStore, provided: Option<&str>) -> Result<(), AuthError> {
    let provided = provided
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AuthError::MissingKey)?;

    match store.load_api_key()? {
        Some(expected) => {
            if constant_time_eq(provided.as_bytes(), expected.expose().as_bytes()) {
                Ok(())
            } else {
                Err(AuthError::InvalidKey)
            }
        }
        None => Ok(()),
    }
}

/// Reads the header-derived API key from the environment.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV_NAME).ok()
}
