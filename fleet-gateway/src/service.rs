use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Maximum length of a service name, matching the Kubernetes label limit.
const MAX_NAME_LENGTH: usize = 63;

/// Errors raised while validating a service name.
#[derive(Debug, Error)]
pub enum ServiceNameError {
    /// The name is empty or whitespace-only.
    #[error("the service name is empty")]
    Empty,

    /// The name exceeds the 63 character limit.
    #[error("the service name `{0}` is longer than 63 characters")]
    TooLong(String),

    /// The lowercased name contains characters outside `[a-z0-9-]`, or
    /// starts/ends with a dash.
    #[error("the service name `{0}` is not a valid DNS label")]
    InvalidShape(String),
}

/// A validated service name.
///
/// The name decides both the spec file (`<name>.yaml` in the repository
/// root) and the cluster resource name, so it is lowercased on construction
/// and restricted to DNS-label shape. Path separators, `..` and friends
/// never reach file-path construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName {
    raw: String,
    normalized: String,
}

impl ServiceName {
    pub fn parse(raw: &str) -> Result<Self, ServiceNameError> {
        if raw.trim().is_empty() {
            return Err(ServiceNameError::Empty);
        }

        let normalized = raw.to_lowercase();
        if normalized.len() > MAX_NAME_LENGTH {
            return Err(ServiceNameError::TooLong(raw.to_owned()));
        }

        let label_shaped = normalized
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-'))
            && !normalized.starts_with('-')
            && !normalized.ends_with('-');
        if !label_shaped {
            return Err(ServiceNameError::InvalidShape(raw.to_owned()));
        }

        Ok(Self {
            raw: raw.to_owned(),
            normalized,
        })
    }

    /// The lowercased form used for file and resource targeting.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The name exactly as the caller sent it, used in commit messages.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The spec file name inside the repository root.
    pub fn spec_file_name(&self) -> String {
        format!("{}.yaml", self.normalized)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// One environment variable of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnvVarSpec {
    pub name: String,
    pub value: String,
}

/// Labels attached to a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceLabels {
    #[serde(default)]
    pub app: String,
}

/// The durable description of a deployable service.
///
/// This is what gets serialized to `<name>.yaml` in the spec repository and
/// what the cluster resource is projected from. The YAML file is the source
/// of truth; the resource is a derived, eventually consistent view of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub name: String,
    #[serde(default)]
    pub labels: ServiceLabels,
    pub replicas: i32,
    pub flavor: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvVarSpec>,
}

/// Spec of the `Service` custom resource under the `fleet.dev` API group.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(group = "fleet.dev", version = "v1beta1", kind = "Service", namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub replicas: i32,
    pub flavor: String,
    pub version: String,
    pub tags: Vec<String>,
    pub env: Vec<EnvVarSpec>,
}

impl ServiceRecord {
    /// Projects the record into its cluster resource form.
    pub fn to_resource(&self, name: &ServiceName) -> Service {
        let mut resource = Service::new(
            name.as_str(),
            ServiceSpec {
                replicas: self.replicas,
                flavor: self.flavor.clone(),
                version: self.version.clone(),
                tags: self.tags.clone(),
                env: self.env.clone(),
            },
        );
        resource.metadata.labels = Some(BTreeMap::from([(
            "app".to_owned(),
            self.labels.app.clone(),
        )]));
        resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_lowercased_for_targeting() {
        let name = ServiceName::parse("Web").unwrap();
        assert_eq!(name.as_str(), "web");
        assert_eq!(name.raw(), "Web");
        assert_eq!(name.spec_file_name(), "web.yaml");
    }

    #[test]
    fn names_that_would_traverse_paths_are_rejected() {
        for raw in ["../evil", "a/b", "a\\b", "..", "web.yaml", "a b"] {
            assert!(ServiceName::parse(raw).is_err(), "{raw} should be invalid");
        }
    }

    #[test]
    fn empty_and_dash_edged_names_are_rejected() {
        assert!(matches!(
            ServiceName::parse("  "),
            Err(ServiceNameError::Empty)
        ));
        assert!(ServiceName::parse("-web").is_err());
        assert!(ServiceName::parse("web-").is_err());
    }

    #[test]
    fn overlong_names_are_rejected() {
        let raw = "a".repeat(64);
        assert!(matches!(
            ServiceName::parse(&raw),
            Err(ServiceNameError::TooLong(_))
        ));
    }

    #[test]
    fn record_round_trips_through_yaml() {
        let record = ServiceRecord {
            name: "web".to_owned(),
            labels: ServiceLabels {
                app: "web".to_owned(),
            },
            replicas: 2,
            flavor: "small".to_owned(),
            version: "1.0.0".to_owned(),
            tags: vec!["frontend".to_owned()],
            env: vec![EnvVarSpec {
                name: "MODE".to_owned(),
                value: "prod".to_owned(),
            }],
        };

        let yaml = serde_yaml_ng::to_string(&record).unwrap();
        let back: ServiceRecord = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn resource_projection_copies_spec_fields_and_labels() {
        let record = ServiceRecord {
            name: "Web".to_owned(),
            labels: ServiceLabels {
                app: "web".to_owned(),
            },
            replicas: 3,
            flavor: "medium".to_owned(),
            version: "2.1.0".to_owned(),
            tags: vec![],
            env: vec![],
        };

        let name = ServiceName::parse(&record.name).unwrap();
        let resource = record.to_resource(&name);
        assert_eq!(resource.metadata.name.as_deref(), Some("web"));
        assert_eq!(resource.spec.replicas, 3);
        assert_eq!(resource.spec.flavor, "medium");
        assert_eq!(
            resource.metadata.labels.as_ref().unwrap().get("app"),
            Some(&"web".to_owned())
        );
    }
}
