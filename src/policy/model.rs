// Common model definitions shared across all policy sections
use std::{collections::BTreeMap, fmt, path::Path};

use serde::{Deserialize, Serialize};

use super::capabilities::CapabilitiesSection;
use super::file::FileSection;
use super::net::NetworkSection;
use super::process::ProcessSection;
use crate::error::HostPolicyError;

pub const API_VERSION: &str = "security.kubearmor.com/v1";
pub const KIND: &str = "KubeArmorHostPolicy";

/// Host security policy object as stored and exchanged with the object store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPolicy {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: HostPolicySpec,
    #[serde(default)]
    pub status: PolicyStatus,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl HostPolicy {
    /// Create a policy with empty sections and no status
    pub fn new(reference: ObjectRef, action: Action) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta {
                name: reference.name,
                namespace: reference.namespace,
                resource_version: 0,
            },
            spec: HostPolicySpec {
                action,
                ..Default::default()
            },
            status: PolicyStatus::default(),
        }
    }

    /// Parse a policy from a YAML manifest
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load a policy manifest from disk
    pub fn load(path: &Path) -> Result<Self, HostPolicyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| HostPolicyError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn reference(&self) -> ObjectRef {
        ObjectRef {
            namespace: self.metadata.namespace.clone(),
            name: self.metadata.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Bumped by the store on every write
    #[serde(default)]
    pub resource_version: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPolicySpec {
    #[serde(default, skip_serializing_if = "NodeSelector::is_empty")]
    pub node_selector: NodeSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub process: ProcessSection,
    #[serde(default)]
    pub file: FileSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub capabilities: CapabilitiesSection,

    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl NodeSelector {
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty()
    }
}

/// Policy action; only `Allow` changes how rules are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    Allow,
    #[default]
    Block,
    Audit,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    /// `None` until the policy has been reconciled once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_status: Option<Verdict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Not OK")]
    NotOk,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => f.write_str("OK"),
            Verdict::NotOk => f.write_str("Not OK"),
        }
    }
}

/// Identifies a policy in the object store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    /// Reference to a cluster-scoped policy
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) if !namespace.is_empty() => write!(f, "{}/{}", namespace, self.name),
            _ => f.write_str(&self.name),
        }
    }
}

/// Restricts a rule to events originating from a specific binary or directory
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Empty means the entry does not scope by path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

impl SourceRef {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
        }
    }
}

/// Fields the validator inspects on every match rule
pub trait MatchRule {
    fn owner_only(&self) -> bool {
        false
    }

    fn from_source(&self) -> &[SourceRef] {
        &[]
    }
}
