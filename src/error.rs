use thiserror::Error;

use std::path::PathBuf;

use crate::policy::ObjectRef;

#[derive(Debug, Error)]
pub enum HostPolicyError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Failures reported by an [`ObjectStore`](crate::store::ObjectStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("host policy {0} not found")]
    NotFound(ObjectRef),

    #[error(
        "conflict writing host policy {reference}: expected resourceVersion {expected}, found {found}"
    )]
    Conflict {
        reference: ObjectRef,
        expected: u64,
        found: u64,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize host policy {reference}: {source}")]
    Serialize {
        reference: ObjectRef,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("object store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
