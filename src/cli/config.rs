use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::HostPolicyError;

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Maximum number of concurrent reconciliations
    pub workers: Option<usize>,
    /// Interval between store scans
    pub poll_interval_ms: Option<u64>,
    /// Delay before a failed reconciliation is retried
    pub retry_backoff_ms: Option<u64>,
    /// Delete invalid policies instead of only flagging them
    pub delete_invalid: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding policy manifests
    pub dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load configuration file
    pub fn load(path: &Path) -> Result<Self, HostPolicyError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| HostPolicyError::ConfigParse {
            path: PathBuf::from(path),
            source,
        })
    }
}
