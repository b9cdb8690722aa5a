use serde::{Deserialize, Serialize};

use super::model::{MatchRule, SourceRef};

/// Process execution rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_paths: Vec<ProcessMatchPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_directories: Vec<ProcessMatchDirectory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_patterns: Vec<ProcessMatchPattern>,
}

/// Matches a single executable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMatchPath {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub owner_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

/// Matches every executable under a directory
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMatchDirectory {
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub owner_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

/// Matches executables by glob pattern
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMatchPattern {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub owner_only: bool,
}

impl MatchRule for ProcessMatchPath {
    fn owner_only(&self) -> bool {
        self.owner_only
    }

    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}

impl MatchRule for ProcessMatchDirectory {
    fn owner_only(&self) -> bool {
        self.owner_only
    }

    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}

impl MatchRule for ProcessMatchPattern {
    fn owner_only(&self) -> bool {
        self.owner_only
    }
}
