use serde::{Deserialize, Serialize};

use super::model::{MatchRule, SourceRef};

/// File access rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_paths: Vec<FileMatchPath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_directories: Vec<FileMatchDirectory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_patterns: Vec<FileMatchPattern>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatchPath {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub owner_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatchDirectory {
    #[serde(default)]
    pub dir: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub owner_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatchPattern {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub owner_only: bool,
}

impl MatchRule for FileMatchPath {
    fn owner_only(&self) -> bool {
        self.owner_only
    }

    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}

impl MatchRule for FileMatchDirectory {
    fn owner_only(&self) -> bool {
        self.owner_only
    }

    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}

impl MatchRule for FileMatchPattern {
    fn owner_only(&self) -> bool {
        self.owner_only
    }
}
