use serde::{Deserialize, Serialize};

use super::model::{MatchRule, SourceRef};

/// Network protocol rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_protocols: Vec<MatchProtocol>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchProtocol {
    /// Protocol name such as `tcp`, `udp`, `icmp` or `raw`
    #[serde(default)]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

impl MatchRule for MatchProtocol {
    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}
