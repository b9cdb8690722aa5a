use serde::{Deserialize, Serialize};

use super::model::{MatchRule, SourceRef};

/// Process capability rules
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesSection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_capabilities: Vec<MatchCapability>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCapability {
    /// Capability name without the `CAP_` prefix, e.g. `net_raw`
    #[serde(default)]
    pub capability: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_source: Vec<SourceRef>,
}

impl MatchRule for MatchCapability {
    fn from_source(&self) -> &[SourceRef] {
        &self.from_source
    }
}
