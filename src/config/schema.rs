use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 8;
pub const DEFAULT_RETRIES: usize = 3;

/// Example YAML:
/// ```yaml
/// store:
///   url: https://store.example.org/api
///   timeout: "10s"
///   retries: 3
/// qualification:
///   top_k: 8
/// notifications:
///   webhook: https://hooks.example.org/marks
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub qualification: QualificationConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Remote document store. When unset the local JSON store is used.
    #[serde(default)]
    pub url: Option<String>,

    /// Local JSON store path (default: <config dir>/judge-desk/marks.json)
    #[serde(default)]
    pub path: Option<String>,

    /// Request timeout, humantime format such as "10s" or "1m 30s"
    #[serde(default)]
    pub timeout: Option<String>,

    /// Retries for idempotent reads against the remote store
    #[serde(default)]
    pub retries: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QualificationConfig {
    /// How many tier-1 entries qualify for tier 2
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Endpoint receiving "marks entered" events. Logged only when unset.
    #[serde(default)]
    pub webhook: Option<String>,
}
