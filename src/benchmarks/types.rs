use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-reported lifecycle status of a benchmark.
///
/// Values outside the known vocabulary are kept verbatim in `Unknown` so
/// errors can name them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SyncState {
    #[default]
    Pending,
    Synced,
    Failed,
    Deleting,
    DeleteFailed,
    Unknown(String),
}

impl SyncState {
    pub fn as_str(&self) -> &str {
        match self {
            SyncState::Pending => "PENDING",
            SyncState::Synced => "SYNCED",
            SyncState::Failed => "FAILED",
            SyncState::Deleting => "DELETING",
            SyncState::DeleteFailed => "DELETE_FAILED",
            SyncState::Unknown(value) => value,
        }
    }
}

impl From<String> for SyncState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => SyncState::Pending,
            "SYNCED" => SyncState::Synced,
            "FAILED" => SyncState::Failed,
            "DELETING" => SyncState::Deleting,
            "DELETE_FAILED" => SyncState::DeleteFailed,
            _ => SyncState::Unknown(value),
        }
    }
}

impl From<SyncState> for String {
    fn from(state: SyncState) -> Self {
        state.as_str().to_owned()
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementMode {
    #[default]
    Monitor,
    MonitorAndEnforce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBaseline {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineSource {
    pub branch: String,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDefinedValue {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRule {
    pub id: String,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odv: Option<OrganizationDefinedValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkTarget {
    #[serde(default)]
    pub device_groups: Vec<String>,
}

/// Create payload for `POST /v2/benchmarks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub source_baseline: SourceBaseline,
    #[serde(default)]
    pub sources: Vec<BaselineSource>,
    #[serde(default)]
    pub rules: Vec<BenchmarkRule>,
    #[serde(default)]
    pub target: BenchmarkTarget,
    #[serde(default)]
    pub enforcement_mode: EnforcementMode,
}

/// Body of a `202` from `POST /v2/benchmarks`.
///
/// The new id arrives as `benchmarkId`, `id`, or both.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccepted {
    #[serde(default)]
    pub benchmark_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl CreateAccepted {
    pub fn resolved_id(&self) -> Option<&str> {
        self.benchmark_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Benchmark as returned by the listing endpoint.
///
/// Only `id` and `syncState` drive reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResource {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sync_state: SyncState,
    #[serde(default)]
    pub source_baseline: Option<SourceBaseline>,
    #[serde(default)]
    pub sources: Vec<BaselineSource>,
    #[serde(default)]
    pub rules: Vec<BenchmarkRule>,
    #[serde(default)]
    pub target: Option<BenchmarkTarget>,
    #[serde(default)]
    pub enforcement_mode: Option<EnforcementMode>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// Body of `GET /v2/benchmarks`.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkList {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkResource>,
}

impl BenchmarkList {
    pub fn find(&self, id: &str) -> Option<&BenchmarkResource> {
        self.benchmarks.iter().find(|benchmark| benchmark.id == id)
    }
}
