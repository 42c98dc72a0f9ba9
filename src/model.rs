use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-document values keyed by version label or comparison key.
pub type DocumentValues = BTreeMap<String, Value>;

/// `document -> (version | comparison key) -> value`.
pub type AggregateData = BTreeMap<String, DocumentValues>;

/// One article file as it lies on disk. Only `content` feeds the metrics.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub place_id: Option<String>,
    pub style: Option<String>,
    pub age_target: Option<String>,
    pub volume: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResultRecord {
    pub metric: String,
    pub document: String,
    pub version: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub computed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResultRecord {
    pub metric: String,
    pub document: String,
    pub comparisons: DocumentValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    pub computed_at: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    PerVersion,
    Comparison,
}

impl AggregateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerVersion => "per_version",
            Self::Comparison => "comparison",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskFailure {
    pub document: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetricRecord {
    pub manifest_version: u32,
    pub metric: String,
    pub kind: AggregateKind,
    pub run_id: String,
    pub aggregated_at: String,
    pub pool_size: usize,
    pub summary: TaskSummary,
    pub failures: Vec<TaskFailure>,
    pub data: AggregateData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionFileEntry {
    pub version: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub name: String,
    pub versions: Vec<VersionFileEntry>,
    pub missing_versions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub corpus_root: String,
    pub versions: Vec<String>,
    pub document_count: usize,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRunEntry {
    pub metric: String,
    pub kind: AggregateKind,
    pub status: String,
    pub summary: Option<TaskSummary>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAllManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub corpus_root: String,
    pub output_root: String,
    pub versions: Vec<String>,
    pub pool_size: Option<usize>,
    pub metrics: Vec<MetricRunEntry>,
    pub failed_metrics: Vec<String>,
}
