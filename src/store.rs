use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde_json::Value;

use crate::corpus::ComparisonKey;
use crate::model::{
    AggregatedMetricRecord, ComparisonResultRecord, DocumentValues, MetricResultRecord,
};
use crate::util::{now_utc_string, read_json, write_json_pretty};

const AGGREGATE_FILE_NAME: &str = "aggregated.json";

/// Result artifacts under `<root>/<metric>/`. Paths derive from
/// `(metric, document, version | comparison)` so rewrites replace old results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metric_dir(&self, metric: &str) -> PathBuf {
        self.root.join(metric)
    }

    pub fn manifest_dir(&self) -> PathBuf {
        self.root.join("manifests")
    }

    pub fn metric_result_path(&self, metric: &str, document: &str, version: &str) -> PathBuf {
        self.metric_dir(metric)
            .join(format!("{document}__{version}.json"))
    }

    pub fn comparison_result_path(&self, metric: &str, document: &str) -> PathBuf {
        self.metric_dir(metric).join(format!("{document}.json"))
    }

    pub fn aggregate_path(&self, metric: &str) -> PathBuf {
        self.metric_dir(metric).join(AGGREGATE_FILE_NAME)
    }

    pub fn write_metric_result(
        &self,
        metric: &str,
        document: &str,
        version: &str,
        value: &Value,
        extra: Option<&Value>,
    ) -> Result<PathBuf> {
        let record = MetricResultRecord {
            metric: metric.to_string(),
            document: document.to_string(),
            version: version.to_string(),
            value: value.clone(),
            extra: extra.cloned(),
            computed_at: now_utc_string(),
        };
        let path = self.metric_result_path(metric, document, version);
        write_json_pretty(&path, &record)?;
        Ok(path)
    }

    pub fn write_comparison_result(
        &self,
        metric: &str,
        document: &str,
        comparisons: &BTreeMap<ComparisonKey, Value>,
        extra: Option<&Value>,
    ) -> Result<PathBuf> {
        let path = self.comparison_result_path(metric, document);
        if path == self.aggregate_path(metric) {
            bail!(
                "document name {document} collides with the {metric} aggregate artifact {}",
                path.display()
            );
        }

        let record = ComparisonResultRecord {
            metric: metric.to_string(),
            document: document.to_string(),
            comparisons: comparisons_by_name(comparisons),
            extra: extra.cloned(),
            computed_at: now_utc_string(),
        };
        write_json_pretty(&path, &record)?;
        Ok(path)
    }

    pub fn write_aggregate(&self, record: &AggregatedMetricRecord) -> Result<PathBuf> {
        let path = self.aggregate_path(&record.metric);
        write_json_pretty(&path, record)?;
        Ok(path)
    }

    pub fn read_aggregate(&self, metric: &str) -> Result<Option<AggregatedMetricRecord>> {
        let path = self.aggregate_path(metric);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

pub fn comparisons_by_name(comparisons: &BTreeMap<ComparisonKey, Value>) -> DocumentValues {
    comparisons
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{AggregateKind, TaskSummary};
    use crate::util::read_json;

    #[test]
    fn metric_result_rewrite_replaces_previous_value() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ResultStore::new(temp.path());

        store
            .write_metric_result("word_count", "zamek", "adult_full", &json!(10), None)
            .expect("first write");
        let path = store
            .write_metric_result(
                "word_count",
                "zamek",
                "adult_full",
                &json!(12),
                Some(&json!({"note": "rerun"})),
            )
            .expect("second write");

        assert_eq!(path, temp.path().join("word_count/zamek__adult_full.json"));
        let record: MetricResultRecord = read_json(&path).expect("record reads back");
        assert_eq!(record.value, json!(12));
        assert_eq!(record.extra, Some(json!({"note": "rerun"})));
    }

    #[test]
    fn comparison_result_uses_canonical_key_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ResultStore::new(temp.path());
        let key = ComparisonKey::new("child_short", "adult_full").expect("distinct");
        let comparisons = BTreeMap::from([(key, json!(0.5))]);

        let path = store
            .write_comparison_result("jaccard_similarity", "zamek", &comparisons, None)
            .expect("write");
        let record: ComparisonResultRecord = read_json(&path).expect("record reads back");
        assert_eq!(
            record.comparisons.get("adult_full__child_short"),
            Some(&json!(0.5))
        );
        assert!(record.extra.is_none());
    }

    #[test]
    fn comparison_result_refuses_the_aggregate_file_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ResultStore::new(temp.path());

        let err = store
            .write_comparison_result("jaccard_similarity", "aggregated", &BTreeMap::new(), None)
            .expect_err("name collides with aggregate");
        assert!(err.to_string().contains("collides"));
        assert!(!store.aggregate_path("jaccard_similarity").exists());
    }

    #[test]
    fn aggregate_round_trips_and_missing_aggregate_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ResultStore::new(temp.path());
        assert!(store.read_aggregate("ttr").expect("read").is_none());

        let record = AggregatedMetricRecord {
            manifest_version: 1,
            metric: "ttr".to_string(),
            kind: AggregateKind::PerVersion,
            run_id: "run-20260101T000000Z".to_string(),
            aggregated_at: now_utc_string(),
            pool_size: 2,
            summary: TaskSummary {
                total: 3,
                completed: 2,
                skipped: 1,
                failed: 0,
            },
            failures: Vec::new(),
            data: BTreeMap::from([(
                "zamek".to_string(),
                BTreeMap::from([("adult_full".to_string(), json!(0.7))]),
            )]),
        };
        store.write_aggregate(&record).expect("write");

        let loaded = store
            .read_aggregate("ttr")
            .expect("read")
            .expect("aggregate exists");
        assert_eq!(loaded.summary, record.summary);
        assert_eq!(loaded.data, record.data);
    }
}
