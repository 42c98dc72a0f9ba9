use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info};

use super::pool::{panic_message, resolve_pool_size, run_pool};
use super::{AGGREGATE_MANIFEST_VERSION, RunEnv, TaskOutcome, WorkerContext};
use crate::corpus::{ComparisonKey, DocumentSource, VersionSet};
use crate::metrics::CompareFn;
use crate::model::{AggregateData, AggregateKind, AggregatedMetricRecord, TaskFailure, TaskSummary};
use crate::store::{ResultStore, comparisons_by_name};
use crate::util::{now_utc_string, utc_compact_string};

/// What a comparison function sees of the run: one document and the means to
/// load its versions and persist its comparisons.
pub struct ComparisonScope<'a> {
    pub metric: &'a str,
    pub document: &'a str,
    pub source: &'a dyn DocumentSource,
    pub versions: &'a VersionSet,
    pub store: &'a ResultStore,
}

impl ComparisonScope<'_> {
    /// Extracts a feature from every present version, scores every pair of
    /// present versions and persists the document's comparison artifact.
    ///
    /// Absent versions drop out of the pairs; a read failure fails the task.
    pub fn pairwise<T, E, S>(
        &self,
        context: &mut WorkerContext,
        mut extract: E,
        score: S,
        extra: Option<Value>,
    ) -> Result<BTreeMap<ComparisonKey, Value>>
    where
        E: FnMut(&str, &mut WorkerContext) -> Result<T>,
        S: Fn(&T, &T) -> Value,
    {
        let mut features = BTreeMap::new();
        for version in self.versions.iter() {
            match self.source.load_content(self.document, version)? {
                Some(content) => {
                    let feature = extract(&content, context).with_context(|| {
                        format!("{} failed for {}/{}", self.metric, self.document, version)
                    })?;
                    features.insert(version, feature);
                }
                None => debug!(
                    metric = self.metric,
                    document = self.document,
                    version,
                    "version missing, excluded from comparisons"
                ),
            }
        }

        let mut comparisons = BTreeMap::new();
        for (first, second) in self.versions.pairs() {
            let (Some(left), Some(right)) = (features.get(first), features.get(second)) else {
                continue;
            };
            if let Some(key) = ComparisonKey::new(first, second) {
                comparisons.insert(key, score(left, right));
            }
        }

        self.store
            .write_comparison_result(self.metric, self.document, &comparisons, extra.as_ref())?;

        Ok(comparisons)
    }
}

pub(super) fn run(
    env: &RunEnv,
    metric: &str,
    compare: CompareFn,
    pool_size: Option<NonZeroUsize>,
) -> Result<AggregatedMetricRecord> {
    let run_id = format!("run-{}", utc_compact_string(Utc::now()));
    let documents = env
        .source
        .list_documents()
        .with_context(|| format!("failed to enumerate documents for {metric}"))?;
    let pool_size = resolve_pool_size(pool_size, documents.len());

    info!(
        metric,
        run_id = %run_id,
        source = %env.source.describe(),
        documents = documents.len(),
        pool_size,
        "scheduling comparison tasks"
    );

    let mut data = AggregateData::new();
    let mut summary = TaskSummary {
        total: documents.len(),
        ..TaskSummary::default()
    };
    let mut failures = Vec::new();

    run_pool(
        &documents,
        pool_size,
        || env.worker_context(),
        |context, document| {
            let scope = ComparisonScope {
                metric,
                document,
                source: env.source.as_ref(),
                versions: &env.versions,
                store: &env.store,
            };
            match compare(&scope, context) {
                Ok(comparisons) => TaskOutcome::Completed(comparisons),
                Err(err) => TaskOutcome::Failed(err),
            }
        },
        |document, result| {
            let outcome = result.unwrap_or_else(|payload| {
                TaskOutcome::Failed(anyhow!("metric panicked: {}", panic_message(payload.as_ref())))
            });

            match outcome {
                TaskOutcome::Completed(comparisons) => {
                    info!(
                        metric,
                        document = %document,
                        comparisons = comparisons.len(),
                        "task completed"
                    );
                    data.insert(document.clone(), comparisons_by_name(&comparisons));
                    summary.completed += 1;
                }
                TaskOutcome::Skipped => {
                    summary.skipped += 1;
                }
                TaskOutcome::Failed(err) => {
                    error!(
                        metric,
                        document = %document,
                        error = %format!("{err:#}"),
                        "task failed"
                    );
                    summary.failed += 1;
                    failures.push(TaskFailure {
                        document: document.clone(),
                        version: None,
                        error: format!("{err:#}"),
                    });
                }
            }
        },
    );

    failures.sort();

    let record = AggregatedMetricRecord {
        manifest_version: AGGREGATE_MANIFEST_VERSION,
        metric: metric.to_string(),
        kind: AggregateKind::Comparison,
        run_id,
        aggregated_at: now_utc_string(),
        pool_size,
        summary,
        failures,
        data,
    };
    let path = env.store.write_aggregate(&record)?;

    info!(
        metric,
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        path = %path.display(),
        "metric run completed"
    );

    Ok(record)
}
