use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use super::pool::{panic_message, resolve_pool_size, run_pool};
use super::{AGGREGATE_MANIFEST_VERSION, RunEnv, TaskOutcome, WorkerContext};
use crate::metrics::CalcFn;
use crate::model::{AggregateData, AggregateKind, AggregatedMetricRecord, TaskFailure, TaskSummary};
use crate::util::{now_utc_string, utc_compact_string};

#[derive(Debug, Clone)]
struct VersionTask {
    document: String,
    version: String,
}

pub(super) fn run(
    env: &RunEnv,
    metric: &str,
    calculate: CalcFn,
    extra: Option<CalcFn>,
    pool_size: Option<NonZeroUsize>,
) -> Result<AggregatedMetricRecord> {
    let run_id = format!("run-{}", utc_compact_string(Utc::now()));
    let documents = env
        .source
        .list_documents()
        .with_context(|| format!("failed to enumerate documents for {metric}"))?;

    let tasks = documents
        .iter()
        .flat_map(|document| {
            env.versions.iter().map(move |version| VersionTask {
                document: document.clone(),
                version: version.to_string(),
            })
        })
        .collect::<Vec<_>>();
    let pool_size = resolve_pool_size(pool_size, tasks.len());

    info!(
        metric,
        run_id = %run_id,
        source = %env.source.describe(),
        documents = documents.len(),
        tasks = tasks.len(),
        pool_size,
        "scheduling per-version tasks"
    );

    let mut data: AggregateData = documents
        .iter()
        .map(|document| (document.clone(), BTreeMap::new()))
        .collect();
    let mut summary = TaskSummary {
        total: tasks.len(),
        ..TaskSummary::default()
    };
    let mut failures = Vec::new();

    run_pool(
        &tasks,
        pool_size,
        || env.worker_context(),
        |context, task| execute(env, metric, calculate, extra, context, task),
        |task, result| {
            let outcome = result.unwrap_or_else(|payload| {
                TaskOutcome::Failed(anyhow!("metric panicked: {}", panic_message(payload.as_ref())))
            });

            match outcome {
                TaskOutcome::Completed(value) => {
                    info!(
                        metric,
                        document = %task.document,
                        version = %task.version,
                        value = %value,
                        "task completed"
                    );
                    data.entry(task.document.clone())
                        .or_default()
                        .insert(task.version.clone(), value);
                    summary.completed += 1;
                }
                TaskOutcome::Skipped => {
                    warn!(
                        metric,
                        document = %task.document,
                        version = %task.version,
                        "version missing, task skipped"
                    );
                    summary.skipped += 1;
                }
                TaskOutcome::Failed(err) => {
                    error!(
                        metric,
                        document = %task.document,
                        version = %task.version,
                        error = %format!("{err:#}"),
                        "task failed"
                    );
                    summary.failed += 1;
                    failures.push(TaskFailure {
                        document: task.document.clone(),
                        version: Some(task.version.clone()),
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
        kind: AggregateKind::PerVersion,
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

fn execute(
    env: &RunEnv,
    metric: &str,
    calculate: CalcFn,
    extra: Option<CalcFn>,
    context: &mut WorkerContext,
    task: &VersionTask,
) -> TaskOutcome<Value> {
    let content = match env.source.load_content(&task.document, &task.version) {
        Ok(Some(content)) => content,
        Ok(None) => return TaskOutcome::Skipped,
        Err(err) => return TaskOutcome::Failed(err),
    };

    match compute(env, metric, calculate, extra, context, task, &content) {
        Ok(value) => TaskOutcome::Completed(value),
        Err(err) => TaskOutcome::Failed(err),
    }
}

fn compute(
    env: &RunEnv,
    metric: &str,
    calculate: CalcFn,
    extra: Option<CalcFn>,
    context: &mut WorkerContext,
    task: &VersionTask,
    content: &str,
) -> Result<Value> {
    let value = calculate(content, context)
        .with_context(|| format!("{metric} failed for {}/{}", task.document, task.version))?;
    let extra_value = extra
        .map(|extra| extra(content, context))
        .transpose()
        .with_context(|| {
            format!(
                "{metric} auxiliary data failed for {}/{}",
                task.document, task.version
            )
        })?;

    env.store.write_metric_result(
        metric,
        &task.document,
        &task.version,
        &value,
        extra_value.as_ref(),
    )?;

    Ok(value)
}
