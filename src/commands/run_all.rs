use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info};

use super::build_env;
use crate::cli::RunArgs;
use crate::metrics::REGISTRY;
use crate::model::{MetricRunEntry, RunAllManifest};
use crate::schedule::run_metric;
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

pub const RUN_ALL_MANIFEST_PREFIX: &str = "run_all_";

pub fn run(args: RunArgs) -> Result<()> {
    let env = build_env(&args)?;
    let documents = env
        .source
        .list_documents()
        .context("corpus check failed before scheduling")?;

    let run_id = format!("run-{}", utc_compact_string(Utc::now()));
    let manifest_path = env
        .store
        .manifest_dir()
        .join(format!("{RUN_ALL_MANIFEST_PREFIX}{run_id}.json"));
    let started_at = now_utc_string();

    let mut manifest = RunAllManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        started_at: started_at.clone(),
        updated_at: started_at,
        corpus_root: env.source.describe(),
        output_root: env.store.root().display().to_string(),
        versions: env.versions.labels().to_vec(),
        pool_size: args.workers.map(|workers| workers.get()),
        metrics: Vec::with_capacity(REGISTRY.len()),
        failed_metrics: Vec::new(),
    };

    info!(
        run_id = %run_id,
        documents = documents.len(),
        versions = env.versions.len(),
        metrics = REGISTRY.len(),
        "run-all started"
    );

    for spec in REGISTRY {
        let entry = match run_metric(&env, spec, args.workers) {
            Ok(record) => MetricRunEntry {
                metric: spec.name.to_string(),
                kind: spec.aggregate_kind(),
                status: "completed".to_string(),
                summary: Some(record.summary),
                failure_reason: None,
            },
            Err(err) => {
                let reason = format!("{err:#}");
                error!(metric = spec.name, error = %reason, "metric run failed");
                manifest.failed_metrics.push(spec.name.to_string());
                MetricRunEntry {
                    metric: spec.name.to_string(),
                    kind: spec.aggregate_kind(),
                    status: "failed".to_string(),
                    summary: None,
                    failure_reason: Some(reason),
                }
            }
        };

        manifest.metrics.push(entry);
        manifest.updated_at = now_utc_string();
        write_json_pretty(&manifest_path, &manifest)?;
    }

    let (completed, skipped, failed) = manifest
        .metrics
        .iter()
        .filter_map(|entry| entry.summary)
        .fold((0, 0, 0), |(completed, skipped, failed), summary| {
            (
                completed + summary.completed,
                skipped + summary.skipped,
                failed + summary.failed,
            )
        });

    info!(
        run_id = %run_id,
        metrics = manifest.metrics.len(),
        failed_metrics = manifest.failed_metrics.len(),
        completed,
        skipped,
        failed,
        path = %manifest_path.display(),
        "run-all completed"
    );

    if !manifest.failed_metrics.is_empty() {
        bail!(
            "{} metric run(s) failed: {}",
            manifest.failed_metrics.len(),
            manifest.failed_metrics.join(", ")
        );
    }

    Ok(())
}
