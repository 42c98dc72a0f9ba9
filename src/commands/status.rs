use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::INVENTORY_FILE_NAME;
use super::run_all::RUN_ALL_MANIFEST_PREFIX;
use crate::cli::StatusArgs;
use crate::metrics::REGISTRY;
use crate::model::{CorpusInventoryManifest, RunAllManifest};
use crate::store::ResultStore;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let store = ResultStore::new(args.corpus.output_root.clone());
    let manifest_dir = store.manifest_dir();
    let inventory_path = manifest_dir.join(INVENTORY_FILE_NAME);

    info!(
        corpus_root = %args.corpus.corpus_root.display(),
        output_root = %store.root().display(),
        "status requested"
    );

    if inventory_path.exists() {
        let inventory: CorpusInventoryManifest = read_json(&inventory_path)?;
        let incomplete = inventory
            .documents
            .iter()
            .filter(|document| !document.missing_versions.is_empty())
            .count();
        info!(
            generated_at = %inventory.generated_at,
            document_count = inventory.document_count,
            incomplete,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_run_all_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: RunAllManifest = read_json(&path)?;
            info!(
                run_id = %manifest.run_id,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                metrics = manifest.metrics.len(),
                failed_metrics = %manifest.failed_metrics.join(","),
                "loaded run-all manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no run-all manifest found"),
    }

    for spec in REGISTRY {
        match store.read_aggregate(spec.name)? {
            Some(record) => info!(
                metric = spec.name,
                kind = record.kind.as_str(),
                run_id = %record.run_id,
                aggregated_at = %record.aggregated_at,
                documents = record.data.len(),
                completed = record.summary.completed,
                skipped = record.summary.skipped,
                failed = record.summary.failed,
                "aggregate status"
            ),
            None => warn!(metric = spec.name, "aggregate missing"),
        }
    }

    Ok(())
}

/// Run ids embed a compact UTC timestamp, so the greatest file name is the latest run.
fn latest_run_all_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let is_run_all = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(RUN_ALL_MANIFEST_PREFIX) && name.ends_with(".json"))
            .unwrap_or(false);
        if is_run_all && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
