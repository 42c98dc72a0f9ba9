use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Result;

use crate::annotate::AnnotatorFactory;
use crate::corpus::{DocumentSource, VersionSet};
use crate::metrics::{MetricKind, MetricParams, MetricSpec};
use crate::model::AggregatedMetricRecord;
use crate::store::ResultStore;

mod comparison;
mod per_version;
mod pool;
mod worker;

pub use comparison::ComparisonScope;
pub use pool::resolve_pool_size;
pub use worker::WorkerContext;

const AGGREGATE_MANIFEST_VERSION: u32 = 1;

/// Everything a metric run reads from or writes to. Fixed for the whole run.
pub struct RunEnv {
    pub source: Box<dyn DocumentSource>,
    pub store: ResultStore,
    pub versions: VersionSet,
    pub annotators: Arc<dyn AnnotatorFactory>,
    pub params: MetricParams,
}

impl RunEnv {
    fn worker_context(&self) -> WorkerContext {
        WorkerContext::new(Arc::clone(&self.annotators), self.params)
    }
}

/// Result of one scheduled task.
#[derive(Debug)]
pub enum TaskOutcome<V> {
    Completed(V),
    Skipped,
    Failed(anyhow::Error),
}

/// Runs one registered metric over the whole corpus and persists its aggregate.
///
/// Fails only when the corpus cannot be enumerated or the aggregate cannot be
/// written; individual task failures are recorded in the returned record.
pub fn run_metric(
    env: &RunEnv,
    spec: &MetricSpec,
    pool_size: Option<NonZeroUsize>,
) -> Result<AggregatedMetricRecord> {
    match spec.kind {
        MetricKind::PerVersion { calculate, extra } => {
            per_version::run(env, spec.name, calculate, extra, pool_size)
        }
        MetricKind::Comparison { compare } => comparison::run(env, spec.name, compare, pool_size),
    }
}
