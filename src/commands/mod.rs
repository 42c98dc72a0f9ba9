use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::annotate::{AnnotatorFactory, CommandAnnotatorFactory, RegexAnnotatorFactory};
use crate::cli::{AnnotatorKind, CorpusArgs, RunArgs};
use crate::corpus::{FsCorpus, VersionSet};
use crate::metrics::MetricParams;
use crate::schedule::RunEnv;
use crate::store::ResultStore;

pub mod inventory;
pub mod list_metrics;
pub mod metric;
pub mod run_all;
pub mod status;

#[cfg(test)]
mod tests;

const INVENTORY_FILE_NAME: &str = "corpus_inventory.json";

fn version_set(args: &CorpusArgs) -> Result<VersionSet> {
    VersionSet::new(args.versions.iter().cloned()).context("invalid --versions")
}

fn annotator_factory(args: &RunArgs) -> Result<Arc<dyn AnnotatorFactory>> {
    match args.annotator {
        AnnotatorKind::Regex => Ok(Arc::new(RegexAnnotatorFactory)),
        AnnotatorKind::Command => {
            let Some(program) = args.annotator_command.as_deref() else {
                bail!("--annotator command requires --annotator-command");
            };
            Ok(Arc::new(CommandAnnotatorFactory::new(
                program,
                args.annotator_args.clone(),
            )))
        }
    }
}

fn build_env(args: &RunArgs) -> Result<RunEnv> {
    Ok(RunEnv {
        source: Box::new(FsCorpus::new(args.corpus.corpus_root.clone())),
        store: ResultStore::new(args.corpus.output_root.clone()),
        versions: version_set(&args.corpus)?,
        annotators: annotator_factory(args)?,
        params: MetricParams {
            mtld_threshold: args.mtld_threshold,
            top_n_keywords: args.top_n_keywords,
        },
    })
}
