use anyhow::{Context, Result};
use tracing::{info, warn};

use super::build_env;
use crate::cli::MetricArgs;
use crate::metrics::lookup;
use crate::schedule::run_metric;

pub fn run(args: MetricArgs) -> Result<()> {
    let spec = lookup(&args.name)
        .with_context(|| format!("unknown metric {} (see list-metrics)", args.name))?;
    let env = build_env(&args.run)?;

    info!(
        metric = spec.name,
        corpus_root = %args.run.corpus.corpus_root.display(),
        output_root = %args.run.corpus.output_root.display(),
        annotator = args.run.annotator.as_str(),
        "metric run requested"
    );

    let record = run_metric(&env, spec, args.run.workers)?;
    if record.summary.failed > 0 {
        warn!(
            metric = spec.name,
            failed = record.summary.failed,
            "some tasks failed; see failures in the aggregate"
        );
    }

    Ok(())
}
