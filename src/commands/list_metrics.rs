use std::io::{self, Write};

use anyhow::Result;

use crate::metrics::REGISTRY;

pub fn run() -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let width = REGISTRY
        .iter()
        .map(|spec| spec.name.len())
        .max()
        .unwrap_or_default();
    for spec in REGISTRY {
        writeln!(
            output,
            "{:<width$}  {:<11}  {}",
            spec.name,
            spec.aggregate_kind().as_str(),
            spec.description,
        )?;
    }

    output.flush()?;
    Ok(())
}
