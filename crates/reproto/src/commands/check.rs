//! `reproto check` - parse and resolve without emitting.

use super::{SourceArgs, fail, report};
use crate::pipeline;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn run(args: CheckArgs) -> i32 {
    execute(args).unwrap_or_else(fail)
}

fn execute(args: CheckArgs) -> anyhow::Result<i32> {
    let settings = args.source.settings()?;
    let compilation = pipeline::check(&settings.paths, &settings.resolve)?;
    report(&compilation.diagnostics, &compilation.sources)?;

    if compilation.has_errors() {
        eprintln!(
            "error: check failed with {} error(s)",
            compilation.diagnostics.error_count()
        );
        return Ok(1);
    }
    if let Some(schema) = &compilation.schema {
        info!(packages = schema.packages.len(), "check passed");
    }
    Ok(0)
}
