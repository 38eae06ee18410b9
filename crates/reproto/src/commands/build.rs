//! `reproto build` - compile schemas and write generated code.

use super::{SourceArgs, fail, report};
use crate::pipeline;
use clap::Args;
use reproto_core::DiscriminatorPlacement;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Backend to run (repeatable), all registered backends by default
    #[arg(short, long = "target", value_name = "NAME")]
    pub targets: Vec<String>,

    /// Output root; files land in <OUT>/<target>/
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Only emit this package, `name` or `name@version` (repeatable)
    #[arg(short, long = "package", value_name = "NAME")]
    pub packages: Vec<String>,

    /// Where tagged interfaces write their discriminator: first or last
    #[arg(long, value_name = "PLACEMENT", value_parser = parse_placement)]
    pub discriminator_placement: Option<DiscriminatorPlacement>,
}

fn parse_placement(name: &str) -> Result<DiscriminatorPlacement, String> {
    DiscriminatorPlacement::parse(name)
        .ok_or_else(|| format!("expected first or last, found `{}`", name))
}

pub fn run(args: BuildArgs) -> i32 {
    execute(args).unwrap_or_else(fail)
}

fn execute(args: BuildArgs) -> anyhow::Result<i32> {
    let mut settings = args.source.settings()?;
    if !args.targets.is_empty() {
        settings.targets = args.targets;
    }
    if let Some(out) = args.out {
        settings.output = out;
    }
    if !args.packages.is_empty() {
        settings.packages = args.packages;
    }
    if let Some(placement) = args.discriminator_placement {
        settings.discriminator_placement = placement;
    }

    let outcome = pipeline::build(&settings)?;
    report(&outcome.diagnostics, &outcome.sources)?;

    info!(
        files = outcome.written.len(),
        output = %settings.output.display(),
        "build finished"
    );
    if outcome.diagnostics.has_errors() {
        eprintln!(
            "error: build failed with {} error(s), {} file(s) written",
            outcome.diagnostics.error_count(),
            outcome.written.len()
        );
        return Ok(1);
    }
    Ok(0)
}
