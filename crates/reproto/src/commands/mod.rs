//! Command implementations for the `reproto` binary.

pub mod backends;
pub mod build;
pub mod check;
pub mod validate;

use crate::config::ReprotoConfig;
use crate::pipeline::BuildSettings;
use clap::Args;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use reproto_core::{Diagnostics, Sources, VersionScheme};
use std::path::PathBuf;

/// Source and config options shared by every compiling command.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory searched for `*.reproto` files (repeatable)
    #[arg(long = "path", value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Config file to use instead of ./reproto.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Version segment encoding: underscored, major or minimal
    #[arg(long, value_name = "SCHEME", value_parser = parse_version_scheme)]
    pub version_scheme: Option<VersionScheme>,
}

impl SourceArgs {
    /// Settings from the config files, overridden by these flags.
    pub fn settings(&self) -> anyhow::Result<BuildSettings> {
        let root = std::env::current_dir()?;
        let config = ReprotoConfig::load(&root, self.config.as_deref())?;
        let mut settings = BuildSettings::from_config(&config);
        if !self.paths.is_empty() {
            settings.paths = self.paths.clone();
        }
        if let Some(scheme) = self.version_scheme {
            settings.resolve.version_scheme = scheme;
        }
        Ok(settings)
    }
}

fn parse_version_scheme(name: &str) -> Result<VersionScheme, String> {
    VersionScheme::parse(name)
        .ok_or_else(|| format!("expected underscored, major or minimal, found `{}`", name))
}

/// Render diagnostics to stderr.
pub(crate) fn report(diagnostics: &Diagnostics, sources: &Sources) -> anyhow::Result<()> {
    let mut writer = StandardStream::stderr(ColorChoice::Auto);
    diagnostics.emit(&mut writer, sources)?;
    Ok(())
}

/// Print an error chain and return the failure exit code.
pub(crate) fn fail(error: anyhow::Error) -> i32 {
    eprintln!("error: {:#}", error);
    1
}
