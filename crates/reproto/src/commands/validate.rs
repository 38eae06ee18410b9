//! `reproto validate` - check a JSON document against a declaration.
//!
//! The document is decoded with the reference codec and printed re-encoded,
//! so the output shows exactly what generated code would write back.

use super::{SourceArgs, fail, report};
use crate::pipeline;
use anyhow::Context as _;
use clap::Args;
use reproto_codec::{Codec, CodecOptions};
use std::io::Read;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Declaration to validate against, e.g. `foo.bar@1.0.0::Outer::Inner`
    #[arg(long = "type", value_name = "NAME")]
    pub ty: String,

    /// JSON document, use - for stdin (the default)
    pub input: Option<PathBuf>,
}

pub fn run(args: ValidateArgs) -> i32 {
    execute(args).unwrap_or_else(fail)
}

fn execute(args: ValidateArgs) -> anyhow::Result<i32> {
    let settings = args.source.settings()?;
    let compilation = pipeline::check(&settings.paths, &settings.resolve)?;
    report(&compilation.diagnostics, &compilation.sources)?;
    let Some(schema) = compilation.schema.as_ref() else {
        return Ok(1);
    };

    let decl = pipeline::lookup_decl(schema, &args.ty)?;
    let text = read_input(args.input.as_deref())?;
    let json: serde_json::Value = serde_json::from_str(&text).context("input is not JSON")?;

    let codec = Codec::new(
        schema,
        CodecOptions {
            discriminator_placement: settings.discriminator_placement,
        },
    );
    let value = match codec.decode(decl, &json) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error: {}", error);
            return Ok(1);
        }
    };
    let encoded = codec.encode(&value)?;
    println!("{}", serde_json::to_string_pretty(&encoded)?);
    Ok(0)
}

fn read_input(input: Option<&std::path::Path>) -> anyhow::Result<String> {
    match input {
        Some(path) if path != std::path::Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
