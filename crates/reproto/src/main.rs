use clap::{Parser, Subcommand};
use reproto::commands::{backends, build, check, validate};
use tracing_subscriber::EnvFilter;

/// Compile reproto schemas to C#, Swift and JavaScript
#[derive(Parser)]
#[command(name = "reproto", author, version, about, long_about = None)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile schemas and write generated code
    Build(build::BuildArgs),
    /// Parse and resolve schemas, reporting diagnostics
    Check(check::CheckArgs),
    /// Decode a JSON document against a declaration and print it re-encoded
    Validate(validate::ValidateArgs),
    /// List available code generation backends
    Backends,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Build(args) => build::run(args),
        Commands::Check(args) => check::run(args),
        Commands::Validate(args) => validate::run(args),
        Commands::Backends => backends::run(),
    };
    std::process::exit(code);
}
