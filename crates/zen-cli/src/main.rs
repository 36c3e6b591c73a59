use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use zen_cli::{format_error, init_tracing, load_config, run_script, CliError, CliResult, Repl};

#[derive(Parser)]
#[command(author, version, about = "Zen language interpreter")]
struct Args {
    /// Script to run. Starts an interactive session when omitted.
    script: Option<PathBuf>,

    /// Report errors as JSON
    #[arg(long)]
    json: bool,

    /// Configuration file (defaults to ./zen.json when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Script { error, unit }) => {
            eprintln!("{}", format_error(&error, &unit, args.json));
            ExitCode::FAILURE
        }
        Err(other) => {
            eprintln!("error: {other}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> CliResult<()> {
    let config = load_config(std::path::Path::new("."), args.config.as_deref())?;
    match &args.script {
        Some(script) => run_script(script, config).map(|_| ()),
        None => Repl::new(config, args.json).run(),
    }
}
