//! Configuration loading and script execution.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use zen_eval::{Config, Environment, Interpreter, Value};
use zen_types::SourceFile;

use crate::error::{CliError, CliResult};

/// Configuration file picked up from the working directory.
pub const CONFIG_FILE: &str = "zen.json";

fn read(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the interpreter configuration.
///
/// An explicit path must exist. Otherwise `zen.json` in `dir` is used when
/// present, and the defaults when it is not.
pub fn load_config(dir: &Path, explicit: Option<&Path>) -> CliResult<Config> {
    let path: PathBuf = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = dir.join(CONFIG_FILE);
            if !candidate.is_file() {
                debug!("no {CONFIG_FILE}, using default configuration");
                return Ok(Config::default());
            }
            candidate
        }
    };
    let text = read(&path)?;
    let config = Config::from_json_str(&text).map_err(|source| CliError::Config {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), ?config, "configuration loaded");
    Ok(config)
}

/// Run a script in a fresh top-level environment.
///
/// Output captured with `echo_print` off is written to stdout once the
/// script stops, whether or not it failed.
pub fn run_script(path: &Path, config: Config) -> CliResult<Value> {
    let unit = SourceFile::new(path.display().to_string(), read(path)?);
    let mut interpreter = Interpreter::new(config);
    let result = interpreter.evaluate_source(&unit, &Environment::root());
    flush_printed(&mut interpreter);
    result.map_err(|error| CliError::Script { error, unit })
}

/// Write out and drop any `print` lines the interpreter is holding.
pub(crate) fn flush_printed(interpreter: &mut Interpreter) {
    for line in interpreter.take_printed() {
        println!("{line}");
    }
}
