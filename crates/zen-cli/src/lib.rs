//! Front end for the `zen` binary.
//!
//! Loads configuration, runs scripts and hosts the interactive loop. The
//! language itself lives in `zen-eval`.

pub mod error;
pub mod repl;
pub mod runner;

pub use error::{format_error, CliError, CliResult};
pub use repl::{needs_more_input, Repl};
pub use runner::{load_config, run_script, CONFIG_FILE};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=zen_eval=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
