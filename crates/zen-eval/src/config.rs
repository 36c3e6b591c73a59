//! Interpreter configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for one [`Interpreter`](crate::Interpreter).
///
/// Every field has a default, so a configuration file only needs the keys
/// it changes:
///
/// ```json
/// { "module_roots": ["src", "vendor"], "max_call_depth": 500 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directories searched, in order, by the filesystem module resolver.
    pub module_roots: Vec<PathBuf>,
    /// Maximum number of active calls and nested module loads before
    /// `StackExhaustedError`.
    pub max_call_depth: usize,
    /// Whether `print` writes straight to stdout. When off, lines are kept
    /// for [`Interpreter::take_printed`](crate::Interpreter::take_printed).
    pub echo_print: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            module_roots: vec![
                PathBuf::from("."),
                PathBuf::from("./lib"),
                PathBuf::from("./modules"),
            ],
            max_call_depth: 2000,
            echo_print: true,
        }
    }
}

impl Config {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
