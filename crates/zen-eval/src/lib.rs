//! Zen tree-walking evaluator.
//!
//! Executes parsed programs directly from the AST. Lexical scopes are shared
//! reference-counted environments so closures keep their defining scope
//! alive. Classes, instances and loaded modules are ordinary [`Value`]s.
//!
//! ```no_run
//! use zen_eval::{Config, Environment, Interpreter};
//!
//! let mut interp = Interpreter::new(Config::default());
//! let env = Environment::root();
//! let value = interp.evaluate("fx sq(x) { return x * x } sq(7)", &env)?;
//! assert_eq!(value.to_string(), "49");
//! # Ok::<(), zen_types::ZenError>(())
//! ```

pub mod builtins;
pub mod config;
pub mod env;
mod error;
pub mod evaluator;
pub mod module;
mod stack;
pub mod value;

pub use config::Config;
pub use env::{EnvRef, Environment};
pub use evaluator::{Interpreter, DEFAULT_SOURCE_NAME};
pub use module::{
    FsResolver, MemoryResolver, Module, ModuleRegistry, ModuleResolver, ModuleState,
    ResolvedModule,
};
pub use value::Value;
