//! Modules, the load-state registry and source resolvers.
//!
//! A module is one source unit evaluated in its own top-level scope. Its
//! bindings are split by name: a name whose first character is uppercase is
//! exported, everything else is private to the module.
//!
//! [`ModuleRegistry`] tracks each canonical key through
//! `NotLoaded → Loading → Loaded`. The interpreter drives the actual
//! evaluation and reports back through [`ModuleRegistry::begin`],
//! [`ModuleRegistry::complete`] and [`ModuleRegistry::abort`].

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;
use zen_types::{ErrorKind, Result, ZenError};

use crate::env::Environment;
use crate::value::Value;

/// File extension of Zen source files.
pub const SOURCE_EXTENSION: &str = "zen";

/// Whether a module-level name is visible from outside the module.
///
/// Names starting with `__` are always private.
pub fn is_exported(name: &str) -> bool {
    !name.starts_with("__") && name.chars().next().is_some_and(char::is_uppercase)
}

/// The name a loaded module is bound under: the last `/` segment of the
/// load path with any `.zen` suffix removed.
pub fn bare_name(path: &str) -> &str {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.strip_suffix(".zen").unwrap_or(last)
}

// ══════════════════════════════════════════════════════════════════════════════
// Module
// ══════════════════════════════════════════════════════════════════════════════

/// A loaded source unit.
///
/// Immutable once its top-level evaluation has finished.
#[derive(Debug)]
pub struct Module {
    /// Bare name the module is bound under.
    pub name: String,
    /// Canonical cache key reported by the resolver.
    pub key: String,
    /// Package declared with `bag`, or the bare name.
    pub package: String,
    exports: IndexMap<String, Value>,
    private: IndexMap<String, Value>,
}

impl Module {
    /// Partition the top-level bindings of `env` into exports and privates.
    pub fn from_scope(
        name: impl Into<String>,
        key: impl Into<String>,
        package: impl Into<String>,
        env: &Environment,
    ) -> Self {
        let mut exports = IndexMap::new();
        let mut private = IndexMap::new();
        for (binding, value) in env.bindings() {
            let target = if is_exported(binding) {
                &mut exports
            } else {
                &mut private
            };
            target.insert(binding.to_string(), value.clone());
        }
        Self {
            name: name.into(),
            key: key.into(),
            package: package.into(),
            exports,
            private,
        }
    }

    /// Read an exported member.
    ///
    /// A private member fails with `VisibilityError`, a missing one with
    /// `NameError`.
    pub fn get_export(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.exports.get(name) {
            return Ok(value.clone());
        }
        if self.private.contains_key(name) {
            return Err(ZenError::new(
                ErrorKind::VisibilityError,
                format!("'{name}' is not exported by module '{}'", self.name),
            ));
        }
        Err(ZenError::new(
            ErrorKind::NameError,
            format!("module '{}' has no member '{name}'", self.name),
        ))
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    pub fn private_names(&self) -> impl Iterator<Item = &str> {
        self.private.keys().map(String::as_str)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Registry
// ══════════════════════════════════════════════════════════════════════════════

/// Load state of one module key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    NotLoaded,
    Loading,
    Loaded,
}

enum Entry {
    Loading,
    Loaded(Rc<Module>),
}

/// Cache of loaded modules with per-key load state.
///
/// Scoped to one interpreter. A key absent from the table is `NotLoaded`.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: IndexMap<String, Entry>,
    /// Keys currently being evaluated, outermost first, with the name each
    /// was requested under.
    loading: Vec<(String, String)>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &str) -> ModuleState {
        match self.entries.get(key) {
            None => ModuleState::NotLoaded,
            Some(Entry::Loading) => ModuleState::Loading,
            Some(Entry::Loaded(_)) => ModuleState::Loaded,
        }
    }

    /// The cached module for `key`, if it finished loading.
    pub fn get(&self, key: &str) -> Option<Rc<Module>> {
        match self.entries.get(key) {
            Some(Entry::Loaded(module)) => Some(Rc::clone(module)),
            _ => None,
        }
    }

    /// Start loading `key`.
    ///
    /// Returns the cached module when `key` is already loaded, in which case
    /// the caller must not evaluate it again. Fails with
    /// `CircularImportError` when `key` is still loading further up the
    /// chain. Otherwise marks `key` as loading and returns `None`.
    pub fn begin(&mut self, key: &str, name: &str) -> Result<Option<Rc<Module>>> {
        match self.entries.get(key) {
            Some(Entry::Loaded(module)) => {
                debug!(module = name, "module cache hit");
                return Ok(Some(Rc::clone(module)));
            }
            Some(Entry::Loading) => {
                let start = self
                    .loading
                    .iter()
                    .position(|(k, _)| k == key)
                    .unwrap_or(0);
                let mut cycle: Vec<&str> = self.loading[start..]
                    .iter()
                    .map(|(_, n)| n.as_str())
                    .collect();
                cycle.push(name);
                return Err(ZenError::new(
                    ErrorKind::CircularImportError,
                    format!("circular import detected: {}", cycle.join(" -> ")),
                ));
            }
            None => {}
        }
        debug!(module = name, key, "module loading");
        self.entries.insert(key.to_string(), Entry::Loading);
        self.loading.push((key.to_string(), name.to_string()));
        Ok(None)
    }

    /// Mark `key` as loaded and cache its module.
    pub fn complete(&mut self, key: &str, module: Rc<Module>) {
        debug!(module = %module.name, key, "module loaded");
        self.pop_loading(key);
        self.entries.insert(key.to_string(), Entry::Loaded(module));
    }

    /// Return `key` to `NotLoaded` after a failed load so it can be retried.
    pub fn abort(&mut self, key: &str) {
        debug!(key, "module load failed");
        self.pop_loading(key);
        self.entries.shift_remove(key);
    }

    fn pop_loading(&mut self, key: &str) {
        if let Some(pos) = self.loading.iter().rposition(|(k, _)| k == key) {
            self.loading.remove(pos);
        }
    }

    /// Keys of every module that finished loading.
    pub fn loaded_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Loaded(_)))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolvers
// ══════════════════════════════════════════════════════════════════════════════

/// Source text located for a module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Canonical cache key. Two names resolving to the same key share one
    /// module.
    pub key: String,
    pub source: String,
}

/// Maps a module name to its source.
///
/// Implemented for closures so embedders can inject a lookup function.
pub trait ModuleResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedModule>;
}

impl<F> ModuleResolver for F
where
    F: Fn(&str) -> Result<ResolvedModule>,
{
    fn resolve(&self, name: &str) -> Result<ResolvedModule> {
        self(name)
    }
}

fn not_found(name: &str, detail: impl std::fmt::Display) -> ZenError {
    ZenError::new(
        ErrorKind::ModuleNotFoundError,
        format!("module '{name}' not found ({detail})"),
    )
}

/// Resolves module names against a list of directories.
///
/// For each root in order, `name` is tried as `name.zen`, `name/main.zen`
/// and `name/index.zen`. A name that already ends in `.zen` is used as is.
#[derive(Debug, Clone)]
pub struct FsResolver {
    roots: Vec<PathBuf>,
}

impl FsResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn candidates(name: &str) -> Vec<PathBuf> {
        let ext = format!(".{SOURCE_EXTENSION}");
        if name.ends_with(&ext) {
            return vec![PathBuf::from(name)];
        }
        vec![
            PathBuf::from(format!("{name}{ext}")),
            Path::new(name).join(format!("main{ext}")),
            Path::new(name).join(format!("index{ext}")),
        ]
    }
}

impl ModuleResolver for FsResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedModule> {
        let candidates = Self::candidates(name);
        for root in &self.roots {
            for candidate in &candidates {
                let path = root.join(candidate);
                if !path.is_file() {
                    continue;
                }
                let source = std::fs::read_to_string(&path)
                    .map_err(|e| not_found(name, format!("{}: {e}", path.display())))?;
                let key = std::fs::canonicalize(&path)
                    .unwrap_or(path)
                    .display()
                    .to_string();
                debug!(module = name, path = %key, "resolved module");
                return Ok(ResolvedModule { key, source });
            }
        }
        let searched: Vec<String> = self
            .roots
            .iter()
            .map(|r| r.display().to_string())
            .collect();
        Err(not_found(name, format!("searched: {}", searched.join(", "))))
    }
}

/// In-memory module table.
///
/// Clones share one table, so modules can be added after the resolver has
/// been handed to an interpreter.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    modules: Rc<RefCell<IndexMap<String, String>>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryResolver::insert`].
    pub fn with_module(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }

    /// Add or replace a module's source.
    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        self.modules.borrow_mut().insert(name.into(), source.into());
    }
}

impl ModuleResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedModule> {
        let key = name.strip_suffix(".zen").unwrap_or(name);
        self.modules
            .borrow()
            .get(key)
            .map(|source| ResolvedModule {
                key: key.to_string(),
                source: source.clone(),
            })
            .ok_or_else(|| not_found(name, "no such module registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_rule() {
        assert!(is_exported("Add"));
        assert!(is_exported("PI"));
        assert!(is_exported("Ärger"));
        assert!(!is_exported("add"));
        assert!(!is_exported("_Hidden"));
        assert!(!is_exported("__Init__"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("math"), "math");
        assert_eq!(bare_name("util/strings"), "strings");
        assert_eq!(bare_name("lib/geo.zen"), "geo");
    }

    #[test]
    fn test_partition_and_get_export() {
        let env = Environment::root();
        env.borrow_mut().define("Add", Value::Integer(1));
        env.borrow_mut().define("helper", Value::Integer(2));
        let module = Module::from_scope("m", "m", "m", &env.borrow());

        assert_eq!(module.export_names().collect::<Vec<_>>(), vec!["Add"]);
        assert_eq!(module.private_names().collect::<Vec<_>>(), vec!["helper"]);
        assert_eq!(module.get_export("Add").unwrap(), Value::Integer(1));
        assert_eq!(module.get_export("helper").unwrap_err().kind, ErrorKind::VisibilityError);
        assert_eq!(module.get_export("Nope").unwrap_err().kind, ErrorKind::NameError);
    }

    #[test]
    fn test_registry_state_machine() {
        let mut registry = ModuleRegistry::new();
        assert_eq!(registry.state("a"), ModuleState::NotLoaded);

        assert!(registry.begin("a", "a").unwrap().is_none());
        assert_eq!(registry.state("a"), ModuleState::Loading);

        let env = Environment::root();
        let module = Rc::new(Module::from_scope("a", "a", "a", &env.borrow()));
        registry.complete("a", Rc::clone(&module));
        assert_eq!(registry.state("a"), ModuleState::Loaded);

        let cached = registry.begin("a", "a").unwrap().unwrap();
        assert!(Rc::ptr_eq(&cached, &module));
        assert_eq!(registry.loaded_names(), vec!["a"]);
    }

    #[test]
    fn test_registry_detects_cycle_with_path() {
        let mut registry = ModuleRegistry::new();
        registry.begin("a", "a").unwrap();
        registry.begin("b", "b").unwrap();
        let err = registry.begin("a", "a").unwrap_err();
        assert_eq!(err.kind, ErrorKind::CircularImportError);
        assert_eq!(err.message, "circular import detected: a -> b -> a");
    }

    #[test]
    fn test_registry_abort_allows_retry() {
        let mut registry = ModuleRegistry::new();
        registry.begin("a", "a").unwrap();
        registry.abort("a");
        assert_eq!(registry.state("a"), ModuleState::NotLoaded);
        assert!(registry.begin("a", "a").unwrap().is_none());
        assert!(registry.loaded_names().is_empty());
    }

    #[test]
    fn test_memory_resolver_shares_table_between_clones() {
        let resolver = MemoryResolver::new();
        let handle = resolver.clone();
        assert_eq!(
            resolver.resolve("m").unwrap_err().kind,
            ErrorKind::ModuleNotFoundError
        );
        handle.insert("m", "X = 1");
        let resolved = resolver.resolve("m.zen").unwrap();
        assert_eq!(resolved.key, "m");
        assert_eq!(resolved.source, "X = 1");
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| -> Result<ResolvedModule> {
            Ok(ResolvedModule {
                key: format!("mem:{name}"),
                source: String::new(),
            })
        };
        assert_eq!(resolver.resolve("x").unwrap().key, "mem:x");
    }
}
