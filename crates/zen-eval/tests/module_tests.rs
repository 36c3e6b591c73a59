//! Module loading tests: exports and visibility, caching, cycles, failure
//! recovery and the filesystem resolver.

use std::fs;

use pretty_assertions::assert_eq;
use zen_eval::{
    Config, Environment, Interpreter, MemoryResolver, ModuleState, ResolvedModule, Value,
};
use zen_types::{ErrorKind, Result, ZenError};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn quiet_config() -> Config {
    Config {
        echo_print: false,
        ..Config::default()
    }
}

fn with_modules(modules: &[(&str, &str)]) -> (Interpreter, MemoryResolver) {
    let resolver = MemoryResolver::new();
    for (name, source) in modules {
        resolver.insert(*name, *source);
    }
    let interp = Interpreter::with_resolver(quiet_config(), resolver.clone());
    (interp, resolver)
}

fn run(interp: &mut Interpreter, source: &str) -> Result<Value> {
    interp.evaluate(source, &Environment::root())
}

const MATH: &str = "
bag mathx
Pi = 3
scale = 10
fx Add(a, b) { return a + b }
fx Scaled(x) { return x * scale }
fx helper() { return 1 }
";

// ══════════════════════════════════════════════════════════════════════════════
// Exports
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_exported_function_call() {
    let (mut interp, _) = with_modules(&[("math", MATH)]);
    assert_eq!(run(&mut interp, "load(\"math\")\nmath.Add(5, 3)").unwrap(), Value::Integer(8));
    assert_eq!(run(&mut interp, "load(\"math\")\nmath.Pi").unwrap(), Value::Integer(3));
}

#[test]
fn test_exported_function_sees_private_module_state() {
    let (mut interp, _) = with_modules(&[("math", MATH)]);
    assert_eq!(
        run(&mut interp, "load(\"math\")\nmath.Scaled(4)").unwrap(),
        Value::Integer(40)
    );
}

#[test]
fn test_private_member_is_visibility_error() {
    let (mut interp, _) = with_modules(&[("math", MATH)]);
    let err = run(&mut interp, "load(\"math\")\nmath.helper()").unwrap_err();
    assert_eq!(err.kind, ErrorKind::VisibilityError);
    assert_eq!(err.message, "'helper' is not exported by module 'math'");
}

#[test]
fn test_missing_member_is_name_error() {
    let (mut interp, _) = with_modules(&[("math", MATH)]);
    let err = run(&mut interp, "load(\"math\")\nmath.Sub").unwrap_err();
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "module 'math' has no member 'Sub'");
}

#[test]
fn test_module_metadata() {
    let (mut interp, _) = with_modules(&[("math", MATH)]);
    let Value::Module(module) = run(&mut interp, "load(\"math\")").unwrap() else {
        panic!("load should yield the module");
    };
    assert_eq!(module.name, "math");
    assert_eq!(module.package, "mathx");
    assert_eq!(module.export_names().collect::<Vec<_>>(), ["Pi", "Add", "Scaled"]);
    assert_eq!(module.private_names().collect::<Vec<_>>(), ["scale", "helper"]);
}

#[test]
fn test_package_defaults_to_bare_name() {
    let module = Interpreter::with_resolver(
        quiet_config(),
        MemoryResolver::new().with_module("util/strings", "fx Upper(s) { return s }"),
    )
    .load_module("util/strings")
    .unwrap();
    assert_eq!(module.name, "strings");
    assert_eq!(module.package, "strings");
}

#[test]
fn test_nested_path_binds_last_segment() {
    let (mut interp, _) = with_modules(&[("util/strings", "Greeting = \"hi\"")]);
    assert_eq!(
        run(&mut interp, "load(\"util/strings\")\nstrings.Greeting").unwrap(),
        Value::string("hi")
    );
}

#[test]
fn test_load_several_modules_at_once() {
    let (mut interp, _) = with_modules(&[("a", "X = 1"), ("b", "Y = 2")]);
    assert_eq!(run(&mut interp, "load(\"a\", \"b\")\na.X + b.Y").unwrap(), Value::Integer(3));
}

// ══════════════════════════════════════════════════════════════════════════════
// Caching
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_module_is_evaluated_once() {
    let (mut interp, _) = with_modules(&[("noisy", "print(\"loading\")\nValue = 1")]);
    let env = Environment::root();
    interp.evaluate("load(\"noisy\")\nfirst = noisy", &env).unwrap();
    interp.evaluate("load(\"noisy\")", &env).unwrap();
    assert_eq!(interp.evaluate("first == noisy", &env).unwrap(), Value::Boolean(true));
    assert_eq!(interp.printed(), ["loading"]);
    assert_eq!(interp.registry().state("noisy"), ModuleState::Loaded);
    assert_eq!(interp.registry().loaded_names(), ["noisy"]);
}

#[test]
fn test_modules_loaded_from_modules_share_the_cache() {
    let (mut interp, _) = with_modules(&[
        ("base", "print(\"base\")\nN = 2"),
        ("left", "load(\"base\")\nfx L() { return base.N }"),
        ("right", "load(\"base\")\nfx R() { return base.N * 10 }"),
    ]);
    let value = run(&mut interp, "load(\"left\", \"right\")\nleft.L() + right.R()").unwrap();
    assert_eq!(value, Value::Integer(22));
    assert_eq!(interp.printed(), ["base"]);
}

#[test]
fn test_dot_zen_suffix_names_the_same_module() {
    let (mut interp, _) = with_modules(&[("m", "print(\"m\")")]);
    run(&mut interp, "load(\"m\")\nload(\"m.zen\")").unwrap();
    assert_eq!(interp.printed(), ["m"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Cycles and failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_circular_import_is_detected() {
    let (mut interp, _) = with_modules(&[("a", "load(\"b\")"), ("b", "load(\"a\")")]);
    let err = run(&mut interp, "load(\"a\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::CircularImportError);
    assert_eq!(err.message, "circular import detected: a -> b -> a");
    assert_eq!(err.file.as_deref(), Some("b"));
    assert_eq!(interp.registry().state("a"), ModuleState::NotLoaded);
    assert_eq!(interp.registry().state("b"), ModuleState::NotLoaded);
}

#[test]
fn test_self_import_is_detected() {
    let (mut interp, _) = with_modules(&[("me", "load(\"me\")")]);
    let err = run(&mut interp, "load(\"me\")").unwrap_err();
    assert_eq!(err.message, "circular import detected: me -> me");
}

#[test]
fn test_missing_module() {
    let (mut interp, _) = with_modules(&[]);
    let err = run(&mut interp, "x = 1\nload(\"ghost\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleNotFoundError);
    assert_eq!(err.span.map(|s| s.start_line), Some(2));
}

#[test]
fn test_failed_module_can_be_retried() {
    let (mut interp, resolver) = with_modules(&[("flaky", "X = 1 / 0")]);
    let err = run(&mut interp, "load(\"flaky\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ZeroDivisionError);
    assert_eq!(err.file.as_deref(), Some("flaky"));
    assert_eq!(interp.registry().state("flaky"), ModuleState::NotLoaded);

    resolver.insert("flaky", "X = 1 / 2");
    let value = run(&mut interp, "load(\"flaky\")\nflaky.X").unwrap();
    assert_eq!(value, Value::Float(0.5));
}

fn module_chain(len: usize) -> MemoryResolver {
    let resolver = MemoryResolver::new();
    for k in 0..len {
        let source = if k + 1 < len {
            format!("load(\"m{}\")\nV = {k}", k + 1)
        } else {
            format!("V = {k}")
        };
        resolver.insert(format!("m{k}"), source);
    }
    resolver
}

#[test]
fn test_long_import_chain_loads() {
    let mut interp = Interpreter::with_resolver(quiet_config(), module_chain(600));
    assert_eq!(run(&mut interp, "load(\"m0\")\nm0.V").unwrap(), Value::Integer(0));
    assert_eq!(interp.registry().state("m599"), ModuleState::Loaded);
}

#[test]
fn test_import_chain_counts_toward_call_depth() {
    let config = Config {
        max_call_depth: 50,
        ..quiet_config()
    };
    let mut interp = Interpreter::with_resolver(config, module_chain(100));
    let err = run(&mut interp, "load(\"m0\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackExhaustedError);
    assert_eq!(err.message, "maximum call depth of 50 exceeded");
    assert!(err.span.is_some());
    for k in [0, 49, 50, 99] {
        assert_eq!(interp.registry().state(&format!("m{k}")), ModuleState::NotLoaded);
    }
}

#[test]
fn test_calls_and_loads_share_the_depth_budget() {
    const DOWN: &str = "fx Down(n) { if n > 0 { return Down(n - 1) } return 0 }";
    let config = Config {
        max_call_depth: 5,
        ..quiet_config()
    };
    let resolver = MemoryResolver::new()
        .with_module("fits", format!("{DOWN}\nX = Down(3)"))
        .with_module("overflows", format!("{DOWN}\nX = Down(4)"));
    let mut interp = Interpreter::with_resolver(config, resolver);

    // One frame for the load and four for Down(3) .. Down(0).
    assert_eq!(run(&mut interp, "load(\"fits\")\nfits.X").unwrap(), Value::Integer(0));
    let err = run(&mut interp, "load(\"overflows\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackExhaustedError);
    assert_eq!(err.file.as_deref(), Some("overflows"));
}

#[test]
fn test_module_syntax_error_reports_module_file() {
    let (mut interp, _) = with_modules(&[("broken", "fx Oops( {")]);
    let err = run(&mut interp, "load(\"broken\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert_eq!(err.file.as_deref(), Some("broken"));
}

#[test]
fn test_runtime_error_in_module_function_reports_module_file() {
    let (mut interp, _) = with_modules(&[("m", "fx Boom() { return 1 + nil }")]);
    let err = run(&mut interp, "load(\"m\")\nm.Boom()").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.file.as_deref(), Some("m"));
    assert_eq!(err.span.map(|s| s.start_line), Some(1));
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolvers
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_closure_resolver() {
    let resolver = |name: &str| -> Result<ResolvedModule> {
        match name {
            "answer" => Ok(ResolvedModule {
                key: "virtual:answer".to_string(),
                source: "Value = 42".to_string(),
            }),
            _ => Err(ZenError::new(ErrorKind::ModuleNotFoundError, format!("no {name}"))),
        }
    };
    let mut interp = Interpreter::with_resolver(quiet_config(), resolver);
    assert_eq!(run(&mut interp, "load(\"answer\")\nanswer.Value").unwrap(), Value::Integer(42));
    assert_eq!(interp.registry().state("virtual:answer"), ModuleState::Loaded);
}

#[test]
fn test_filesystem_resolver() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("greet.zen"), "fx Hello(n) { return \"hi \" + n }").unwrap();
    fs::create_dir_all(dir.path().join("pkg")).unwrap();
    fs::write(dir.path().join("pkg").join("main.zen"), "Name = \"pkg\"").unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib").join("index.zen"), "Kind = \"index\"").unwrap();

    let mut interp = Interpreter::new(Config {
        module_roots: vec![dir.path().to_path_buf()],
        echo_print: false,
        ..Config::default()
    });
    let src = "load(\"greet\", \"pkg\", \"lib\")\ngreet.Hello(pkg.Name) + \" \" + lib.Kind";
    assert_eq!(run(&mut interp, src).unwrap(), Value::string("hi pkg index"));

    let err = run(&mut interp, "load(\"absent\")").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModuleNotFoundError);
    assert!(err.message.starts_with("module 'absent' not found (searched: "));
}

#[test]
fn test_filesystem_roots_are_searched_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(first.path().join("dup.zen"), "Which = 1").unwrap();
    fs::write(second.path().join("dup.zen"), "Which = 2").unwrap();
    fs::write(second.path().join("only.zen"), "Which = 3").unwrap();

    let mut interp = Interpreter::new(Config {
        module_roots: vec![first.path().to_path_buf(), second.path().to_path_buf()],
        echo_print: false,
        ..Config::default()
    });
    assert_eq!(
        run(&mut interp, "load(\"dup\", \"only\")\ndup.Which * 10 + only.Which").unwrap(),
        Value::Integer(13)
    );
}
