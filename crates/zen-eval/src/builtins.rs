//! Built-in functions.
//!
//! Built-ins are resolved after the scope chain, so scripts may shadow them.
//! They are never stored in an [`Environment`](crate::Environment).

use zen_types::{ErrorKind, Result, ZenError};

use crate::evaluator::Interpreter;
use crate::value::{Builtin, Value};

const BUILTINS: &[Builtin] = &[
    Builtin { name: "print", func: print },
    Builtin { name: "len", func: len },
    Builtin { name: "str", func: to_str },
    Builtin { name: "int", func: to_int },
    Builtin { name: "bool", func: to_bool },
    Builtin { name: "type", func: type_of },
];

/// Find a built-in by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

/// Names of every built-in.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

fn arity_error(name: &str, expected: usize, given: usize) -> ZenError {
    ZenError::new(
        ErrorKind::ArityError,
        format!(
            "{name}() takes {expected} argument{} but {given} were given",
            if expected == 1 { "" } else { "s" },
        ),
    )
}

/// The single argument of a one-argument built-in.
fn one_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(arity_error(name, 1, args.len())),
    }
}

fn print(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interp.emit(line);
    Ok(Value::Nil)
}

fn len(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match one_arg("len", args)? {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        other => Err(ZenError::new(
            ErrorKind::TypeError,
            format!("object of type '{}' has no len()", other.type_name()),
        )),
    }
}

fn to_str(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(match one_arg("str", args)? {
        value @ Value::String(_) => value.clone(),
        other => Value::string(other.to_string()),
    })
}

fn to_int(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    match one_arg("int", args)? {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
        Value::Float(f) => {
            let truncated = f.trunc();
            if !truncated.is_finite() {
                return Err(ZenError::new(
                    ErrorKind::TypeError,
                    format!("cannot convert float {f:?} to integer"),
                ));
            }
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(ZenError::new(
                    ErrorKind::OverflowError,
                    format!("float {f:?} is out of integer range"),
                ));
            }
            Ok(Value::Integer(truncated as i64))
        }
        Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|_| {
            ZenError::new(
                ErrorKind::TypeError,
                format!("invalid literal for int(): '{s}'"),
            )
        }),
        other => Err(ZenError::new(
            ErrorKind::TypeError,
            format!(
                "int() argument must be a number, string or boolean, not '{}'",
                other.type_name()
            ),
        )),
    }
}

fn to_bool(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::Boolean(one_arg("bool", args)?.is_truthy()))
}

fn type_of(_: &mut Interpreter, args: &[Value]) -> Result<Value> {
    Ok(Value::string(one_arg("type", args)?.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        let mut interp = Interpreter::new(Config {
            echo_print: false,
            ..Config::default()
        });
        let builtin = lookup(name).unwrap();
        (builtin.func)(&mut interp, args)
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("print").is_some());
        assert!(lookup("printf").is_none());
        assert_eq!(names().count(), 6);
    }

    #[test]
    fn test_len_counts_characters() {
        assert_eq!(call("len", &[Value::string("héllo")]).unwrap(), Value::Integer(5));
        assert_eq!(call("len", &[Value::Integer(3)]).unwrap_err().kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_arity_is_checked() {
        let err = call("str", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityError);
        assert_eq!(err.message, "str() takes 1 argument but 0 were given");
    }

    #[test]
    fn test_int_conversions() {
        assert_eq!(call("int", &[Value::Float(-2.9)]).unwrap(), Value::Integer(-2));
        assert_eq!(call("int", &[Value::string(" 42 ")]).unwrap(), Value::Integer(42));
        assert_eq!(call("int", &[Value::Boolean(true)]).unwrap(), Value::Integer(1));
        assert_eq!(call("int", &[Value::string("4x")]).unwrap_err().kind, ErrorKind::TypeError);
        assert_eq!(call("int", &[Value::Nil]).unwrap_err().kind, ErrorKind::TypeError);
        assert_eq!(call("int", &[Value::Float(1e30)]).unwrap_err().kind, ErrorKind::OverflowError);
    }

    #[test]
    fn test_str_and_bool_and_type() {
        assert_eq!(call("str", &[Value::Float(2.0)]).unwrap(), Value::string("2.0"));
        assert_eq!(call("bool", &[Value::Integer(0)]).unwrap(), Value::Boolean(true));
        assert_eq!(call("bool", &[Value::Nil]).unwrap(), Value::Boolean(false));
        assert_eq!(call("type", &[Value::Nil]).unwrap(), Value::string("nil"));
    }

    #[test]
    fn test_print_records_output() {
        let mut interp = Interpreter::new(Config {
            echo_print: false,
            ..Config::default()
        });
        let result = print(&mut interp, &[Value::string("a"), Value::Integer(1), Value::Nil]).unwrap();
        assert_eq!(result, Value::Nil);
        assert_eq!(interp.printed(), ["a 1 nil"]);
    }
}
