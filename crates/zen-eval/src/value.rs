//! Runtime values.
//!
//! [`Value`] is the single tagged variant every expression evaluates to.
//! Arithmetic, comparison, equality, truthiness and display each have one
//! dispatch point here so the evaluator never inspects kinds ad hoc.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use zen_types::ast::{BinOp, FunctionDef};
use zen_types::{ErrorKind, Result, ZenError};

use crate::env::EnvRef;
use crate::evaluator::Interpreter;
use crate::module::Module;

/// Signature of a native built-in.
pub type BuiltinFn = fn(&mut Interpreter, &[Value]) -> Result<Value>;

/// A Zen runtime value.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    Boolean(bool),
    Nil,
    Function(Rc<Function>),
    BoundMethod(Rc<BoundMethod>),
    Builtin(Builtin),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Module(Rc<Module>),
}

/// A user function paired with the scope it was created in.
pub struct Function {
    pub def: Rc<FunctionDef>,
    pub closure: EnvRef,
    /// Name of the source unit that defined the function.
    pub origin: Rc<str>,
}

impl Function {
    pub fn name(&self) -> &str {
        self.def.name.as_ref().map_or("anonymous", |n| n.name.as_str())
    }

    /// Number of declared parameters, including a leading `self`.
    pub fn arity(&self) -> usize {
        self.def.params.len()
    }
}

/// A method with its receiver already attached.
pub struct BoundMethod {
    pub receiver: Rc<Instance>,
    pub method: Rc<Function>,
}

/// A native function exposed to scripts.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

/// A class: a name and its method table.
pub struct Class {
    pub name: String,
    pub methods: IndexMap<String, Rc<Function>>,
}

impl Class {
    pub fn method(&self, name: &str) -> Option<&Rc<Function>> {
        self.methods.get(name)
    }
}

/// An object created by calling a class.
pub struct Instance {
    pub class: Rc<Class>,
    /// Field scope. Has no parent.
    pub fields: EnvRef,
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    /// The lowercase kind name reported by `type()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Nil => "nil",
            Value::Function(_) => "function",
            Value::BoundMethod(_) => "bound_method",
            Value::Builtin(_) => "builtin",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Module(_) => "module",
        }
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════════

/// Both operands widened for a numeric operation.
enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(left: &Value, right: &Value) -> Option<Numbers> {
    Some(match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Numbers::Ints(*a, *b),
        (Value::Integer(a), Value::Float(b)) => Numbers::Floats(*a as f64, *b),
        (Value::Float(a), Value::Integer(b)) => Numbers::Floats(*a, *b as f64),
        (Value::Float(a), Value::Float(b)) => Numbers::Floats(*a, *b),
        _ => return None,
    })
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> ZenError {
    ZenError::new(
        ErrorKind::TypeError,
        format!(
            "unsupported operand types for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
    )
}

fn overflow(op: BinOp) -> ZenError {
    ZenError::new(
        ErrorKind::OverflowError,
        format!("integer overflow in '{}'", op.symbol()),
    )
}

fn zero_division(op: BinOp) -> ZenError {
    let what = if op == BinOp::Div { "division" } else { "modulo" };
    ZenError::new(ErrorKind::ZeroDivisionError, format!("{what} by zero"))
}

/// Apply a non-short-circuiting binary operator.
///
/// `&&` and `||` are handled by the evaluator since they must not evaluate
/// their right operand eagerly.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinOp::Eq => Ok(Value::Boolean(left == right)),
        BinOp::NotEq => Ok(Value::Boolean(left != right)),
        BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
            let ordering = compare(op, left, right)?;
            Ok(Value::Boolean(match op {
                BinOp::Less => ordering == Ordering::Less,
                BinOp::Greater => ordering == Ordering::Greater,
                BinOp::LessEq => ordering != Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinOp::Add => {
            if let (Value::String(a), Value::String(b)) = (left, right) {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                return Ok(Value::string(joined));
            }
            arithmetic(op, left, right)
        }
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => arithmetic(op, left, right),
        BinOp::And | BinOp::Or => Err(ZenError::new(
            ErrorKind::TypeError,
            format!("'{}' must be evaluated lazily", op.symbol()),
        )),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value> {
    let nums = numbers(left, right).ok_or_else(|| unsupported(op, left, right))?;
    match (op, nums) {
        (BinOp::Div, Numbers::Ints(a, b)) => divide(a as f64, b as f64),
        (BinOp::Div, Numbers::Floats(a, b)) => divide(a, b),
        (_, Numbers::Ints(a, b)) => {
            let result = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                _ => {
                    if b == 0 {
                        return Err(zero_division(op));
                    }
                    a.checked_rem(b)
                }
            };
            result.map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (_, Numbers::Floats(a, b)) => Ok(Value::Float(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            _ => {
                if b == 0.0 {
                    return Err(zero_division(op));
                }
                a % b
            }
        })),
    }
}

fn divide(a: f64, b: f64) -> Result<Value> {
    if b == 0.0 {
        return Err(zero_division(BinOp::Div));
    }
    Ok(Value::Float(a / b))
}

/// Order two numbers or two strings.
fn compare(op: BinOp, left: &Value, right: &Value) -> Result<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    match numbers(left, right) {
        Some(Numbers::Ints(a, b)) => Ok(a.cmp(&b)),
        Some(Numbers::Floats(a, b)) => a.partial_cmp(&b).ok_or_else(|| {
            ZenError::new(ErrorKind::TypeError, "cannot order NaN")
        }),
        None => Err(ZenError::new(
            ErrorKind::TypeError,
            format!(
                "'{}' not supported between '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

/// Unary minus.
pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or_else(|| {
            ZenError::new(ErrorKind::OverflowError, "integer overflow in unary '-'")
        }),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(ZenError::new(
            ErrorKind::TypeError,
            format!("bad operand type for unary -: '{}'", other.type_name()),
        )),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Equality & Display
// ══════════════════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    /// Numbers compare numerically across kinds, primitives by value, and
    /// everything else by identity. Different kinds are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => {
                Rc::ptr_eq(&a.receiver, &b.receiver) && Rc::ptr_eq(&a.method, &b.method)
            }
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            // Debug formatting always keeps a fractional part: 3.0, not 3.
            Value::Float(n) => write!(f, "{n:?}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Nil => f.write_str("nil"),
            Value::Function(func) => write!(f, "<fx {}>", func.name()),
            Value::BoundMethod(bound) => write!(
                f,
                "<bound fx {}.{}>",
                bound.receiver.class.name,
                bound.method.name()
            ),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Value::Class(class) => write!(f, "<clx {}>", class.name),
            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name),
            Value::Module(module) => write!(f, "<module {}>", module.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}
