//! Evaluator-internal control flow.

use zen_types::ZenError;

use crate::value::Value;

/// Why evaluation of a statement stopped early.
///
/// `return` travels through the same `Err` channel as language errors so
/// `?` unwinds nested blocks. It is intercepted at the call boundary and at
/// the top of a program; callers of the interpreter only ever see
/// [`ZenError`].
pub(crate) enum Unwind {
    /// `return` statement with its value.
    Return(Value),
    /// A language error.
    Error(ZenError),
}

impl From<ZenError> for Unwind {
    fn from(err: ZenError) -> Self {
        Unwind::Error(err)
    }
}

/// Result alias for statement and expression evaluation.
pub(crate) type EvalResult<T> = Result<T, Unwind>;

/// Stop unwinding at a call or program boundary.
pub(crate) fn catch_return(result: EvalResult<Value>, fallthrough: impl FnOnce(Value) -> Value) -> zen_types::Result<Value> {
    match result {
        Ok(value) => Ok(fallthrough(value)),
        Err(Unwind::Return(value)) => Ok(value),
        Err(Unwind::Error(err)) => Err(err),
    }
}
