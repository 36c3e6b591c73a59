//! Core expression and statement evaluator.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};
use zen_types::ast::*;
use zen_types::{ErrorKind, Result, SourceFile, Span, ZenError};

use crate::builtins;
use crate::config::Config;
use crate::env::{EnvRef, Environment};
use crate::error::{catch_return, EvalResult, Unwind};
use crate::module::{bare_name, FsResolver, Module, ModuleRegistry, ModuleResolver};
use crate::stack::ensure_sufficient_stack;
use crate::value::{self, BoundMethod, Class, Function, Instance, Value};

/// Source name used by [`Interpreter::evaluate`].
pub const DEFAULT_SOURCE_NAME: &str = "<input>";

/// The tree-walking interpreter.
///
/// Owns the module registry and the resolver used by `load`. Scopes are
/// supplied by the caller, so one interpreter can run many programs against
/// the same or different environments.
pub struct Interpreter {
    config: Config,
    registry: ModuleRegistry,
    resolver: Box<dyn ModuleResolver>,
    /// Number of active calls.
    call_depth: usize,
    /// Name of the source unit currently being evaluated.
    current_file: Rc<str>,
    /// Captured output from `print`.
    printed: Vec<String>,
}

impl Interpreter {
    /// Create an interpreter that loads modules from `config.module_roots`.
    pub fn new(config: Config) -> Self {
        let resolver = FsResolver::new(config.module_roots.clone());
        Self::with_resolver(config, resolver)
    }

    /// Create an interpreter with a custom module resolver.
    pub fn with_resolver(config: Config, resolver: impl ModuleResolver + 'static) -> Self {
        Self {
            config,
            registry: ModuleRegistry::new(),
            resolver: Box::new(resolver),
            call_depth: 0,
            current_file: Rc::from(DEFAULT_SOURCE_NAME),
            printed: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Lines written by `print` and not yet drained. Only filled while
    /// `echo_print` is off.
    pub fn printed(&self) -> &[String] {
        &self.printed
    }

    /// Drain the captured `print` output.
    pub fn take_printed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.printed)
    }

    /// Write one line of program output, or capture it when echo is off.
    pub(crate) fn emit(&mut self, line: String) {
        if self.config.echo_print {
            println!("{line}");
        } else {
            self.printed.push(line);
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════

    /// Lex, parse and evaluate `source` in `env`.
    ///
    /// Returns the value of the last statement executed, or the value of a
    /// top-level `return`.
    pub fn evaluate(&mut self, source: &str, env: &EnvRef) -> Result<Value> {
        self.evaluate_source(&SourceFile::new(DEFAULT_SOURCE_NAME, source), env)
    }

    /// Like [`Interpreter::evaluate`], reporting errors against `source.name`.
    pub fn evaluate_source(&mut self, source: &SourceFile, env: &EnvRef) -> Result<Value> {
        let program = zen_parser::parse(source)?;
        let file: Rc<str> = Rc::from(source.name.as_str());
        self.run_program(&program, env, file)
    }

    /// Evaluate an already parsed program.
    pub fn run_program(&mut self, program: &Program, env: &EnvRef, file: Rc<str>) -> Result<Value> {
        let previous = std::mem::replace(&mut self.current_file, Rc::clone(&file));
        let result = catch_return(self.exec_stmts(&program.stmts, env), |v| v);
        self.current_file = previous;
        result.map_err(|e| e.with_file(&*file))
    }

    /// Load a module by name, evaluating it at most once.
    pub fn load_module(&mut self, name: &str) -> Result<Rc<Module>> {
        let resolved = self.resolver.resolve(name)?;
        let bare = bare_name(name);
        if let Some(cached) = self.registry.begin(&resolved.key, bare)? {
            return Ok(cached);
        }

        let source = SourceFile::new(resolved.key.clone(), resolved.source);
        match self.with_frame(None, |this| this.evaluate_module(bare, &source)) {
            Ok(module) => {
                let module = Rc::new(module);
                self.registry.complete(&resolved.key, Rc::clone(&module));
                Ok(module)
            }
            Err(err) => {
                self.registry.abort(&resolved.key);
                Err(err)
            }
        }
    }

    fn evaluate_module(&mut self, bare: &str, source: &SourceFile) -> Result<Module> {
        let program = zen_parser::parse(source)?;
        let env = Environment::root();
        self.run_program(&program, &env, Rc::from(source.name.as_str()))?;
        let package = program.package().map_or(bare, |p| p.name.as_str());
        let module = Module::from_scope(bare, source.name.as_str(), package, &env.borrow());
        Ok(module)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    /// Run statements in order, yielding the value of the last one.
    fn exec_stmts(&mut self, stmts: &[Stmt], env: &EnvRef) -> EvalResult<Value> {
        let mut last = Value::Nil;
        for stmt in stmts {
            last = self.exec_stmt(stmt, env)?;
        }
        Ok(last)
    }

    /// Run a block in a fresh child scope.
    fn exec_block(&mut self, block: &Block, env: &EnvRef) -> EvalResult<Value> {
        let scope = Environment::child(env);
        self.exec_stmts(&block.stmts, &scope)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> EvalResult<Value> {
        match stmt {
            Stmt::Function(def) => {
                let func = self.make_function(def, env);
                if let Some(name) = &def.name {
                    env.borrow_mut().define(name.name.clone(), func.clone());
                }
                Ok(func)
            }
            Stmt::Class(decl) => {
                let class = self.make_class(decl, env);
                env.borrow_mut().define(decl.name.name.clone(), class.clone());
                Ok(class)
            }
            Stmt::If(if_stmt) => self.exec_if(if_stmt, env),
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Load(load) => {
                let mut last = Value::Nil;
                for path in &load.paths {
                    let module = self
                        .load_module(&path.path)
                        .map_err(|e| e.with_span(path.span))?;
                    let value = Value::Module(module);
                    env.borrow_mut().define(bare_name(&path.path), value.clone());
                    last = value;
                }
                Ok(last)
            }
            Stmt::Package(_) => Ok(Value::Nil),
            Stmt::Block(block) => self.exec_block(block, env),
            Stmt::Expr(expr_stmt) => self.eval_expr(&expr_stmt.expr, env),
        }
    }

    fn exec_if(&mut self, if_stmt: &IfStmt, env: &EnvRef) -> EvalResult<Value> {
        let condition = self.eval_expr(&if_stmt.condition, env)?;
        if condition.is_truthy() {
            return self.exec_block(&if_stmt.then_block, env);
        }
        match &if_stmt.else_branch {
            Some(ElseBranch::ElseIf(nested)) => ensure_sufficient_stack(|| self.exec_if(nested, env)),
            Some(ElseBranch::Block(block)) => self.exec_block(block, env),
            None => Ok(Value::Nil),
        }
    }

    fn make_function(&self, def: &Rc<FunctionDef>, env: &EnvRef) -> Value {
        Value::Function(Rc::new(Function {
            def: Rc::clone(def),
            closure: Rc::clone(env),
            origin: Rc::clone(&self.current_file),
        }))
    }

    fn make_class(&self, decl: &ClassDecl, env: &EnvRef) -> Value {
        let methods: IndexMap<String, Rc<Function>> = decl
            .methods
            .iter()
            .map(|def| {
                let func = Rc::new(Function {
                    def: Rc::clone(def),
                    closure: Rc::clone(env),
                    origin: Rc::clone(&self.current_file),
                });
                (func.name().to_string(), func)
            })
            .collect();
        Value::Class(Rc::new(Class {
            name: decl.name.name.clone(),
            methods,
        }))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval_expr(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, env))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, env: &EnvRef) -> EvalResult<Value> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::IntLit(n) => Ok(Value::Integer(*n)),
            ExprKind::FloatLit(n) => Ok(Value::Float(*n)),
            ExprKind::StringLit(s) => Ok(Value::string(s.as_str())),
            ExprKind::BoolLit(b) => Ok(Value::Boolean(*b)),
            ExprKind::NilLit => Ok(Value::Nil),

            ExprKind::SelfRef => Environment::lookup(env, "self").ok_or_else(|| {
                ZenError::at(
                    ErrorKind::NameError,
                    "'self' is only available inside methods",
                    span,
                )
                .into()
            }),
            ExprKind::Identifier(name) => Ok(self.eval_identifier(name, env, span)?),

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                    UnaryOp::Neg => Ok(value::negate(&value).map_err(|e| e.with_span(span))?),
                }
            }
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, env, span),

            ExprKind::Call { callee, args } => {
                let callee = self.eval_expr(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                Ok(self.call_value(&callee, values, span)?)
            }
            ExprKind::Member { object, member } => {
                let object = self.eval_expr(object, env)?;
                Ok(self.get_member(&object, member)?)
            }
            ExprKind::Assign { target, value } => self.eval_assign(target, value, env),
            ExprKind::Function(def) => Ok(self.make_function(def, env)),
        }
    }

    /// Resolve a name against the scope chain, then the built-ins.
    fn eval_identifier(&self, name: &str, env: &EnvRef, span: Span) -> Result<Value> {
        if let Some(value) = Environment::lookup(env, name) {
            return Ok(value);
        }
        if let Some(builtin) = builtins::lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(ZenError::at(
            ErrorKind::NameError,
            format!("undefined variable '{name}'"),
            span,
        ))
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        env: &EnvRef,
        span: Span,
    ) -> EvalResult<Value> {
        let lv = self.eval_expr(left, env)?;
        // Logical operators yield the operand that decided the result.
        match op {
            BinOp::And if !lv.is_truthy() => return Ok(lv),
            BinOp::Or if lv.is_truthy() => return Ok(lv),
            BinOp::And | BinOp::Or => return self.eval_expr(right, env),
            _ => {}
        }
        let rv = self.eval_expr(right, env)?;
        Ok(value::binary(op, &lv, &rv).map_err(|e| e.with_span(span))?)
    }

    /// `name = v` rebinds an existing name anywhere in the chain, or defines
    /// it in the current scope. `obj.field = v` writes an instance field.
    fn eval_assign(&mut self, target: &AssignTarget, value: &Expr, env: &EnvRef) -> EvalResult<Value> {
        match target {
            AssignTarget::Name(ident) => {
                let value = self.eval_expr(value, env)?;
                if let Err(value) = Environment::assign_existing(env, &ident.name, value.clone()) {
                    env.borrow_mut().define(ident.name.clone(), value);
                }
                Ok(value)
            }
            AssignTarget::Member { object, member } => {
                let object = self.eval_expr(object, env)?;
                let value = self.eval_expr(value, env)?;
                match &object {
                    Value::Instance(instance) => {
                        instance
                            .fields
                            .borrow_mut()
                            .define(member.name.clone(), value.clone());
                        Ok(value)
                    }
                    other => Err(ZenError::at(
                        ErrorKind::TypeError,
                        format!(
                            "cannot set member '{}' on a value of type '{}'",
                            member.name,
                            other.type_name()
                        ),
                        member.span,
                    )
                    .into()),
                }
            }
        }
    }

    /// `object.member`
    fn get_member(&self, object: &Value, member: &Ident) -> Result<Value> {
        let name = member.name.as_str();
        let missing = |owner: String| {
            ZenError::at(
                ErrorKind::NameError,
                format!("{owner} has no attribute '{name}'"),
                member.span,
            )
        };
        match object {
            Value::Instance(instance) => {
                if let Some(field) = instance.fields.borrow().get_local(name) {
                    return Ok(field);
                }
                match instance.class.method(name) {
                    Some(method) => Ok(Value::BoundMethod(Rc::new(BoundMethod {
                        receiver: Rc::clone(instance),
                        method: Rc::clone(method),
                    }))),
                    None => Err(missing(format!("'{}' instance", instance.class.name))),
                }
            }
            Value::Class(class) => class
                .method(name)
                .map(|method| Value::Function(Rc::clone(method)))
                .ok_or_else(|| missing(format!("class '{}'", class.name))),
            Value::Module(module) => module.get_export(name).map_err(|e| e.with_span(member.span)),
            other => Err(ZenError::at(
                ErrorKind::TypeError,
                format!("value of type '{}' has no attribute '{name}'", other.type_name()),
                member.span,
            )),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    /// Call any callable value with already evaluated arguments.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> Result<Value> {
        self.with_frame(Some(span), |this| this.dispatch_call(callee, args, span))
    }

    /// Run `f` one frame deeper. Function calls and module loads both count
    /// against `max_call_depth`.
    fn with_frame<T>(
        &mut self,
        span: Option<Span>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.call_depth >= self.config.max_call_depth {
            let err = ZenError::new(
                ErrorKind::StackExhaustedError,
                format!(
                    "maximum call depth of {} exceeded",
                    self.config.max_call_depth
                ),
            );
            return Err(match span {
                Some(span) => err.with_span(span),
                None => err,
            });
        }
        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.call_depth -= 1;
        result
    }

    fn dispatch_call(&mut self, callee: &Value, args: Vec<Value>, span: Span) -> Result<Value> {
        match callee {
            Value::Function(func) => self.call_function(func, None, args, span),
            Value::BoundMethod(bound) => {
                let receiver = Value::Instance(Rc::clone(&bound.receiver));
                self.call_function(&bound.method, Some(receiver), args, span)
            }
            Value::Builtin(builtin) => {
                trace!(builtin = builtin.name, "call");
                (builtin.func)(self, &args).map_err(|e| e.with_span(span))
            }
            Value::Class(class) => self.instantiate(class, args, span),
            other => Err(ZenError::at(
                ErrorKind::TypeError,
                format!("value of type '{}' is not callable", other.type_name()),
                span,
            )),
        }
    }

    /// Run a user function in a fresh scope whose parent is its closure.
    ///
    /// A receiver, when present, fills the first parameter.
    fn call_function(
        &mut self,
        func: &Rc<Function>,
        receiver: Option<Value>,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value> {
        let implicit = usize::from(receiver.is_some());
        if args.len() + implicit != func.arity() {
            // A method declared without `self` has nothing to hold the
            // receiver, so count it as a given argument.
            let (expected, given) = match func.arity().checked_sub(implicit) {
                Some(expected) => (expected, args.len()),
                None => (func.arity(), args.len() + implicit),
            };
            return Err(ZenError::at(
                ErrorKind::ArityError,
                format!(
                    "{}() takes {expected} argument{} but {given} were given",
                    func.name(),
                    if expected == 1 { "" } else { "s" },
                ),
                span,
            ));
        }
        trace!(function = func.name(), depth = self.call_depth, "call");

        let scope = Environment::child(&func.closure);
        {
            let mut scope = scope.borrow_mut();
            let values = receiver.into_iter().chain(args);
            for (param, value) in func.def.params.iter().zip(values) {
                scope.define(param.name.clone(), value);
            }
        }

        let previous = std::mem::replace(&mut self.current_file, Rc::clone(&func.origin));
        let result = self.exec_stmts(&func.def.body.stmts, &scope);
        self.current_file = previous;
        catch_return(result, |_| Value::Nil).map_err(|e| e.with_file(&*func.origin))
    }

    /// Create an instance and run `__init__` on it.
    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>, span: Span) -> Result<Value> {
        let instance = Rc::new(Instance {
            class: Rc::clone(class),
            fields: Environment::root(),
        });
        match class.method("__init__") {
            Some(init) => {
                let receiver = Value::Instance(Rc::clone(&instance));
                self.call_function(init, Some(receiver), args, span)?;
            }
            None if !args.is_empty() => {
                return Err(ZenError::at(
                    ErrorKind::ArityError,
                    format!(
                        "{}() takes 0 arguments but {} were given",
                        class.name,
                        args.len()
                    ),
                    span,
                ));
            }
            None => {}
        }
        debug!(class = %class.name, "instance created");
        Ok(Value::Instance(instance))
    }
}
