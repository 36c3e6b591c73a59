//! AST node types for the Zen language.
//!
//! Every node carries a [`Span`] for error reporting. Function definitions
//! are reference counted: a function value created at runtime keeps its
//! definition alive after the [`Program`] that declared it has been dropped
//! (an interactive session parses and discards one program per input).

use crate::Span;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete source unit: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Program {
    /// The package name declared with `bag`, if any.
    pub fn package(&self) -> Option<&Ident> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Package(decl) => Some(&decl.name),
            _ => None,
        })
    }
}

/// `{ stmts... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `fx name(params) { body }`
    Function(Rc<FunctionDef>),
    /// `clx Name { methods }`
    Class(ClassDecl),
    /// `if cond { } else { }`
    If(IfStmt),
    /// `return [expr]`
    Return(ReturnStmt),
    /// `load("a", "b")`
    Load(LoadStmt),
    /// `bag name`
    Package(PackageDecl),
    /// A bare `{ ... }` block.
    Block(Block),
    /// An expression evaluated for its value or side effects.
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Function(def) => def.span,
            Stmt::Class(decl) => decl.span,
            Stmt::If(stmt) => stmt.span,
            Stmt::Return(stmt) => stmt.span,
            Stmt::Load(stmt) => stmt.span,
            Stmt::Package(decl) => decl.span,
            Stmt::Block(block) => block.span,
            Stmt::Expr(stmt) => stmt.span,
        }
    }
}

/// A function definition, shared by named declarations, anonymous function
/// expressions and class methods.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// `None` for anonymous `fx(...) { }` expressions.
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDef {
    /// Name used in diagnostics and display forms.
    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("<anonymous>", |n| n.name.as_str())
    }
}

/// `clx Name { fx method(self, ...) { } ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    pub methods: Vec<Rc<FunctionDef>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    /// `else if ...`
    ElseIf(Box<IfStmt>),
    /// `else { ... }`
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// `load("path", ...)`: each path is a module name handed to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadStmt {
    pub paths: Vec<ModulePath>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModulePath {
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageDecl {
    pub name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    BoolLit(bool),
    NilLit,
    /// `self`
    SelfRef,
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `callee(args)`: callee may be any expression.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.member`
    Member {
        object: Box<Expr>,
        member: Ident,
    },
    /// `target = value`
    Assign {
        target: AssignTarget,
        value: Box<Expr>,
    },
    /// `fx(params) { body }`
    Function(Rc<FunctionDef>),
}

/// The left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Name(Ident),
    Member { object: Box<Expr>, member: Ident },
}

impl AssignTarget {
    pub fn span(&self) -> Span {
        match self {
            AssignTarget::Name(ident) => ident.span,
            AssignTarget::Member { object, member } => object.span.merge(member.span),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}
