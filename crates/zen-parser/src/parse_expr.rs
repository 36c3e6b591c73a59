//! Expression parsing by precedence climbing.
//!
//! Binding powers (lowest → highest):
//! 1. `=` (assignment, right-associative)
//! 2. `||`
//! 3. `&&`
//! 4. `==`, `!=`
//! 5. `<`, `>`, `<=`, `>=`
//! 6. `+`, `-`
//! 7. `*`, `/`, `%`
//! 8. unary `-`, `!` (prefix)
//! 9. `()` (call, postfix)
//! 10. `.` (member access, postfix)
//! 11. literals, identifiers, grouping, `fx(...) { }`

use std::rc::Rc;

use zen_lexer::token::TokenKind;
use zen_types::ast::*;

use crate::parser::Parser;

/// Binding power of an operator position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Member,
    Primary,
}

impl Precedence {
    /// The next-tighter level, used for the right operand of a
    /// left-associative operator.
    fn next(self) -> Precedence {
        match self {
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Member,
            Precedence::Member | Precedence::Primary => Precedence::Primary,
        }
    }

    /// Binding power of `kind` in infix or postfix position, if it has one.
    fn of_infix(kind: &TokenKind) -> Option<Precedence> {
        Some(match kind {
            TokenKind::Eq => Precedence::Assignment,
            TokenKind::OrOr => Precedence::Or,
            TokenKind::AndAnd => Precedence::And,
            TokenKind::EqEq | TokenKind::BangEq => Precedence::Equality,
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEq | TokenKind::GreaterEq => {
                Precedence::Comparison
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            TokenKind::LParen => Precedence::Call,
            TokenKind::Dot => Precedence::Member,
            _ => return None,
        })
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::OrOr => BinOp::Or,
        TokenKind::AndAnd => BinOp::And,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::BangEq => BinOp::NotEq,
        TokenKind::Less => BinOp::Less,
        TokenKind::Greater => BinOp::Greater,
        TokenKind::LessEq => BinOp::LessEq,
        TokenKind::GreaterEq => BinOp::GreaterEq,
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Sub,
        TokenKind::Star => BinOp::Mul,
        TokenKind::Slash => BinOp::Div,
        TokenKind::Percent => BinOp::Mod,
        _ => return None,
    })
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a full expression, including assignment.
    pub(crate) fn parse_expression(&mut self) -> zen_types::Result<Expr> {
        self.parse_precedence(Precedence::Assignment)
    }

    /// Parse an expression whose operators all bind at least as tightly as
    /// `min`.
    fn parse_precedence(&mut self, min: Precedence) -> zen_types::Result<Expr> {
        self.nested(|p| {
            let mut left = p.parse_prefix()?;
            while let Some(prec) = Precedence::of_infix(p.peek_kind()) {
                if prec < min {
                    break;
                }
                p.deepen()?;
                left = p.parse_infix(left, prec)?;
            }
            Ok(left)
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Infix & Postfix
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_infix(&mut self, left: Expr, prec: Precedence) -> zen_types::Result<Expr> {
        match self.peek_kind() {
            TokenKind::LParen => self.parse_call(left),
            TokenKind::Dot => {
                self.advance(); // eat `.`
                let member = self.expect_identifier()?;
                let span = left.span.merge(member.span);
                Ok(Expr::new(
                    ExprKind::Member {
                        object: Box::new(left),
                        member,
                    },
                    span,
                ))
            }
            TokenKind::Eq => self.parse_assignment(left),
            kind => {
                let Some(op) = binary_op(kind) else {
                    return Err(self.unexpected("operator"));
                };
                self.advance();
                let right = self.parse_precedence(prec.next())?;
                let span = left.span.merge(right.span);
                Ok(Expr::new(
                    ExprKind::Binary {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                    },
                    span,
                ))
            }
        }
    }

    /// `target = value`, right-associative.
    fn parse_assignment(&mut self, target: Expr) -> zen_types::Result<Expr> {
        let eq_span = self.advance().span; // eat `=`
        let target = match target.kind {
            ExprKind::Identifier(name) => AssignTarget::Name(Ident::new(name, target.span)),
            ExprKind::Member { object, member } => AssignTarget::Member { object, member },
            _ => return Err(self.error_at("invalid assignment target", target.span.merge(eq_span))),
        };
        let value = self.parse_precedence(Precedence::Assignment)?;
        let span = target.span().merge(value.span);
        Ok(Expr::new(
            ExprKind::Assign {
                target,
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `callee(args...)`
    fn parse_call(&mut self, callee: Expr) -> zen_types::Result<Expr> {
        self.advance(); // eat `(`
        let args = self.parse_arg_list()?;
        self.expect(&TokenKind::RParen)?;
        let span = callee.span.merge(self.previous_span());
        Ok(Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// Parse comma-separated call arguments up to (not including) `)`.
    fn parse_arg_list(&mut self) -> zen_types::Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check_exact(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            // Allow trailing comma before `)`
            if self.check_exact(&TokenKind::RParen) {
                break;
            }
        }
        Ok(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Prefix & Primary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_prefix(&mut self) -> zen_types::Result<Expr> {
        let start = self.current_span();
        let literal = match self.peek_kind().clone() {
            TokenKind::IntLit(n) => ExprKind::IntLit(n),
            TokenKind::FloatLit(n) => ExprKind::FloatLit(n),
            TokenKind::StringLit(s) => ExprKind::StringLit(s),
            TokenKind::True => ExprKind::BoolLit(true),
            TokenKind::False => ExprKind::BoolLit(false),
            TokenKind::Nil => ExprKind::NilLit,
            TokenKind::SelfKw => ExprKind::SelfRef,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),

            TokenKind::Minus | TokenKind::Bang => return self.parse_unary(),

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance(); // eat `(`
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                return Ok(Expr::new(inner.kind, span));
            }

            // ── Anonymous function ──────────────────────────────────────
            TokenKind::Fx => {
                let def = self.parse_function_def(false)?;
                let span = def.span;
                return Ok(Expr::new(ExprKind::Function(Rc::new(def)), span));
            }

            _ => return Err(self.unexpected("expression")),
        };
        self.advance();
        Ok(Expr::new(literal, start))
    }

    /// `-operand` or `!operand`
    fn parse_unary(&mut self) -> zen_types::Result<Expr> {
        let start = self.current_span();
        let op = match self.advance().kind {
            TokenKind::Bang => UnaryOp::Not,
            _ => UnaryOp::Neg,
        };
        let operand = self.parse_precedence(Precedence::Unary)?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }
}
