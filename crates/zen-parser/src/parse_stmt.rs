//! Statement parsing.

use std::rc::Rc;

use zen_lexer::token::TokenKind;
use zen_types::ast::*;
use zen_types::Result;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Program & Blocks
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse every top-level statement up to end of file.
    pub(crate) fn parse_program(&mut self) -> Result<Program> {
        let start = self.current_span();
        let mut stmts = Vec::new();
        while !self.at_end() {
            if self.check_exact(&TokenKind::Bag) {
                stmts.push(self.parse_package_decl()?);
            } else {
                stmts.push(self.parse_statement()?);
            }
            self.eat_semicolon();
        }
        let span = if stmts.is_empty() {
            start
        } else {
            start.merge(self.previous_span())
        };
        Ok(Program { stmts, span })
    }

    /// Parse a block of statements: `{ stmts... }`
    pub(crate) fn parse_block(&mut self) -> Result<Block> {
        self.nested(|p| {
            let start = p.current_span();
            p.expect(&TokenKind::LBrace)?;
            let mut stmts = Vec::new();
            while !p.check_exact(&TokenKind::RBrace) && !p.at_end() {
                stmts.push(p.parse_statement()?);
                p.eat_semicolon();
            }
            p.expect(&TokenKind::RBrace)?;
            let span = start.merge(p.previous_span());
            Ok(Block { stmts, span })
        })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::Fx if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                let def = self.parse_function_def(true)?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            TokenKind::Clx => self.parse_class_decl().map(Stmt::Class),
            TokenKind::If => self.parse_if_stmt().map(Stmt::If),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Load => self.parse_load_stmt(),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            TokenKind::Bag => Err(self.error_at(
                "'bag' declarations are only allowed at the top level",
                self.current_span(),
            )),
            _ => {
                let expr = self.parse_expression()?;
                let span = expr.span;
                Ok(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `if cond { } [else if cond { } ...] [else { }]`
    pub(crate) fn parse_if_stmt(&mut self) -> Result<IfStmt> {
        let start = self.current_span();
        self.advance(); // eat `if`
        let condition = self.parse_expression()?;
        let then_block = self.parse_block()?;
        let else_branch = if self.eat(&TokenKind::Else) {
            if self.check_exact(&TokenKind::If) {
                let nested = self.nested(|p| p.parse_if_stmt())?;
                Some(ElseBranch::ElseIf(Box::new(nested)))
            } else {
                Some(ElseBranch::Block(self.parse_block()?))
            }
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        Ok(IfStmt {
            condition,
            then_block,
            else_branch,
            span,
        })
    }

    /// `return [expr]`
    ///
    /// The value is omitted when the next token closes the block, ends the
    /// statement or ends the file.
    fn parse_return_stmt(&mut self) -> Result<Stmt> {
        let start = self.advance().span; // eat `return`
        let value = match self.peek_kind() {
            TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof => None,
            _ => Some(self.parse_expression()?),
        };
        let span = value.as_ref().map_or(start, |v| start.merge(v.span));
        Ok(Stmt::Return(ReturnStmt { value, span }))
    }

    /// `load("path", ...)`
    fn parse_load_stmt(&mut self) -> Result<Stmt> {
        let start = self.advance().span; // eat `load`
        self.expect(&TokenKind::LParen)?;
        let mut paths = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let (path, span) = self.expect_string_literal()?;
            paths.push(ModulePath { path, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(&TokenKind::RParen)?;
        let span = start.merge(close.span);
        if paths.is_empty() {
            return Err(self.error_at("load expects at least one module path", span));
        }
        Ok(Stmt::Load(LoadStmt { paths, span }))
    }

    /// `bag name`
    fn parse_package_decl(&mut self) -> Result<Stmt> {
        let start = self.advance().span; // eat `bag`
        let name = self.expect_identifier()?;
        let span = start.merge(name.span);
        Ok(Stmt::Package(PackageDecl { name, span }))
    }
}
