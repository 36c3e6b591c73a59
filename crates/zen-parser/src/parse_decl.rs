//! Function and class declaration parsing.

use std::rc::Rc;

use zen_lexer::token::TokenKind;
use zen_types::ast::*;
use zen_types::Result;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// `fx name(params) { body }`, or `fx(params) { body }` when `named` is
    /// false.
    pub(crate) fn parse_function_def(&mut self, named: bool) -> Result<FunctionDef> {
        let start = self.current_span();
        self.expect(&TokenKind::Fx)?;
        let name = if named {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(FunctionDef {
            name,
            params,
            body,
            span,
        })
    }

    /// Comma-separated parameter names, stopping before `)`.
    ///
    /// Duplicate names are rejected.
    fn parse_param_list(&mut self) -> Result<Vec<Ident>> {
        let mut params: Vec<Ident> = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            let param = self.expect_param_name()?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(self.error_at(
                    format!("duplicate parameter '{}'", param.name),
                    param.span,
                ));
            }
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    /// `clx Name { fx method(self, ...) { } ... }`
    ///
    /// A class body holds method declarations only.
    pub(crate) fn parse_class_decl(&mut self) -> Result<ClassDecl> {
        let start = self.advance().span; // eat `clx`
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;
        let mut methods: Vec<Rc<FunctionDef>> = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            if !self.check_exact(&TokenKind::Fx) {
                return Err(self.unexpected("method declaration"));
            }
            let method = self.parse_function_def(true)?;
            self.eat_semicolon();
            methods.push(Rc::new(method));
        }
        let close = self.expect(&TokenKind::RBrace)?;
        let span = start.merge(close.span);
        Ok(ClassDecl {
            name,
            methods,
            span,
        })
    }
}
