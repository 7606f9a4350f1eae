//! Pratt (precedence-climbing) parser: tokens → AST, plus a list of
//! recorded parse errors. See spec §4.2.

mod error;
mod precedence;

pub use error::ParseError;
pub use precedence::Precedence;

use crate::ast::*;
use crate::lexer::{Lexer, Position, Token, TokenKind};
use precedence::infix_precedence;

/// Tokens whose appearance marks a safe place to resume parsing after an error.
fn is_statement_boundary(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwVar
            | TokenKind::KwLet
            | TokenKind::KwConst
            | TokenKind::KwIf
            | TokenKind::KwWhile
            | TokenKind::KwFor
            | TokenKind::KwForeach
            | TokenKind::KwFunc
            | TokenKind::KwStruct
            | TokenKind::KwEnum
            | TokenKind::KwSwitch
            | TokenKind::KwReturn
            | TokenKind::KwBreak
            | TokenKind::KwContinue
            | TokenKind::KwImport
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::Eof
    )
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub errors: Vec<ParseError>,
}

/// Parses a full program, returning the (possibly partial) AST and the list
/// of parse errors encountered along the way.
pub fn parse(source: &str) -> (Program, Vec<ParseError>) {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser {
        tokens,
        pos: 0,
        errors: Vec::new(),
    };
    let program = parser.parse_program();
    (program, parser.errors)
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_pos(&self) -> Position {
        self.current().pos
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                self.current_pos(),
                format!("expected {kind}, found {}", self.current().kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current().kind.clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::new(
                self.current_pos(),
                format!("expected identifier, found {other}"),
            )),
        }
    }

    /// Skips tokens until a `;` (consumed) or the next top-level keyword /
    /// block boundary (left for the next parse attempt).
    fn synchronize(&mut self) {
        loop {
            let kind = &self.current().kind;
            if *kind == TokenKind::Semicolon {
                self.advance();
                return;
            }
            if is_statement_boundary(kind) {
                return;
            }
            self.advance();
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        Program { statements }
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(Some(stmt)) => statements.push(stmt),
                Ok(None) => {}
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        match &self.current().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::KwVar | TokenKind::KwLet | TokenKind::KwConst => self.parse_decl_stmt().map(Some),
            TokenKind::LBrace => Ok(Some(Stmt::Block(self.parse_block()?))),
            TokenKind::KwIf => self.parse_if_stmt().map(Some),
            TokenKind::KwWhile => self.parse_while_stmt().map(Some),
            TokenKind::KwFor => self.parse_for_stmt().map(Some),
            TokenKind::KwForeach => self.parse_foreach_stmt().map(Some),
            TokenKind::KwSwitch => self.parse_switch_stmt().map(Some),
            TokenKind::KwFunc => self.parse_func_decl_stmt().map(Some),
            TokenKind::KwStruct => self.parse_struct_decl().map(Some),
            TokenKind::KwEnum => self.parse_enum_decl().map(Some),
            TokenKind::KwReturn => self.parse_return_stmt().map(Some),
            TokenKind::KwBreak => {
                let pos = self.advance().pos;
                Ok(Some(Stmt::Break(pos)))
            }
            TokenKind::KwContinue => {
                let pos = self.advance().pos;
                Ok(Some(Stmt::Continue(pos)))
            }
            TokenKind::KwImport => self.parse_import_stmt().map(Some),
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                Ok(Some(Stmt::ExprStmt(expr)))
            }
        }
    }

    fn decl_kind(&mut self) -> DeclKind {
        match self.advance().kind {
            TokenKind::KwVar => DeclKind::Var,
            TokenKind::KwLet => DeclKind::Let,
            TokenKind::KwConst => DeclKind::Const,
            _ => unreachable!("caller checked token kind"),
        }
    }

    fn parse_decl_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.current_pos();
        let kind = self.decl_kind();
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok(Stmt::Decl { kind, name, value, pos })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `if`
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen)?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenKind::KwElse) {
            self.advance();
            if self.check(&TokenKind::KwIf) {
                Some(vec![self.parse_if_stmt()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            pos,
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `while`
        self.expect(TokenKind::LParen)?;
        let mut conds = vec![self.parse_expression(Precedence::Lowest)?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            conds.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { conds, body, pos })
    }

    fn parse_for_init_item(&mut self) -> Result<ForInit, ParseError> {
        if matches!(self.current().kind, TokenKind::KwVar | TokenKind::KwLet | TokenKind::KwConst) {
            let kind = self.decl_kind();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Assign)?;
            let expr = self.parse_expression(Precedence::Lowest)?;
            Ok(ForInit {
                name: Some((kind, name)),
                expr,
            })
        } else {
            let expr = self.parse_expression(Precedence::Lowest)?;
            Ok(ForInit { name: None, expr })
        }
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `for`
        self.expect(TokenKind::LParen)?;

        let mut init = Vec::new();
        if !self.check(&TokenKind::Semicolon) {
            init.push(self.parse_for_init_item()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                init.push(self.parse_for_init_item()?);
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.expect(TokenKind::Semicolon)?;

        let mut update = Vec::new();
        if !self.check(&TokenKind::RParen) {
            update.push(self.parse_expression(Precedence::Lowest)?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                update.push(self.parse_expression(Precedence::Lowest)?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
            pos,
        })
    }

    fn parse_foreach_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `foreach`
        let name = self.expect_ident()?;
        self.expect(TokenKind::KwIn)?;
        let iterable = self.parse_expression(Precedence::Lowest)?;
        let body = self.parse_block()?;
        Ok(Stmt::Foreach {
            name,
            iterable,
            body,
            pos,
        })
    }

    fn parse_case_body(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();
        loop {
            match &self.current().kind {
                TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace | TokenKind::Eof => break,
                _ => match self.parse_statement() {
                    Ok(Some(stmt)) => statements.push(stmt),
                    Ok(None) => {}
                    Err(err) => {
                        self.errors.push(err);
                        self.synchronize();
                    }
                },
            }
        }
        Ok(statements)
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `switch`
        self.expect(TokenKind::LParen)?;
        let scrutinee = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            match self.current().kind {
                TokenKind::KwCase => {
                    self.advance();
                    let value = self.parse_expression(Precedence::Lowest)?;
                    self.expect(TokenKind::Colon)?;
                    let body = self.parse_case_body()?;
                    cases.push(SwitchCase { value: Some(value), body });
                }
                TokenKind::KwDefault => {
                    self.advance();
                    self.expect(TokenKind::Colon)?;
                    let body = self.parse_case_body()?;
                    cases.push(SwitchCase { value: None, body });
                }
                _ => {
                    return Err(ParseError::new(
                        self.current_pos(),
                        format!("expected case or default, found {}", self.current().kind),
                    ));
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Switch { scrutinee, cases, pos })
    }

    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.expect_ident()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                params.push(self.expect_ident()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_func_decl_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `func`
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Stmt::FuncDecl(FuncDecl { name, params, body, pos }))
    }

    fn parse_struct_decl(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `struct`
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if self.check(&TokenKind::KwFunc) {
                let fn_pos = self.advance().pos;
                let fname = self.expect_ident()?;
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                methods.push(FuncDecl {
                    name: fname,
                    params,
                    body,
                    pos: fn_pos,
                });
            } else {
                let fname = self.expect_ident()?;
                let init = if self.check(&TokenKind::Assign) {
                    self.advance();
                    Some(self.parse_expression(Precedence::Lowest)?)
                } else {
                    None
                };
                fields.push(FieldDecl { name: fname, init });
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::StructDecl(StructDecl {
            name,
            fields,
            methods,
            pos,
        }))
    }

    fn parse_enum_decl(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `enum`
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let mname = self.expect_ident()?;
            let value = if self.check(&TokenKind::Assign) {
                self.advance();
                let negate = if self.check(&TokenKind::Minus) {
                    self.advance();
                    true
                } else {
                    false
                };
                match self.current().kind {
                    TokenKind::Int(n) => {
                        self.advance();
                        Some(if negate { -n } else { n })
                    }
                    _ => {
                        return Err(ParseError::new(self.current_pos(), "expected integer literal"));
                    }
                }
            } else {
                None
            };
            members.push(EnumMember { name: mname, value });
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::EnumDecl(EnumDecl { name, members, pos }))
    }

    fn starts_expression(&self) -> bool {
        !matches!(
            self.current().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::KwCase | TokenKind::KwDefault | TokenKind::Eof
        )
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `return`
        let value = if self.starts_expression() {
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };
        Ok(Stmt::Return { value, pos })
    }

    fn parse_import_stmt(&mut self) -> Result<Stmt, ParseError> {
        let pos = self.advance().pos; // `import`
        let name = self.expect_ident()?;
        Ok(Stmt::Import { name, pos })
    }

    // ---- Expressions ----

    fn parse_expression(&mut self, min_prec: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let Some(prec) = infix_precedence(&self.current().kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            left = self.parse_infix(left, prec)?;
        }
        Ok(left)
    }

    fn parse_expr_list_until(&mut self, end: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if !self.check(end) {
            items.push(self.parse_expression(Precedence::Lowest)?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(end) {
                    break; // trailing comma
                }
                items.push(self.parse_expression(Precedence::Lowest)?);
            }
        }
        Ok(items)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Char(c) => {
                self.advance();
                Ok(Expr::Char(c))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::Nil => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                let pos = self.advance().pos;
                let elements = self.parse_expr_list_until(&TokenKind::RBracket)?;
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::ArrayLit { elements, pos })
            }
            TokenKind::KwArray => {
                let pos = self.advance().pos;
                self.expect(TokenKind::LBrace)?;
                let elements = self.parse_expr_list_until(&TokenKind::RBrace)?;
                self.expect(TokenKind::RBrace)?;
                Ok(Expr::ArrayLit { elements, pos })
            }
            TokenKind::KwSet => {
                let pos = self.advance().pos;
                self.expect(TokenKind::LBrace)?;
                let elements = self.parse_expr_list_until(&TokenKind::RBrace)?;
                self.expect(TokenKind::RBrace)?;
                Ok(Expr::SetLit { elements, pos })
            }
            TokenKind::KwMap => {
                let pos = self.advance().pos;
                self.expect(TokenKind::LBrace)?;
                let mut entries = Vec::new();
                if !self.check(&TokenKind::RBrace) {
                    entries.push(self.parse_map_entry()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        if self.check(&TokenKind::RBrace) {
                            break;
                        }
                        entries.push(self.parse_map_entry()?);
                    }
                }
                self.expect(TokenKind::RBrace)?;
                Ok(Expr::MapLit { entries, pos })
            }
            TokenKind::Bang => {
                let pos = self.advance().pos;
                let expr = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                    pos,
                })
            }
            TokenKind::Minus => {
                let pos = self.advance().pos;
                let expr = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(expr),
                    pos,
                })
            }
            TokenKind::Plus => {
                let pos = self.advance().pos;
                let expr = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Pos,
                    expr: Box::new(expr),
                    pos,
                })
            }
            TokenKind::Tilde => {
                let pos = self.advance().pos;
                let expr = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Unary {
                    op: UnaryOp::BitNot,
                    expr: Box::new(expr),
                    pos,
                })
            }
            TokenKind::KwFunc => {
                let pos = self.advance().pos;
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                Ok(Expr::FuncLit { params, body, pos })
            }
            TokenKind::KwNew => {
                let pos = self.advance().pos;
                let type_name = self.expect_ident()?;
                self.expect(TokenKind::LParen)?;
                let args = self.parse_expr_list_until(&TokenKind::RParen)?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::New { type_name, args, pos })
            }
            other => Err(ParseError::new(tok.pos, format!("unexpected token {other}"))),
        }
    }

    fn parse_map_entry(&mut self) -> Result<(Expr, Expr), ParseError> {
        let key = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Ok((key, value))
    }

    fn compound_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
        Some(match kind {
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mul,
            TokenKind::SlashEq => BinaryOp::Div,
            TokenKind::PercentEq => BinaryOp::Mod,
            TokenKind::AmpEq => BinaryOp::BitAnd,
            TokenKind::PipeEq => BinaryOp::BitOr,
            TokenKind::CaretEq => BinaryOp::BitXor,
            TokenKind::ShlEq => BinaryOp::Shl,
            TokenKind::ShrEq => BinaryOp::Shr,
            _ => return None,
        })
    }

    fn is_valid_lvalue(expr: &Expr) -> bool {
        matches!(expr, Expr::Ident(_) | Expr::Index { .. } | Expr::Member { .. })
    }

    fn parse_infix(&mut self, left: Expr, prec: Precedence) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Assign => {
                self.advance();
                if !Self::is_valid_lvalue(&left) {
                    self.errors.push(ParseError::new(
                        tok.pos,
                        "left-hand side of assignment must be an identifier, index, or member access",
                    ));
                }
                let value = self.parse_expression(Precedence::Assignment)?;
                Ok(Expr::Assign {
                    target: Box::new(left),
                    value: Box::new(value),
                    pos: tok.pos,
                })
            }
            ref k if Self::compound_binary_op(k).is_some() => {
                self.advance();
                if !Self::is_valid_lvalue(&left) {
                    self.errors.push(ParseError::new(
                        tok.pos,
                        "left-hand side of compound assignment must be an identifier, index, or member access",
                    ));
                }
                let op = Self::compound_binary_op(&tok.kind).unwrap();
                let rhs = self.parse_expression(Precedence::Assignment)?;
                let desugared = Expr::Binary {
                    op,
                    left: Box::new(left.clone()),
                    right: Box::new(rhs),
                    pos: tok.pos,
                };
                Ok(Expr::Assign {
                    target: Box::new(left),
                    value: Box::new(desugared),
                    pos: tok.pos,
                })
            }
            TokenKind::Dot => {
                self.advance();
                let name = self.expect_ident()?;
                Ok(Expr::Member {
                    target: Box::new(left),
                    name,
                    pos: tok.pos,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_expr_list_until(&TokenKind::RParen)?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Call {
                    callee: Box::new(left),
                    args,
                    pos: tok.pos,
                })
            }
            TokenKind::LBracket => {
                self.advance();
                if self.check(&TokenKind::Colon) {
                    self.advance();
                    let end = if self.check(&TokenKind::RBracket) {
                        None
                    } else {
                        Some(Box::new(self.parse_expression(Precedence::Lowest)?))
                    };
                    self.expect(TokenKind::RBracket)?;
                    return Ok(Expr::Slice {
                        target: Box::new(left),
                        start: None,
                        end,
                        pos: tok.pos,
                    });
                }
                let first = self.parse_expression(Precedence::Lowest)?;
                if self.check(&TokenKind::Colon) {
                    self.advance();
                    let end = if self.check(&TokenKind::RBracket) {
                        None
                    } else {
                        Some(Box::new(self.parse_expression(Precedence::Lowest)?))
                    };
                    self.expect(TokenKind::RBracket)?;
                    Ok(Expr::Slice {
                        target: Box::new(left),
                        start: Some(Box::new(first)),
                        end,
                        pos: tok.pos,
                    })
                } else {
                    self.expect(TokenKind::RBracket)?;
                    Ok(Expr::Index {
                        target: Box::new(left),
                        index: Box::new(first),
                        pos: tok.pos,
                    })
                }
            }
            TokenKind::DotDotDot => {
                self.advance();
                let right = self.parse_expression(Precedence::Shift)?;
                Ok(Expr::Binary {
                    op: BinaryOp::Range,
                    left: Box::new(left),
                    right: Box::new(right),
                    pos: tok.pos,
                })
            }
            _ => {
                let op = binary_op_for(&tok.kind).ok_or_else(|| {
                    ParseError::new(tok.pos, format!("unexpected infix token {}", tok.kind))
                })?;
                self.advance();
                let next_min = one_higher(prec);
                let right = self.parse_expression(next_min)?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    pos: tok.pos,
                })
            }
        }
    }
}

fn binary_op_for(kind: &TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        Amp => BinaryOp::BitAnd,
        Pipe => BinaryOp::BitOr,
        Caret => BinaryOp::BitXor,
        Shl => BinaryOp::Shl,
        Shr => BinaryOp::Shr,
        Lt => BinaryOp::Lt,
        Gt => BinaryOp::Gt,
        LtEq => BinaryOp::LtEq,
        GtEq => BinaryOp::GtEq,
        EqEq => BinaryOp::Eq,
        NotEq => BinaryOp::NotEq,
        StrictEq => BinaryOp::StrictEq,
        StrictNotEq => BinaryOp::StrictNotEq,
        AndAnd => BinaryOp::And,
        OrOr => BinaryOp::Or,
        _ => return None,
    })
}

/// Left-associative operators recurse into their right-hand side one
/// precedence level higher, so `a - b - c` groups as `(a - b) - c`.
fn one_higher(prec: Precedence) -> Precedence {
    use Precedence::*;
    match prec {
        Lowest => Assignment,
        Assignment => LogicalOr,
        LogicalOr => LogicalAnd,
        LogicalAnd => BitOr,
        BitOr => BitXor,
        BitXor => BitAnd,
        BitAnd => Equality,
        Equality => Relational,
        Relational => Range,
        Range => Shift,
        Shift => Additive,
        Additive => Multiplicative,
        Multiplicative => Prefix,
        Prefix => MemberAccess,
        MemberAccess => Postfix,
        Postfix => Postfix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        program
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let program = parse_ok("var x = 3 * (4 + 5);");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn assignment_is_right_associative() {
        let program = parse_ok("a = b = 5;");
        match &program.statements[0] {
            Stmt::ExprStmt(Expr::Assign { target, value, .. }) => {
                assert!(matches!(**target, Expr::Ident(ref n) if n == "a"));
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn compound_assignment_desugars() {
        let program = parse_ok("x += 1;");
        match &program.statements[0] {
            Stmt::ExprStmt(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_ok("for (var i = 0; i < 10; i += 1) { i; }");
        assert!(matches!(program.statements[0], Stmt::For { .. }));
    }

    #[test]
    fn parses_switch_with_fallthrough() {
        let program = parse_ok(
            "switch (2) { case 1: \"a\"; break; case 2: case 3: \"b\"; break; default: \"c\"; }",
        );
        match &program.statements[0] {
            Stmt::Switch { cases, .. } => {
                assert_eq!(cases.len(), 4);
                assert!(cases[1].body.is_empty()); // empty case 2 falls through
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_enum_with_explicit_values() {
        let program = parse_ok("enum Color { RED, GREEN=5, BLUE }");
        match &program.statements[0] {
            Stmt::EnumDecl(decl) => {
                assert_eq!(decl.members[1].value, Some(5));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn recovers_after_parse_error() {
        let (program, errors) = parse("var = ; var y = 1;");
        assert!(!errors.is_empty());
        assert!(program.statements.iter().any(|s| matches!(s, Stmt::Decl { name, .. } if name == "y")));
    }

    #[test]
    fn parses_slice_with_omitted_bounds() {
        let program = parse_ok("a[:];");
        assert!(matches!(
            program.statements[0],
            Stmt::ExprStmt(Expr::Slice { start: None, end: None, .. })
        ));
    }
}
