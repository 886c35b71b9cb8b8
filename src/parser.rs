// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::builtins::{self, Arity};
use crate::error::FormulaError;
use crate::lexer::*;
use crate::utils::limits::{self, Limits};
use crate::value::Float;
use crate::Rc;

type Result<T> = core::result::Result<T, FormulaError>;

/// Recursive-descent formula parser.
///
/// Grammar, lowest to highest precedence:
///
/// ```text
/// expression     := additive
/// additive       := multiplicative (('+'|'-') multiplicative)*
/// multiplicative := power (('*'|'/') power)*
/// power          := unary ('^' unary)*        right-associative
/// unary          := '-'? postfix
/// postfix        := primary ( '.' IDENT | '[' expression ']' )*
/// primary        := NUMBER | STRING | call | IDENT | '(' expression ')'
/// call           := IDENT '(' (expression (',' expression)*)? ')'
/// ```
///
/// Depth is counted explicitly rather than inferred from the call stack. It
/// is raised around the whole formula, every parenthesized group, every
/// function argument and every bracketed index. Every allocated node is
/// counted as well; either counter crossing its limit aborts the parse.
#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    tok: Token,
    end: u32,
    limits: Limits,
    depth: usize,
    node_count: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source, limits: &Limits) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        let tok = lexer.next_token()?;
        Ok(Self {
            source: source.clone(),
            lexer,
            tok,
            end: 0,
            limits: *limits,
            depth: 0,
            node_count: 0,
        })
    }

    /// Checks the length of `formula`, then parses it.
    pub fn parse_str(file: &str, formula: &str, limits: &Limits) -> Result<Expr> {
        let source = Source::from_contents(file.to_string(), formula.to_string(), limits)?;
        let mut parser = Parser::new(&source, limits)?;
        parser.parse()
    }

    /// Number of nodes allocated so far.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn parse(&mut self) -> Result<Expr> {
        if self.tok.0 == TokenKind::Eof {
            return Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "empty formula"));
        }

        self.enter()?;
        let expr = self.parse_expr()?;
        self.leave();

        if self.tok.0 != TokenKind::Eof {
            let msg = format!("unexpected `{}` after expression", self.tok.1.text());
            return Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg));
        }
        Ok(expr)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        self.limits.check_depth(self.depth)?;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn new_node(&mut self) -> Result<()> {
        self.node_count += 1;
        self.limits.check_node_count(self.node_count)?;
        Ok(())
    }

    pub fn token_text(&self) -> &str {
        match self.tok.0 {
            TokenKind::Symbol | TokenKind::Number | TokenKind::Ident | TokenKind::Eof => {
                self.tok.1.text()
            }
            TokenKind::String | TokenKind::QuotedString => "",
        }
    }

    fn is_symbol(&self, s: &str) -> bool {
        self.tok.0 == TokenKind::Symbol && self.tok.1.text() == s
    }

    fn next_token(&mut self) -> Result<()> {
        self.end = self.tok.1.end;
        self.tok = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, text: &str, context: &str) -> Result<()> {
        if self.is_symbol(text) {
            self.next_token()
        } else {
            let msg = format!("expecting `{text}` {context}");
            Err(self.source.error(self.tok.1.line, self.tok.1.col, &msg))
        }
    }

    // Identifiers are checked against the blocked names as soon as they are
    // read, wherever they appear.
    fn parse_ident(&mut self) -> Result<Span> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Ident => {
                limits::check_name(span.text())?;
                self.next_token()?;
                Ok(span)
            }
            _ => Err(self
                .source
                .error(self.tok.1.line, self.tok.1.col, "expecting identifier")),
        }
    }

    fn read_number(span: Span) -> Result<Expr> {
        match span.text().parse::<Float>() {
            Ok(value) => Ok(Expr::Number { span, value }),
            Err(_) => Err(span.error("could not parse number")),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.tok.1.clone();
        match self.tok.0 {
            TokenKind::Number => {
                self.new_node()?;
                self.next_token()?;
                Self::read_number(span)
            }
            TokenKind::String | TokenKind::QuotedString => {
                self.new_node()?;
                let value = unescape(&self.tok)?;
                self.next_token()?;
                Ok(Expr::String {
                    span,
                    value: value.into(),
                })
            }
            TokenKind::Ident => {
                let ident = self.parse_ident()?;
                if self.is_symbol("(") {
                    return self.parse_call(ident);
                }
                self.new_node()?;
                Ok(Expr::Var {
                    name: ident.text().into(),
                    span: ident,
                })
            }
            TokenKind::Symbol if span.text() == "(" => self.parse_parens_expr(),
            TokenKind::Eof => Err(self.source.error(
                span.line,
                span.col,
                "unexpected end of formula, expecting expression",
            )),
            _ => Err(self.source.error(
                span.line,
                span.col,
                format!("unexpected `{}`, expecting expression", span.text()).as_str(),
            )),
        }
    }

    fn parse_parens_expr(&mut self) -> Result<Expr> {
        self.next_token()?;
        self.enter()?;
        let expr = self.parse_expr()?;
        self.leave();
        self.expect(")", "while parsing parenthesized expression")?;
        Ok(expr)
    }

    fn parse_call(&mut self, name: Span) -> Result<Expr> {
        let fcn = name.text().to_string();
        let arity = match builtins::lookup(&fcn) {
            Some((_, arity)) => *arity,
            None => {
                let msg = format!(
                    "unknown function `{fcn}`. Supported functions are {}.",
                    builtins::names().join(", ")
                );
                return Err(FormulaError::UnknownFunction {
                    name: fcn.to_string(),
                    message: name.message("error", &msg),
                });
            }
        };

        self.next_token()?;
        let mut params = vec![];
        if !self.is_symbol(")") {
            loop {
                self.enter()?;
                params.push(self.parse_expr()?);
                self.leave();

                if self.is_symbol(",") {
                    self.next_token()?;
                } else {
                    break;
                }
            }
        }
        self.expect(")", "while parsing function call")?;

        if !arity.accepts(params.len()) {
            let msg = format!(
                "`{fcn}` expects {} argument{}, got {}",
                arity,
                if arity.is_single() { "" } else { "s" },
                params.len()
            );
            return Err(FormulaError::InvalidArgumentCount {
                name: fcn.to_string(),
                expected: arity.to_string(),
                actual: params.len(),
                message: name.message("error", &msg),
            });
        }

        self.new_node()?;
        let mut span = name.clone();
        span.end = self.end;
        Ok(Expr::Call {
            span,
            name: (name, fcn.as_str().into()),
            params,
        })
    }

    fn parse_ref(&mut self) -> Result<Expr> {
        let mut term = self.parse_primary()?;

        loop {
            let mut span = term.span().clone();
            if self.is_symbol(".") {
                self.next_token()?;
                let field = self.parse_ident()?;
                self.new_node()?;
                span.end = self.end;
                let fieldv: Rc<str> = field.text().into();
                term = Expr::RefDot {
                    span,
                    refr: Box::new(term),
                    field: (field, fieldv),
                };
            } else if self.is_symbol("[") {
                self.next_token()?;
                self.enter()?;
                let index = self.parse_expr()?;
                self.leave();
                self.expect("]", "while parsing bracketed reference")?;
                self.new_node()?;
                span.end = self.end;
                term = Expr::RefBrack {
                    span,
                    refr: Box::new(term),
                    index: Box::new(index),
                };
            } else {
                return Ok(term);
            }
        }
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        if !self.is_symbol("-") {
            return self.parse_ref();
        }

        let mut span = self.tok.1.clone();
        self.next_token()?;
        let expr = self.parse_ref()?;
        self.new_node()?;
        span.end = self.end;
        Ok(Expr::UnaryExpr {
            span,
            op: UnaryOp::Neg,
            expr: Box::new(expr),
        })
    }

    fn arith(op: ArithOp, lhs: Expr, rhs: Expr) -> Expr {
        let mut span = lhs.span().clone();
        span.end = rhs.span().end;
        Expr::ArithExpr {
            span,
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn parse_pow_expr(&mut self) -> Result<Expr> {
        let first = self.parse_unary_expr()?;

        let mut rest = vec![];
        while self.is_symbol("^") {
            self.next_token()?;
            rest.push(self.parse_unary_expr()?);
            self.new_node()?;
        }

        // a ^ b ^ c is a ^ (b ^ c).
        let mut rhs = match rest.pop() {
            Some(last) => last,
            None => return Ok(first),
        };
        while let Some(lhs) = rest.pop() {
            rhs = Self::arith(ArithOp::Pow, lhs, rhs);
        }
        Ok(Self::arith(ArithOp::Pow, first, rhs))
    }

    fn parse_mul_div_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_pow_expr()?;

        loop {
            let op = match self.token_text() {
                "*" => ArithOp::Mul,
                "/" => ArithOp::Div,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let right = self.parse_pow_expr()?;
            self.new_node()?;
            expr = Self::arith(op, expr, right);
        }
    }

    fn parse_arith_expr(&mut self) -> Result<Expr> {
        let mut expr = self.parse_mul_div_expr()?;

        loop {
            let op = match self.token_text() {
                "+" => ArithOp::Add,
                "-" => ArithOp::Sub,
                _ => return Ok(expr),
            };
            self.next_token()?;
            let right = self.parse_mul_div_expr()?;
            self.new_node()?;
            expr = Self::arith(op, expr, right);
        }
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_arith_expr()
    }
}
