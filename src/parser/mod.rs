//=============================================
// plaintalk/parser.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk recursive descent parser implementation
// Objective: Resolve the natural-English surface grammar into the single AST
//            consumed by the interpreter
// Formatting: Zobie.format
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use crate::ast::{
    BinaryOp, EventDecl, Expr, FunctionDecl, Literal, Program, START_EVENT, Scope, Stmt,
    TIMER_EVENT, TimeUnit, TimerSpec, UnaryOp,
};
use crate::tokenizer::{Position, Token, TokenKind};
use std::mem::discriminant;
use std::rc::Rc;
use thiserror::Error;

//=============================================/*
//  Pulls in AST node constructors and the token model.
//============================================*/
//=============================================
//            Section 2: Parse Errors
//=============================================

/// Parser error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Expected {expected} but found {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("Unexpected end of input, expected {expected} at line {line}, column {column}")]
    UnexpectedEndOfInput {
        expected: String,
        line: usize,
        column: usize,
    },
    #[error("Invalid syntax: {message} at line {line}, column {column}")]
    InvalidSyntax {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEndOfInput { line, .. }
            | ParseError::InvalidSyntax { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { column, .. }
            | ParseError::UnexpectedEndOfInput { column, .. }
            | ParseError::InvalidSyntax { column, .. } => *column,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

//=============================================
//            Section 3: Parser State & Navigation
//=============================================

/// Deepest expression or block nesting accepted before the parser gives up.
pub const MAX_NESTING: usize = 100;

/// Recursive descent parser for PlainTalk
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|token| &token.kind) != Some(&TokenKind::Eof) {
            let position = tokens
                .last()
                .map(|token| token.position)
                .unwrap_or(Position::new(1, 1, 0));
            tokens.push(Token::new(TokenKind::Eof, "", position));
        }
        Self {
            tokens,
            current: 0,
            depth: 0,
            nesting: 0,
        }
    }

    //Function: parse
    //Purpose: Parse every top-level statement until EOF
    //Inputs: &mut self
    //Returns: ParseResult<Program>
    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.is_at_end() {
            body.push(self.statement()?);
            self.skip_newlines();
        }
        Ok(Program::new(body))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        self.peek_ahead(1)
    }

    fn peek_ahead(&self, distance: usize) -> &Token {
        let index = (self.current + distance).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        discriminant(&self.peek().kind) == discriminant(kind)
    }

    fn check_next(&self, kind: &TokenKind) -> bool {
        discriminant(&self.peek_next().kind) == discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, expected: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(self.error_at_current(expected))
        }
    }

    fn consume_identifier(&mut self, expected: &str) -> ParseResult<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_at_current(expected)),
        }
    }

    /// Optional `global` marker in front of a write target.
    fn scope_marker(&mut self) -> Scope {
        if self.match_token(&TokenKind::Global) {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    /// Runs one recursive production, failing cleanly past `MAX_NESTING`.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.nesting >= MAX_NESTING {
            return Err(self.invalid_at(self.peek(), "Code is nested too deeply"));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    /// A simple statement ends at a newline, at the end of its block, or at EOF.
    fn end_statement(&mut self) -> ParseResult<()> {
        if self.match_token(&TokenKind::Newline) {
            return Ok(());
        }
        if self.check(&TokenKind::Eof) || self.check(&TokenKind::Dedent) {
            return Ok(());
        }
        Err(self.error_at_current("end of line"))
    }

    fn error_at_current(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            ParseError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                line: token.line(),
                column: token.column(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe(),
                line: token.line(),
                column: token.column(),
            }
        }
    }

    fn invalid_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::InvalidSyntax {
            message: message.into(),
            line: token.line(),
            column: token.column(),
        }
    }

    //=============================================/*
    //  Token cursor with one token of lookahead past the current one.
    //============================================*/
    //=============================================
    //            Section 4: Declarations & Blocks
    //=============================================

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::When => self.event_declaration(),
            TokenKind::Every => self.timer_declaration(),
            TokenKind::To => self.function_declaration(),
            TokenKind::Set | TokenKind::Remember | TokenKind::Var => self.assignment(),
            TokenKind::Add | TokenKind::Subtract => self.accumulate(),
            TokenKind::Increase | TokenKind::Decrease => self.step(),
            TokenKind::Multiply | TokenKind::Divide => self.scale(),
            TokenKind::Delete => self.delete_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While | TokenKind::Repeat => self.while_statement(),
            TokenKind::For => self.for_each_statement(),
            TokenKind::Say | TokenKind::Display => self.print_statement(),
            TokenKind::Give => self.return_statement(),
            TokenKind::Ask => self.ask_statement(),
            TokenKind::Store => self.store_statement(),
            TokenKind::Terminate => self.terminate_statement(),
            _ => self.expression_statement(),
        }
    }

    fn ensure_top_level(&self, keyword: &Token) -> ParseResult<()> {
        if self.depth > 0 {
            return Err(self.invalid_at(
                keyword,
                format!("'{}' declarations are only allowed at the top level", keyword.text),
            ));
        }
        Ok(())
    }

    fn event_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        self.ensure_top_level(&keyword)?;

        self.match_token(&TokenKind::The);
        let name = if self.match_token(&TokenKind::Program) {
            self.consume(&TokenKind::Starts, "'starts' after 'program'")?;
            START_EVENT.to_string()
        } else if self.match_token(&TokenKind::Start) {
            START_EVENT.to_string()
        } else {
            self.consume_identifier("event name")?
        };

        let body = self.block()?;
        Ok(Stmt::Event(Rc::new(EventDecl {
            name,
            timer: None,
            body,
            line: keyword.line(),
        })))
    }

    fn timer_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        self.ensure_top_level(&keyword)?;

        let interval_token = self.peek().clone();
        let interval = match interval_token.kind {
            TokenKind::Number(value) => {
                self.advance();
                value
            }
            _ => return Err(self.error_at_current("timer interval")),
        };
        if interval <= 0.0 {
            return Err(self.invalid_at(&interval_token, "Timer interval must be greater than zero"));
        }

        let unit_token = self.peek().clone();
        let unit_word = self.consume_identifier("time unit (seconds/ms)")?;
        let unit = TimeUnit::from_word(&unit_word).ok_or_else(|| {
            self.invalid_at(&unit_token, format!("Unknown time unit '{}'", unit_word))
        })?;

        let body = self.block()?;
        Ok(Stmt::Event(Rc::new(EventDecl {
            name: TIMER_EVENT.to_string(),
            timer: Some(TimerSpec { interval, unit }),
            body,
            line: keyword.line(),
        })))
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        self.ensure_top_level(&keyword)?;

        let name = self.consume_identifier("function name")?;
        let mut params = Vec::new();
        if self.match_token(&TokenKind::Using) || self.match_token(&TokenKind::With) {
            params.push(self.consume_identifier("parameter name")?);
            while self.match_token(&TokenKind::And) || self.match_token(&TokenKind::Comma) {
                params.push(self.consume_identifier("parameter name")?);
            }
        }

        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            line: keyword.line(),
        })))
    }

    //Function: block
    //Purpose: Parse `: NEWLINE INDENT stmt+ DEDENT`
    //Inputs: &mut self
    //Returns: ParseResult<Vec<Stmt>>
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.consume(&TokenKind::Colon, "':'")?;
        self.consume(&TokenKind::Newline, "new line after ':'")?;
        self.skip_newlines();
        self.consume(&TokenKind::Indent, "indented block")?;

        self.depth += 1;
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(&TokenKind::Dedent) || self.is_at_end() {
                break;
            }
            statements.push(self.nested(Self::statement)?);
        }
        self.depth -= 1;

        self.consume(&TokenKind::Dedent, "end of block")?;
        Ok(statements)
    }

    //=============================================/*
    //  Events, timers and functions are top-level only; every block needs an INDENT.
    //============================================*/
    //=============================================
    //            Section 5: Simple Statements
    //=============================================

    fn assignment(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        if keyword.kind == TokenKind::Set {
            self.consume(&TokenKind::To, "'to' after variable name")?;
        } else {
            self.consume(&TokenKind::As, "'as' after variable name")?;
        }
        let value = self.expression()?;
        self.end_statement()?;
        Ok(Stmt::Set {
            target,
            scope,
            value,
            line: keyword.line(),
        })
    }

    /// `add <expr> to <id>` / `subtract <expr> from <id>`
    fn accumulate(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        let amount = self.expression()?;
        let adding = keyword.kind == TokenKind::Add;
        if adding {
            self.consume(&TokenKind::To, "'to' after amount")?;
        } else {
            self.consume(&TokenKind::From, "'from' after amount")?;
        }
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.end_statement()?;

        let line = keyword.line();
        Ok(if adding {
            Stmt::Add {
                target,
                scope,
                amount,
                line,
            }
        } else {
            Stmt::Remove {
                target,
                scope,
                amount,
                line,
            }
        })
    }

    /// `increase <id> by <expr>` / `decrease <id> by <expr>`
    fn step(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.consume(&TokenKind::By, "'by' after variable name")?;
        let amount = self.expression()?;
        self.end_statement()?;

        let line = keyword.line();
        Ok(if keyword.kind == TokenKind::Increase {
            Stmt::Add {
                target,
                scope,
                amount,
                line,
            }
        } else {
            Stmt::Remove {
                target,
                scope,
                amount,
                line,
            }
        })
    }

    /// `multiply <id> by <expr>` / `divide <id> by <expr>`, rewritten to a Set.
    fn scale(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.consume(&TokenKind::By, "'by' after variable name")?;
        let amount = self.expression()?;
        self.end_statement()?;

        let line = keyword.line();
        let op = if keyword.kind == TokenKind::Multiply {
            BinaryOp::Multiply
        } else {
            BinaryOp::Divide
        };
        let current = Expr::identifier(target.clone(), scope, line);
        Ok(Stmt::Set {
            target,
            scope,
            value: Expr::binary(op, current, amount, line),
            line,
        })
    }

    fn delete_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.end_statement()?;
        Ok(Stmt::Delete {
            target,
            scope,
            line,
        })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        let expr = self.expression()?;
        self.end_statement()?;
        Ok(Stmt::Print {
            expr,
            newline: keyword.kind == TokenKind::Say,
            line: keyword.line(),
        })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        self.consume(&TokenKind::Back, "'back' after 'give'")?;
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.expression()?)
        };
        self.end_statement()?;
        Ok(Stmt::Return { value, line })
    }

    /// `ask <prompt> and store [the] result in <id>`
    fn ask_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        let prompt = self.expression()?;
        self.consume(&TokenKind::And, "'and' after ask prompt")?;
        self.consume(&TokenKind::Store, "'store' after 'and'")?;
        self.match_token(&TokenKind::The);
        self.consume(&TokenKind::Result, "'result' after 'store'")?;
        self.consume(&TokenKind::In, "'in' after 'store result'")?;
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.end_statement()?;
        Ok(Stmt::Set {
            target,
            scope,
            value: Expr::Call {
                function: "input".to_string(),
                args: vec![prompt],
                line,
            },
            line,
        })
    }

    /// `store <expr> in <id>`
    fn store_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        let value = self.expression()?;
        self.consume(&TokenKind::In, "'in' after value")?;
        let scope = self.scope_marker();
        let target = self.consume_identifier("variable name")?;
        self.end_statement()?;
        Ok(Stmt::Set {
            target,
            scope,
            value,
            line,
        })
    }

    fn terminate_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        self.consume(&TokenKind::Program, "'program' after 'terminate'")?;
        self.end_statement()?;
        Ok(Stmt::Call {
            function: "terminate".to_string(),
            args: Vec::new(),
            line,
        })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.end_statement()?;
        Ok(match expr {
            Expr::Call {
                function,
                args,
                line,
            } => Stmt::Call {
                function,
                args,
                line,
            },
            other => {
                let line = other.line();
                Stmt::Expression { expr: other, line }
            }
        })
    }

    fn at_statement_end(&self) -> bool {
        self.check(&TokenKind::Newline) || self.check(&TokenKind::Eof) || self.check(&TokenKind::Dedent)
    }

    //=============================================
    //            Section 6: Control Flow
    //=============================================

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        let condition = self.expression()?;
        let then_body = self.block()?;

        // `else if` nests a fresh If as the sole statement of the else branch
        let else_body = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
            line,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.advance().clone();
        if keyword.kind == TokenKind::Repeat {
            self.match_token(&TokenKind::While);
        }
        let condition = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::While {
            condition,
            body,
            line: keyword.line(),
        })
    }

    /// `for [every] <id> in [the] [list] [of] <expr>:`
    fn for_each_statement(&mut self) -> ParseResult<Stmt> {
        let line = self.advance().line();
        self.match_token(&TokenKind::Every);
        let variable = self.consume_identifier("loop variable")?;
        self.consume(&TokenKind::In, "'in' after loop variable")?;
        self.match_token(&TokenKind::The);
        // `in the list of xs:` names the variable xs; `in list of a, b:` is a literal
        let names_variable = matches!(self.peek_ahead(2).kind, TokenKind::Identifier(_))
            && self.peek_ahead(3).kind == TokenKind::Colon;
        if self.check(&TokenKind::List) && self.check_next(&TokenKind::Of) && names_variable {
            self.advance();
            self.advance();
        }
        let iterable = self.expression()?;
        let body = self.block()?;
        Ok(Stmt::ForEach {
            variable,
            iterable,
            body,
            line,
        })
    }

    //=============================================/*
    //  else-if chains nest at parse time; `for ... in the list of xs` iterates xs.
    //============================================*/
    //=============================================
    //            Section 7: Expressions
    //=============================================

    pub fn expression(&mut self) -> ParseResult<Expr> {
        self.nested(Self::or)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.check(&TokenKind::Or) {
            let line = self.advance().line();
            let right = self.and()?;
            expr = Expr::binary(BinaryOp::Or, expr, right, line);
        }
        Ok(expr)
    }

    /// Stops before `and store`, which belongs to the `ask` statement.
    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.check(&TokenKind::And) && !self.check_next(&TokenKind::Store) {
            let line = self.advance().line();
            let right = self.equality()?;
            expr = Expr::binary(BinaryOp::And, expr, right, line);
        }
        Ok(expr)
    }

    //Function: equality
    //Purpose: Normalize every `is ...` phrase into one of the six comparison operators
    //Inputs: &mut self
    //Returns: ParseResult<Expr>
    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.check(&TokenKind::Is) {
            let line = self.advance().line();
            let op = match self.peek().kind {
                TokenKind::Equal => {
                    self.advance();
                    self.match_token(&TokenKind::To);
                    BinaryOp::Equal
                }
                TokenKind::Not => {
                    self.advance();
                    if self.match_token(&TokenKind::Equal) {
                        self.match_token(&TokenKind::To);
                    }
                    BinaryOp::NotEqual
                }
                TokenKind::Greater => {
                    self.advance();
                    self.consume(&TokenKind::Than, "'than' after 'greater'")?;
                    if self.or_equal_follows() {
                        BinaryOp::GreaterEqual
                    } else {
                        BinaryOp::Greater
                    }
                }
                TokenKind::Less => {
                    self.advance();
                    self.consume(&TokenKind::Than, "'than' after 'less'")?;
                    if self.or_equal_follows() {
                        BinaryOp::LessEqual
                    } else {
                        BinaryOp::Less
                    }
                }
                TokenKind::At => {
                    self.advance();
                    if self.match_token(&TokenKind::Least) {
                        BinaryOp::GreaterEqual
                    } else if self.match_token(&TokenKind::Most) {
                        BinaryOp::LessEqual
                    } else {
                        return Err(self.error_at_current("'least' or 'most' after 'at'"));
                    }
                }
                _ => {
                    // `X is N`, `X is N or more`, `X is N or less`
                    let right = self.comparison()?;
                    let op = if self.check(&TokenKind::Or) && self.check_next(&TokenKind::More) {
                        self.advance();
                        self.advance();
                        BinaryOp::GreaterEqual
                    } else if self.check(&TokenKind::Or) && self.check_next(&TokenKind::Less) {
                        self.advance();
                        self.advance();
                        BinaryOp::LessEqual
                    } else {
                        BinaryOp::Equal
                    };
                    expr = Expr::binary(op, expr, right, line);
                    continue;
                }
            };
            let right = self.comparison()?;
            expr = Expr::binary(op, expr, right, line);
        }

        Ok(expr)
    }

    /// Consumes `or equal [to]` after `greater than` / `less than`.
    fn or_equal_follows(&mut self) -> bool {
        if self.check(&TokenKind::Or) && self.check_next(&TokenKind::Equal) {
            self.advance();
            self.advance();
            self.match_token(&TokenKind::To);
            true
        } else {
            false
        }
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Gt => BinaryOp::Greater,
                TokenKind::GtEq => BinaryOp::GreaterEqual,
                TokenKind::Lt => BinaryOp::Less,
                TokenKind::LtEq => BinaryOp::LessEqual,
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            let line = self.advance().line();
            let right = self.term()?;
            expr = Expr::binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                TokenKind::Followed => BinaryOp::Add,
                _ => break,
            };
            let operator = self.advance().clone();
            if operator.kind == TokenKind::Followed {
                self.consume(&TokenKind::By, "'by' after 'followed'")?;
            }
            let right = self.factor()?;
            expr = Expr::binary(op, expr, right, operator.line());
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash | TokenKind::Divided => BinaryOp::Divide,
                _ => break,
            };
            let operator = self.advance().clone();
            if operator.kind == TokenKind::Divided {
                self.match_token(&TokenKind::By);
            }
            let right = self.unary()?;
            expr = Expr::binary(op, expr, right, operator.line());
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek().kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            _ => return self.call(),
        };
        let line = self.advance().line();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            line,
        })
    }

    //=============================================/*
    //  Precedence: or > and > is-phrases > symbolic comparison > + - followed-by
    //  > * / divided-by > unary > call/member > primary.
    //============================================*/
    //=============================================
    //            Section 8: Calls, Members & Primaries
    //=============================================

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            match self.peek().kind {
                TokenKind::LeftParen => {
                    let paren = self.advance().clone();
                    let function = self.callee_name(&expr, &paren)?;
                    let args = self.parenthesized_arguments()?;
                    expr = Expr::Call {
                        function,
                        args,
                        line: paren.line(),
                    };
                }
                TokenKind::Dot => {
                    let line = self.advance().line();
                    let property = self.property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::string(property, line)),
                        line,
                    };
                }
                TokenKind::LeftBracket => {
                    let line = self.advance().line();
                    let index = self.expression()?;
                    self.consume(&TokenKind::RightBracket, "']' after index")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(index),
                        line,
                    };
                }
                TokenKind::Using | TokenKind::With => {
                    let keyword = self.advance().clone();
                    let function = self.callee_name(&expr, &keyword)?;
                    let args = self.natural_arguments()?;
                    expr = Expr::Call {
                        function,
                        args,
                        line: keyword.line(),
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn callee_name(&self, callee: &Expr, at: &Token) -> ParseResult<String> {
        match callee {
            Expr::Identifier {
                name,
                scope: Scope::Local,
                ..
            } => Ok(name.clone()),
            _ => Err(self.invalid_at(at, "Only named functions can be called")),
        }
    }

    fn parenthesized_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(&TokenKind::RightParen, "')' after arguments")?;
        Ok(args)
    }

    //Function: natural_arguments
    //Purpose: Parse `using a and b` arguments below the logical-and level so the
    //         separating `and` is never read as a boolean operator
    //Inputs: &mut self
    //Returns: ParseResult<Vec<Expr>>
    fn natural_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.at_argument_boundary() {
            return Ok(args);
        }
        args.push(self.comparison()?);
        loop {
            let separated = (self.check(&TokenKind::And) && !self.check_next(&TokenKind::Store))
                || self.check(&TokenKind::Comma);
            if !separated {
                break;
            }
            self.advance();
            args.push(self.comparison()?);
        }
        Ok(args)
    }

    fn at_argument_boundary(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Dedent
                | TokenKind::Colon
                | TokenKind::And
                | TokenKind::Comma
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
        )
    }

    /// Property names after `.` may be plain words that happen to be keywords (`xs.length`).
    fn property_name(&mut self) -> ParseResult<String> {
        let token = self.peek().clone();
        let word_like = token
            .text
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::String(_) | TokenKind::Number(_) => {
                Err(self.error_at_current("property name after '.'"))
            }
            _ if word_like => {
                self.advance();
                Ok(token.text)
            }
            _ => Err(self.error_at_current("property name after '.'")),
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        let line = token.line();

        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::number(value, line))
            }
            TokenKind::String(text) => {
                self.advance();
                Ok(Expr::string(text, line))
            }
            TokenKind::Boolean(flag) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Boolean(flag),
                    line,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::identifier(name, Scope::Local, line))
            }
            TokenKind::Global => {
                self.advance();
                let name = self.consume_identifier("variable name after 'global'")?;
                Ok(Expr::identifier(name, Scope::Global, line))
            }
            TokenKind::Length => {
                self.advance();
                if self.match_token(&TokenKind::Of) {
                    let argument = self.call()?;
                    Ok(Expr::Call {
                        function: "length".to_string(),
                        args: vec![argument],
                        line,
                    })
                } else if self.match_token(&TokenKind::LeftParen) {
                    let args = self.parenthesized_arguments()?;
                    Ok(Expr::Call {
                        function: "length".to_string(),
                        args,
                        line,
                    })
                } else {
                    Err(self.error_at_current("'of' after 'length'"))
                }
            }
            TokenKind::List if self.check_next(&TokenKind::Of) => {
                self.advance();
                self.advance();
                self.list_literal(line)
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(&TokenKind::RightParen, "')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(&TokenKind::RightBracket, "']' after list elements")?;
                Ok(Expr::Array { elements, line })
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.object_literal(line)
            }
            _ => Err(self.error_at_current("expression")),
        }
    }

    /// `list of a, b and c`: bare identifiers are taken as text, not variables.
    fn list_literal(&mut self, line: usize) -> ParseResult<Expr> {
        let mut elements = vec![self.list_element()?];
        loop {
            if self.match_token(&TokenKind::Comma) {
                self.match_token(&TokenKind::And);
            } else if self.check(&TokenKind::And) && !self.check_next(&TokenKind::Store) {
                self.advance();
            } else {
                break;
            }
            elements.push(self.list_element()?);
        }
        Ok(Expr::Array { elements, line })
    }

    fn list_element(&mut self) -> ParseResult<Expr> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let element = Expr::string(name.clone(), self.peek().line());
            self.advance();
            return Ok(element);
        }
        self.unary()
    }

    fn object_literal(&mut self, line: usize) -> ParseResult<Expr> {
        let mut properties = Vec::new();
        self.skip_layout();
        if !self.check(&TokenKind::RightBrace) {
            loop {
                self.skip_layout();
                let key = match &self.peek().kind {
                    TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
                    _ => return Err(self.error_at_current("property name")),
                };
                self.advance();
                self.consume(&TokenKind::Colon, "':' after property name")?;
                let value = self.expression()?;
                properties.push((key, value));
                self.skip_layout();
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.skip_layout();
        self.consume(&TokenKind::RightBrace, "'}' after record")?;
        Ok(Expr::Object { properties, line })
    }

    /// Records may span lines; layout tokens inside braces carry no meaning.
    fn skip_layout(&mut self) {
        while self.check(&TokenKind::Newline)
            || self.check(&TokenKind::Indent)
            || self.check(&TokenKind::Dedent)
        {
            self.advance();
        }
    }
}

//=============================================/*
//  Natural-language calls parse each argument at comparison level; list
//  literals use their own element path.
//============================================*/

/// Tokenize-independent entry point: parse an already tokenized program.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Program> {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse_source(source: &str) -> ParseResult<Program> {
        parse(tokenize(source).expect("tokenize"))
    }

    fn body(source: &str) -> Vec<Stmt> {
        parse_source(source).expect("parse").body
    }

    fn single_expr(source: &str) -> Expr {
        match body(&format!("say {}", source)).remove(0) {
            Stmt::Print { expr, .. } => expr,
            other => panic!("expected print, got {:?}", other),
        }
    }

    fn op_of(expr: &Expr) -> BinaryOp {
        match expr {
            Expr::Binary { op, .. } => *op,
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_program() {
        assert!(body("").is_empty());
        assert!(body("\n\n# only a comment\n").is_empty());
    }

    #[test]
    fn test_synonymous_assignments() {
        let stmts = body("remember a as 1\nvar b as 2\nset c to 3");
        assert_eq!(stmts.len(), 3);
        for stmt in &stmts {
            assert!(matches!(stmt, Stmt::Set { scope: Scope::Local, .. }));
        }
    }

    #[test]
    fn test_mutation_forms() {
        let stmts = body("increase x by 1\nadd 1 to x\ndecrease x by 2\nsubtract 2 from x");
        assert!(matches!(stmts[0], Stmt::Add { .. }));
        assert!(matches!(stmts[1], Stmt::Add { .. }));
        assert!(matches!(stmts[2], Stmt::Remove { .. }));
        assert!(matches!(stmts[3], Stmt::Remove { .. }));
    }

    #[test]
    fn test_multiply_rewrites_to_set() {
        let stmts = body("multiply x by 2");
        match &stmts[0] {
            Stmt::Set { target, value, .. } => {
                assert_eq!(target, "x");
                match value {
                    Expr::Binary { op, left, .. } => {
                        assert_eq!(*op, BinaryOp::Multiply);
                        assert!(matches!(**left, Expr::Identifier { ref name, .. } if name == "x"));
                    }
                    other => panic!("unexpected value {:?}", other),
                }
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_global_markers() {
        let stmts = body("set global total to 0\nadd 1 to global total\ndelete global total");
        assert!(matches!(stmts[0], Stmt::Set { scope: Scope::Global, .. }));
        assert!(matches!(stmts[1], Stmt::Add { scope: Scope::Global, .. }));
        assert!(matches!(stmts[2], Stmt::Delete { scope: Scope::Global, .. }));
    }

    #[test]
    fn test_natural_comparisons_normalize() {
        let cases = [
            ("x is equal to 1", BinaryOp::Equal),
            ("x is 1", BinaryOp::Equal),
            ("x is not 1", BinaryOp::NotEqual),
            ("x is not equal to 1", BinaryOp::NotEqual),
            ("x is greater than 1", BinaryOp::Greater),
            ("x is greater than or equal to 1", BinaryOp::GreaterEqual),
            ("x is less than 1", BinaryOp::Less),
            ("x is less than or equal to 1", BinaryOp::LessEqual),
            ("x is at least 1", BinaryOp::GreaterEqual),
            ("x is at most 1", BinaryOp::LessEqual),
            ("x is 1 or more", BinaryOp::GreaterEqual),
            ("x is 1 or less", BinaryOp::LessEqual),
            ("x >= 1", BinaryOp::GreaterEqual),
        ];
        for (source, expected) in cases {
            assert_eq!(op_of(&single_expr(source)), expected, "{}", source);
        }
    }

    #[test]
    fn test_is_followed_by_logical_or() {
        let expr = single_expr("x is 1 or y is 2");
        assert_eq!(op_of(&expr), BinaryOp::Or);
    }

    #[test]
    fn test_ask_leaves_and_store_alone() {
        let stmts = body("ask \"Name?\" and store result in name");
        match &stmts[0] {
            Stmt::Set { target, value, .. } => {
                assert_eq!(target, "name");
                assert!(matches!(value, Expr::Call { function, args, .. }
                    if function == "input" && args.len() == 1));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_natural_call_arguments() {
        let stmts = body("var area as calculateArea using 5 and 3");
        match &stmts[0] {
            Stmt::Set { value: Expr::Call { function, args, .. }, .. } => {
                assert_eq!(function, "calculateArea");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_call_statement_forms() {
        let stmts = body("greet using \"Bob\"\ngreet(\"Bob\", 1 and 2)\nterminate program");
        assert!(matches!(&stmts[0], Stmt::Call { function, args, .. } if function == "greet" && args.len() == 1));
        assert!(matches!(&stmts[1], Stmt::Call { args, .. } if args.len() == 2));
        assert!(matches!(&stmts[2], Stmt::Call { function, .. } if function == "terminate"));
    }

    #[test]
    fn test_list_of_bare_words_are_strings() {
        let expr = single_expr("list of apple, banana and cherry");
        match expr {
            Expr::Array { elements, .. } => {
                assert_eq!(
                    elements,
                    vec![
                        Expr::string("apple", 1),
                        Expr::string("banana", 1),
                        Expr::string("cherry", 1),
                    ]
                );
            }
            other => panic!("unexpected expression {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain_nests() {
        let source = "if x is 1:\n    say 1\nelse if x is 2:\n    say 2\nelse if x is 3:\n    say 3\nelse:\n    say 4\n";
        let stmts = body(source);
        assert_eq!(stmts.len(), 1);
        let Stmt::If { else_body: Some(first), .. } = &stmts[0] else {
            panic!("expected if with else");
        };
        let Stmt::If { else_body: Some(second), .. } = &first[0] else {
            panic!("expected nested if");
        };
        let Stmt::If { else_body: Some(last), .. } = &second[0] else {
            panic!("expected innermost if");
        };
        assert!(matches!(last[0], Stmt::Print { .. }));
    }

    #[test]
    fn test_indent_width_does_not_matter() {
        let two = "when the program starts:\n  set x to 1\n  if x is 1:\n    say x\n";
        let four = "when the program starts:\n    set x to 1\n    if x is 1:\n        say x\n";
        assert_eq!(parse_source(two), parse_source(four));
    }

    #[test]
    fn test_event_names() {
        let stmts = body("when start:\n  say 1\nwhen clicked:\n  say 2\nevery 0.5 seconds:\n  say 3");
        let names: Vec<_> = stmts
            .iter()
            .map(|stmt| match stmt {
                Stmt::Event(decl) => decl.name.clone(),
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["start", "clicked", "timer"]);
        if let Stmt::Event(decl) = &stmts[2] {
            assert_eq!(decl.timer.map(|t| t.period_ms()), Some(500.0));
        }
    }

    #[test]
    fn test_timer_rejects_unknown_unit_and_zero() {
        let err = parse_source("every 2 minutes:\n  say 1").expect_err("unit");
        assert!(err.to_string().contains("Unknown time unit 'minutes'"));
        let err = parse_source("every 0 seconds:\n  say 1").expect_err("zero");
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_block_requires_indentation() {
        let err = parse_source("if x:\nsay x").expect_err("missing indent");
        assert_eq!(err.line(), 2);
        assert!(err.to_string().starts_with("Expected indented block"));
    }

    #[test]
    fn test_nested_declaration_rejected() {
        let err = parse_source("when start:\n  to f:\n    say 1").expect_err("nested");
        assert!(err.to_string().contains("only allowed at the top level"));
    }

    #[test]
    fn test_missing_keyword_reports_position() {
        let err = parse_source("set x 5").expect_err("missing to");
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "'to' after variable name".to_string(),
                found: "'5'".to_string(),
                line: 1,
                column: 7,
            }
        );
    }

    #[test]
    fn test_members_and_records() {
        let expr = single_expr("{name: \"Ada\", \"age\": 36}.name");
        assert!(matches!(expr, Expr::Member { .. }));
        let expr = single_expr("xs[0].length");
        match expr {
            Expr::Member { object, property, .. } => {
                assert_eq!(*property, Expr::string("length", 1));
                assert!(matches!(*object, Expr::Member { .. }));
            }
            other => panic!("unexpected expression {:?}", other),
        }
    }

    #[test]
    fn test_length_of_and_divided_by() {
        let expr = single_expr("length of numbers");
        assert!(matches!(expr, Expr::Call { ref function, .. } if function == "length"));
        assert_eq!(op_of(&single_expr("10 divided by 2")), BinaryOp::Divide);
        assert_eq!(op_of(&single_expr("\"a\" followed by 1")), BinaryOp::Add);
    }

    #[test]
    fn test_bare_expression_statement() {
        let stmts = body("x + 1");
        assert!(matches!(stmts[0], Stmt::Expression { .. }));
    }

    #[test]
    fn test_for_each_list_of_forms() {
        let named = body("for every x in the list of xs:\n    say x\n");
        match &named[0] {
            Stmt::ForEach { iterable, .. } => {
                assert!(matches!(iterable, Expr::Identifier { name, .. } if name == "xs"));
            }
            other => panic!("unexpected statement {:?}", other),
        }
        let literal = body("for x in list of a, b:\n    say x\n");
        match &literal[0] {
            Stmt::ForEach { iterable, .. } => {
                assert!(matches!(iterable, Expr::Array { elements, .. } if elements.len() == 2));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let shallow = format!("say {}1{}", "(".repeat(40), ")".repeat(40));
        assert!(parse_source(&shallow).is_ok());

        let parens = format!("say {}1{}", "(".repeat(500), ")".repeat(500));
        let err = parse_source(&parens).expect_err("too deep");
        assert!(matches!(err, ParseError::InvalidSyntax { .. }), "{:?}", err);
        assert!(err.to_string().contains("nested too deeply"));

        let nots = format!("say {}true", "not ".repeat(500));
        assert!(matches!(
            parse_source(&nots),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }
}
