//=============================================
// plaintalk/tokenizer.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk indentation-aware tokenizer
// Objective: Turn source text into a flat token stream with synthesized
//            NEWLINE/INDENT/DEDENT structure for the parser
// Formatting: Zobie.format
//=============================================

//=============================================
//            Section 1: Imports
//=============================================

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

//=============================================
//            Section 2: Positions & Tokens
//=============================================

/// Represents the position of a token in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// All possible token types in PlainTalk
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Identifier(String),
    Number(f64),
    String(String),
    Boolean(bool),

    // Declarations & events
    When,
    Program,
    Starts,
    Start,
    Every,
    To,

    // Assignment & mutation
    Remember,
    Var,
    Set,
    As,
    Global,
    Increase,
    Decrease,
    Add,
    Subtract,
    Multiply,
    Divide,
    By,
    From,
    Delete,
    Store,
    Result,

    // Control flow
    If,
    Else,
    While,
    Repeat,
    For,
    In,
    Give,
    Back,
    Terminate,

    // Input & output
    Say,
    Display,
    Ask,

    // Calls
    Using,
    With,

    // Natural-language operators
    And,
    Or,
    Not,
    The,
    Is,
    Equal,
    Greater,
    Less,
    Than,
    More,
    At,
    Least,
    Most,
    Followed,
    Divided,
    Of,
    List,
    Length,

    // Symbolic operators
    Plus,
    Minus,
    Star,
    Slash,
    EqualEqual,
    NotEqual,
    Gt,
    GtEq,
    Lt,
    LtEq,

    // Delimiters
    Colon,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// Human-readable description used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("'{}'", name),
            TokenKind::Number(value) => format!("'{}'", value),
            TokenKind::String(text) => format!("\"{}\"", text),
            TokenKind::Boolean(flag) => format!("'{}'", flag),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indentation".to_string(),
            TokenKind::Dedent => "end of block".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::Number(value) => write!(f, "{}", value),
            TokenKind::String(text) => write!(f, "\"{}\"", text),
            TokenKind::Boolean(flag) => write!(f, "{}", flag),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::EqualEqual => f.write_str("=="),
            TokenKind::NotEqual => f.write_str("!="),
            TokenKind::Gt => f.write_str(">"),
            TokenKind::GtEq => f.write_str(">="),
            TokenKind::Lt => f.write_str("<"),
            TokenKind::LtEq => f.write_str("<="),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Dot => f.write_str("."),
            TokenKind::LeftParen => f.write_str("("),
            TokenKind::RightParen => f.write_str(")"),
            TokenKind::LeftBracket => f.write_str("["),
            TokenKind::RightBracket => f.write_str("]"),
            TokenKind::LeftBrace => f.write_str("{"),
            TokenKind::RightBrace => f.write_str("}"),
            keyword => match KEYWORDS.iter().find(|(_, kind)| *kind == keyword) {
                Some((text, _)) => f.write_str(text),
                None => write!(f, "{:?}", keyword),
            },
        }
    }
}

/// A token with its kind, source lexeme and position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

//=============================================/*
//  Token model: literal classes, contextual keywords, operators and layout kinds.
//============================================*/
//=============================================
//            Section 3: Keyword Table & Lex Errors
//=============================================

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("when", TokenKind::When),
        ("program", TokenKind::Program),
        ("starts", TokenKind::Starts),
        ("start", TokenKind::Start),
        ("every", TokenKind::Every),
        ("to", TokenKind::To),
        ("remember", TokenKind::Remember),
        ("var", TokenKind::Var),
        ("set", TokenKind::Set),
        ("as", TokenKind::As),
        ("global", TokenKind::Global),
        ("increase", TokenKind::Increase),
        ("decrease", TokenKind::Decrease),
        ("add", TokenKind::Add),
        ("subtract", TokenKind::Subtract),
        ("multiply", TokenKind::Multiply),
        ("divide", TokenKind::Divide),
        ("by", TokenKind::By),
        ("from", TokenKind::From),
        ("delete", TokenKind::Delete),
        ("store", TokenKind::Store),
        ("result", TokenKind::Result),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("while", TokenKind::While),
        ("repeat", TokenKind::Repeat),
        ("for", TokenKind::For),
        ("in", TokenKind::In),
        ("give", TokenKind::Give),
        ("back", TokenKind::Back),
        ("terminate", TokenKind::Terminate),
        ("say", TokenKind::Say),
        ("display", TokenKind::Display),
        ("ask", TokenKind::Ask),
        ("using", TokenKind::Using),
        ("with", TokenKind::With),
        ("and", TokenKind::And),
        ("or", TokenKind::Or),
        ("not", TokenKind::Not),
        ("the", TokenKind::The),
        ("is", TokenKind::Is),
        ("equal", TokenKind::Equal),
        ("greater", TokenKind::Greater),
        ("less", TokenKind::Less),
        ("than", TokenKind::Than),
        ("more", TokenKind::More),
        ("at", TokenKind::At),
        ("least", TokenKind::Least),
        ("most", TokenKind::Most),
        ("followed", TokenKind::Followed),
        ("divided", TokenKind::Divided),
        ("of", TokenKind::Of),
        ("list", TokenKind::List),
        ("length", TokenKind::Length),
        ("true", TokenKind::Boolean(true)),
        ("false", TokenKind::Boolean(false)),
    ])
});

/// Malformed source detected before parsing begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

//=============================================
//            Section 4: Tokenizer
//=============================================

/// Width a tab contributes to a line's indentation.
const TAB_WIDTH: usize = 4;

/// Tokenizer for PlainTalk
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            indent_stack: vec![0],
        }
    }

    //Function: tokenize
    //Purpose: Scan the whole input once, left to right, producing the token stream
    //Inputs: &mut self
    //Returns: Result<Vec<Token>, LexError>
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let ch = self.current_char();

            if ch == '\n' {
                self.handle_newline();
                continue;
            }

            if self.at_comment_start() {
                self.skip_comment();
                continue;
            }

            if ch == '"' || ch == '\'' {
                self.handle_string(ch)?;
                continue;
            }

            if ch.is_ascii_digit() {
                self.handle_number()?;
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                self.handle_identifier();
                continue;
            }

            self.handle_operator_or_delimiter()?;
        }

        // Close every open block before EOF
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.emit_token(TokenKind::Dedent, "", self.current_position());
        }

        self.emit_token(TokenKind::Eof, "", self.current_position());
        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.current_char();
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn emit_token(&mut self, kind: TokenKind, text: impl Into<String>, position: Position) {
        self.tokens.push(Token::new(kind, text, position));
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && matches!(self.current_char(), ' ' | '\t' | '\r') {
            self.advance();
        }
    }

    fn at_comment_start(&self) -> bool {
        let ch = self.current_char();
        ch == '#' || (ch == '/' && self.peek_char() == Some('/'))
    }

    fn skip_comment(&mut self) {
        while !self.is_at_end() && self.current_char() != '\n' {
            self.advance();
        }
    }

    fn handle_newline(&mut self) {
        let position = self.current_position();
        self.advance(); // consume '\n'
        self.emit_token(TokenKind::Newline, "\n", position);
        self.handle_indentation();
    }

    //Function: handle_indentation
    //Purpose: Compare the new line's leading width with the indent stack and
    //         synthesize INDENT/DEDENT tokens
    //Inputs: &mut self
    //Returns: ()
    fn handle_indentation(&mut self) {
        let mut indent_level = 0;

        while !self.is_at_end() && matches!(self.current_char(), ' ' | '\t') {
            if self.advance() == '\t' {
                indent_level += TAB_WIDTH;
            } else {
                indent_level += 1;
            }
        }

        // Blank and comment-only lines leave the stack alone
        if self.is_at_end() || matches!(self.current_char(), '\n' | '\r') || self.at_comment_start()
        {
            return;
        }

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        let position = self.current_position();

        if indent_level > current_indent {
            self.indent_stack.push(indent_level);
            self.emit_token(TokenKind::Indent, "", position);
        } else if indent_level < current_indent {
            // Lenient: a width between two frames closes the deeper one only
            while self.indent_stack.len() > 1 {
                match self.indent_stack.last() {
                    Some(&level) if level > indent_level => {
                        self.indent_stack.pop();
                        self.emit_token(TokenKind::Dedent, "", position);
                    }
                    _ => break,
                }
            }
        }
    }

    fn handle_string(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.current_position();
        self.advance(); // consume opening quote

        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(LexError::new("Unterminated string", start));
            }
            let ch = self.advance();
            if ch == quote {
                break;
            }
            value.push(ch);
            // Escapes pass through verbatim; the escaped char never closes the literal
            if ch == '\\' && !self.is_at_end() {
                value.push(self.advance());
            }
        }

        let text = format!("{quote}{value}{quote}");
        self.emit_token(TokenKind::String(value), text, start);
        Ok(())
    }

    fn handle_number(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let mut number = String::new();

        while self.current_char().is_ascii_digit() {
            number.push(self.advance());
        }

        if self.current_char() == '.' && self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            number.push(self.advance());
            while self.current_char().is_ascii_digit() {
                number.push(self.advance());
            }
        }

        let value = number
            .parse::<f64>()
            .map_err(|_| LexError::new(format!("Invalid number literal '{}'", number), start))?;
        self.emit_token(TokenKind::Number(value), number, start);
        Ok(())
    }

    fn handle_identifier(&mut self) {
        let start = self.current_position();
        let mut identifier = String::new();
        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            identifier.push(self.advance());
        }
        let kind = KEYWORDS
            .get(identifier.as_str())
            .cloned()
            .unwrap_or_else(|| TokenKind::Identifier(identifier.clone()));
        self.emit_token(kind, identifier, start);
    }

    fn handle_operator_or_delimiter(&mut self) -> Result<(), LexError> {
        let start = self.current_position();
        let ch = self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' if self.current_char() == '=' => {
                self.advance();
                TokenKind::EqualEqual
            }
            '!' if self.current_char() == '=' => {
                self.advance();
                TokenKind::NotEqual
            }
            '<' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.current_char() == '=' {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            _ => {
                return Err(LexError::new(
                    format!("Unexpected character '{}'", ch),
                    start,
                ));
            }
        };

        let text = self.input[start.offset..self.position].iter().collect::<String>();
        self.emit_token(kind, text, start);
        Ok(())
    }
}

/// Convenience wrapper: tokenize a whole source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(source).tokenize()
}
