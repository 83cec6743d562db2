//=====================================================
// File: ast/mod.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: PlainTalk Abstract Syntax Tree definitions
// Objective: Define the closed statement and expression node types produced
//            by the parser and walked by the interpreter
//=====================================================

use std::fmt;
use std::rc::Rc;

//=============================================
//            Section 1: Program & Declarations
//=============================================

/// Root of a parsed PlainTalk source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub line: usize,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body, line: 1 }
    }
}

/// Which variable table a write (or an explicit `global` read) targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn millis_factor(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1000.0,
            TimeUnit::Milliseconds => 1.0,
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "seconds" | "second" => Some(TimeUnit::Seconds),
            "ms" | "milliseconds" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }
}

/// Period of a repeating `every N <unit>:` event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSpec {
    pub interval: f64,
    pub unit: TimeUnit,
}

impl TimerSpec {
    pub fn period_ms(&self) -> f64 {
        self.interval * self.unit.millis_factor()
    }
}

/// Name given to events declared with `every ...:`.
pub const TIMER_EVENT: &str = "timer";
/// Name given to `when the program starts:` / `when start:`.
pub const START_EVENT: &str = "start";

#[derive(Debug, Clone, PartialEq)]
pub struct EventDecl {
    pub name: String,
    pub timer: Option<TimerSpec>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

//=============================================/*
//  Declarations are shared (Rc) between the tree and the runtime tables.
//============================================*/
//=============================================
//            Section 2: Statements
//=============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Event(Rc<EventDecl>),
    Function(Rc<FunctionDecl>),
    Set {
        target: String,
        scope: Scope,
        value: Expr,
        line: usize,
    },
    Add {
        target: String,
        scope: Scope,
        amount: Expr,
        line: usize,
    },
    Remove {
        target: String,
        scope: Scope,
        amount: Expr,
        line: usize,
    },
    Delete {
        target: String,
        scope: Scope,
        line: usize,
    },
    Call {
        function: String,
        args: Vec<Expr>,
        line: usize,
    },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        line: usize,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    ForEach {
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    Print {
        expr: Expr,
        newline: bool,
        line: usize,
    },
    Return {
        value: Option<Expr>,
        line: usize,
    },
    Expression {
        expr: Expr,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Event(decl) => decl.line,
            Stmt::Function(decl) => decl.line,
            Stmt::Set { line, .. }
            | Stmt::Add { line, .. }
            | Stmt::Remove { line, .. }
            | Stmt::Delete { line, .. }
            | Stmt::Call { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::ForEach { line, .. }
            | Stmt::Print { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Expression { line, .. } => *line,
        }
    }
}

//=============================================
//            Section 3: Expressions
//=============================================

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        line: usize,
    },
    Identifier {
        name: String,
        scope: Scope,
        line: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: usize,
    },
    Call {
        function: String,
        args: Vec<Expr>,
        line: usize,
    },
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        line: usize,
    },
    Array {
        elements: Vec<Expr>,
        line: usize,
    },
    Object {
        properties: Vec<(String, Expr)>,
        line: usize,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Identifier { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Call { line, .. }
            | Expr::Member { line, .. }
            | Expr::Array { line, .. }
            | Expr::Object { line, .. } => *line,
        }
    }

    pub fn number(value: f64, line: usize) -> Self {
        Expr::Literal {
            value: Literal::Number(value),
            line,
        }
    }

    pub fn string(value: impl Into<String>, line: usize) -> Self {
        Expr::Literal {
            value: Literal::String(value.into()),
            line,
        }
    }

    pub fn identifier(name: impl Into<String>, scope: Scope, line: usize) -> Self {
        Expr::Identifier {
            name: name.into(),
            scope,
            line,
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, line: usize) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            line,
        }
    }
}
