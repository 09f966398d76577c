//! # Venom Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the venom
//! language. The AST is produced by the parser and consumed by the
//! bytecode compiler.
//!
//! Expressions compile to instruction sequences that leave exactly one
//! value on the VM stack; statements compile to stack-neutral sequences.
//! A `let` inside a function body stores into a frame slot reserved by
//! the function's prologue.

/// Prefix operator in a unary expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation: `-x`.
    Negate,
    /// Logical negation: `!x`.
    Not,
}

/// Infix operator in a binary expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    GtEq,
    LtEq,
    EqEq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number literal. All venom numbers are IEEE-754 doubles.
    Number(f64),

    /// String literal: `"hello"`.
    Str(String),

    /// Boolean literal: `true` / `false`.
    Bool(bool),

    /// The `null` literal.
    Null,

    /// Variable reference by name (a global, or a parameter/local
    /// inside a function body).
    Variable(String),

    Unary {
        op: UnaryOp,
        rhs: Box<Expression>,
    },

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    /// Function call: `add(2, 3)`.
    Call {
        name: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `print expr;`
    Print(Expression),

    /// `let name = expr;`
    Let { name: String, value: Expression },

    /// `name = expr;`
    Assign { name: String, value: Expression },

    /// `{ stmt* }`
    Block(Vec<Statement>),

    /// `if (cond) stmt` with an optional `else stmt`.
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },

    /// `fn name(params) { body }`
    Fn {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
    },

    /// `return expr;`, valid only inside a function body.
    Return(Expression),
}
