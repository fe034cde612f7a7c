//! Parsed expression tree.

use serde::{Deserialize, Serialize};

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// Numeric literal, or a folded fixed variable
    Number(f64),
    /// Variable reference (lower-cased declared name)
    Variable(String),
    /// Negation of the whole following sub-expression
    UnaryMinus(Box<Term>),
    /// Fresh pseudorandom draw on each evaluation
    Random,
    BinaryOp {
        op: BinaryOperator,
        left: Box<Term>,
        right: Box<Term>,
    },
    /// One-argument call into the function table
    Function { name: String, arg: Box<Term> },
    /// Two-argument call into the function table
    Function2 {
        name: String,
        first: Box<Term>,
        second: Box<Term>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    /// Integer remainder of the rounded operands
    Mod,
    Mul,
    Div,
    Pow,
}

impl Term {
    pub fn binary(op: BinaryOperator, left: Term, right: Term) -> Self {
        Self::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(operand: Term) -> Self {
        Self::UnaryMinus(Box::new(operand))
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Term> {
        match self {
            Self::Number(_) | Self::Variable(_) | Self::Random => Vec::new(),
            Self::UnaryMinus(operand) => vec![operand.as_ref()],
            Self::BinaryOp { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Function { arg, .. } => vec![arg.as_ref()],
            Self::Function2 { first, second, .. } => vec![first.as_ref(), second.as_ref()],
        }
    }
}
