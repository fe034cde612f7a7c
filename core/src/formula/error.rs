use thiserror::Error;

/// Parse error with location info
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the expression text
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Declaration and parse failures reported to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Invalid name: '{0}'")]
    InvalidName(String),
    #[error("Reserved name: '{0}'")]
    ReservedName(String),
    #[error("Duplicate key: '{0}'")]
    DuplicateKey(String),
    /// Every parse failure collapses into this one kind.
    #[error("Invalid input: {0}")]
    InvalidInput(ParseError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("No expression has been parsed")]
    NoExpression,
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Invalid modulo: {dividend} % {divisor}")]
    InvalidModulo { dividend: i64, divisor: i64 },
}
