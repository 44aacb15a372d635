use thiserror::Error;

use crate::parser::{Operator, SyntaxErrors};

/// Runtime faults raised while walking an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown name `{0}`")]
    UnknownName(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("`{0}` is not a function")]
    NotCallable(String),
    #[error("`{name}` takes {expected} argument(s) but {found} were given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("a function cannot be used as an operand of `{0}`")]
    FunctionOperand(&'static str),
    #[error("`{0}` needs whole-number operands")]
    NonIntegral(Operator),
    #[error("math domain error in `{0}`")]
    Domain(String),
    #[error("numeric overflow")]
    Overflow,
}

/// A definition statement that cannot be decomposed into a binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("missing `:=`")]
    MissingDelimiter,
    #[error("`{0}` is not a valid name")]
    InvalidName(String),
    #[error("`{0}` is not a valid parameter name")]
    InvalidParameter(String),
    #[error("parameter `{0}` appears more than once")]
    DuplicateParameter(String),
    #[error("functions take at most {max} parameters, found {0}", max = crate::MAX_PARAMETERS)]
    TooManyParameters(usize),
    #[error("unclosed parameter list")]
    UnclosedParameters,
    #[error("nothing to assign")]
    EmptyValue,
}

/// Everything that can go wrong with a single record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquationError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxErrors),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("invalid assignment: {0}")]
    Assignment(#[from] AssignmentError),
}
