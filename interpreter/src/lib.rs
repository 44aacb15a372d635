//! The expression language behind the printing calculator.
//!
//! Each submitted line becomes an [`Equation`]: a comment, an assignment
//! that binds a name in the session's [`Environment`], or an equation that
//! is evaluated against it. A [`History`] keeps the lines of one session in
//! order.

mod assign;
pub mod env;
mod equation;
pub mod error;
pub mod export;
mod history;
mod identifier;
mod normalize;
pub mod parser;
mod sample;
mod value;

/// Most parameters a user-defined function may take.
pub const MAX_PARAMETERS: usize = 5;

pub use assign::{build_function, is_assignment, parse_assignment, DELIMITER};
pub use env::Environment;
pub use equation::{Equation, Kind, Output, ERROR_SENTINEL};
pub use error::{AssignmentError, EquationError, EvalError};
pub use export::{ExportError, ExportOptions, Format};
pub use history::{History, HistoryError};
pub use identifier::Identifier;
pub use normalize::normalize;
pub use parser::{evaluate, parse_expr};
pub use sample::sample;
pub use value::{format_number, Builtin, Define, Expr, Function, Scope, Value};
