use std::{fmt::Display, sync::Arc};

use itertools::Itertools;
use num::ToPrimitive;

use crate::{env::Environment, error::EvalError, identifier::Identifier};

mod define;
mod expr;
mod func;

pub use define::Define;
pub use expr::Expr;
pub use func::Builtin;

/// What a name can be bound to.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Function(Function),
}

#[derive(Clone, Debug)]
pub enum Function {
    Builtin(Builtin),
    User(Arc<Define>),
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Builtin(a), Function::Builtin(b)) => a == b,
            (Function::User(a), Function::User(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Builtin(builtin) => builtin.as_str(),
            Function::User(define) => define.name.as_str(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Builtin(_) => 1,
            Function::User(define) => define.params.len(),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        match self {
            Function::Builtin(builtin) => match args {
                [arg] => builtin
                    .evaluate(arg.as_number(builtin.as_str())?)
                    .map(Value::Number),
                _ => Err(EvalError::Arity {
                    name: builtin.as_str().to_owned(),
                    expected: 1,
                    found: args.len(),
                }),
            },
            Function::User(define) => define.call(args),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::Builtin(builtin) => write!(f, "<built-in {builtin}>"),
            Function::User(define) => {
                write!(f, "<function {}({})>", define.name, define.params.iter().join(", "))
            }
        }
    }
}

impl Value {
    /// The numeric reading of this value; booleans count as 0 and 1.
    pub fn as_number(&self, op: &'static str) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Function(_) => Err(EvalError::FunctionOperand(op)),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Function(Function::Builtin(builtin))
    }
}

impl From<Define> for Value {
    fn from(define: Define) -> Self {
        Value::Function(Function::User(Arc::new(define)))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Function(func) => write!(f, "{func}"),
        }
    }
}

/// Whole numbers print without a fractional part, everything else in the
/// shortest form that reads back to the same `f64`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e16 {
        if let Some(i) = n.to_i64() {
            return i.to_string();
        }
    }
    n.to_string()
}

/// Name resolution for one evaluation: the activation frame of the
/// function being called (if any), then the environment behind it.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    frame: &'a [(Identifier, Value)],
    env: &'a Environment,
}

impl<'a> Scope<'a> {
    pub fn global(env: &'a Environment) -> Self {
        Scope { frame: &[], env }
    }

    pub fn with_frame(frame: &'a [(Identifier, Value)], env: &'a Environment) -> Self {
        Scope { frame, env }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.frame
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(_, value)| value)
            .or_else(|| self.env.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::from(4.0).to_string(), "4");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from(0.1 + 0.2).to_string(), "0.30000000000000004");
        assert_eq!(Value::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(Builtin::Sin).to_string(), "<built-in sin>");
    }

    #[test]
    fn frame_shadows_environment() {
        let mut env = Environment::new();
        env.bind(Identifier::from("n"), Value::from(1.0));
        env.bind(Identifier::from("a"), Value::from(2.0));
        let frame = [(Identifier::from("n"), Value::from(10.0))];
        let scope = Scope::with_frame(&frame, &env);
        assert_eq!(scope.lookup("n"), Some(&Value::from(10.0)));
        assert_eq!(scope.lookup("a"), Some(&Value::from(2.0)));
        assert_eq!(scope.lookup("b"), None);
    }

    #[test]
    fn booleans_are_numbers_but_functions_are_not() {
        assert_eq!(Value::from(true).as_number("+"), Ok(1.0));
        assert_eq!(
            Value::from(Builtin::Cos).as_number("+"),
            Err(EvalError::FunctionOperand("+"))
        );
    }
}
