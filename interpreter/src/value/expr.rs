use std::fmt::Display;

use itertools::Itertools;
use num::ToPrimitive;

use crate::{
    error::EvalError,
    identifier::Identifier,
    parser::{EqualityOperator, Operator},
};

use super::{format_number, Scope, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Identifier(Identifier),
    Neg(Box<Expr>),
    Pos(Box<Expr>),
    Binary(Operator, Box<Expr>, Box<Expr>),
    /// `a < b <= c` holds when every adjacent pair does.
    Compare(Box<Expr>, Vec<(EqualityOperator, Expr)>),
    Call(Box<Expr>, Vec<Expr>),
}

impl Expr {
    pub fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, EvalError> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Expr::evaluate");
        match self {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Identifier(id) => scope
                .lookup(id.as_str())
                .cloned()
                .ok_or_else(|| EvalError::UnknownName(id.to_string())),
            Expr::Neg(operand) => Ok(Value::Number(-operand.evaluate(scope)?.as_number("-")?)),
            Expr::Pos(operand) => Ok(Value::Number(operand.evaluate(scope)?.as_number("+")?)),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.evaluate(scope)?.as_number(op.as_str())?;
                let b = rhs.evaluate(scope)?.as_number(op.as_str())?;
                apply(*op, a, b).map(Value::Number)
            }
            Expr::Compare(first, rest) => {
                let mut lhs = first.evaluate(scope)?;
                for (op, expr) in rest {
                    let rhs = expr.evaluate(scope)?;
                    if !op.holds(lhs.as_number(op.as_str())?, rhs.as_number(op.as_str())?) {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            Expr::Call(callee, args) => {
                let Value::Function(function) = callee.evaluate(scope)? else {
                    return Err(EvalError::NotCallable(callee.to_string()));
                };
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(scope))
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(&args)
            }
        }
    }

    /// Names this expression reads, in order of first appearance.
    pub fn identifiers(&self) -> Vec<&Identifier> {
        let mut found = Vec::new();
        self.collect_identifiers(&mut found);
        found.into_iter().unique().collect()
    }

    fn collect_identifiers<'a>(&'a self, found: &mut Vec<&'a Identifier>) {
        match self {
            Expr::Number(_) => {}
            Expr::Identifier(id) => found.push(id),
            Expr::Neg(e) | Expr::Pos(e) => e.collect_identifiers(found),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_identifiers(found);
                rhs.collect_identifiers(found);
            }
            Expr::Compare(first, rest) => {
                first.collect_identifiers(found);
                rest.iter().for_each(|(_, e)| e.collect_identifiers(found));
            }
            Expr::Call(callee, args) => {
                callee.collect_identifiers(found);
                args.iter().for_each(|e| e.collect_identifiers(found));
            }
        }
    }
}

fn as_integer(n: f64) -> Option<i64> {
    if n.fract() == 0.0 {
        n.to_i64()
    } else {
        None
    }
}

/// Arithmetic on two operands. Finite inputs never produce an infinite
/// or NaN result; those become errors.
pub fn apply(op: Operator, a: f64, b: f64) -> Result<f64, EvalError> {
    let result = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div | Operator::FloorDiv | Operator::Rem if b == 0.0 => {
            return Err(EvalError::DivisionByZero)
        }
        Operator::Div => a / b,
        Operator::FloorDiv => (a / b).floor(),
        // result takes the sign of the divisor
        Operator::Rem => {
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        Operator::Pow if a == 0.0 && b < 0.0 => return Err(EvalError::DivisionByZero),
        Operator::Pow => a.powf(b),
        Operator::Xor => match (as_integer(a), as_integer(b)) {
            (Some(x), Some(y)) => (x ^ y) as f64,
            _ => return Err(EvalError::NonIntegral(op)),
        },
    };
    if a.is_finite() && b.is_finite() {
        if result.is_nan() {
            return Err(EvalError::Domain(op.to_string()));
        }
        if result.is_infinite() {
            return Err(EvalError::Overflow);
        }
    }
    Ok(result)
}

struct Operand<'a>(&'a Expr);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Expr::Number(_) | Expr::Identifier(_) | Expr::Call(..) => write!(f, "{}", self.0),
            _ => write!(f, "({})", self.0),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", format_number(*n)),
            Expr::Identifier(id) => write!(f, "{id}"),
            Expr::Neg(e) => write!(f, "-{}", Operand(e)),
            Expr::Pos(e) => write!(f, "+{}", Operand(e)),
            Expr::Binary(op, lhs, rhs) => write!(f, "{} {op} {}", Operand(lhs), Operand(rhs)),
            Expr::Compare(first, rest) => {
                write!(f, "{}", Operand(first))?;
                for (op, e) in rest {
                    write!(f, " {op} {}", Operand(e))?;
                }
                Ok(())
            }
            Expr::Call(callee, args) => {
                write!(f, "{}({})", Operand(callee), args.iter().join(", "))
            }
        }
    }
}
