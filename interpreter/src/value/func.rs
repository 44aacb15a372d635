use std::fmt::Display;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::EvalError;

/// One-argument functions every session starts with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Sqrt,
    Abs,
}

impl Builtin {
    pub fn all() -> impl Iterator<Item = Builtin> {
        (0..).map_while(Builtin::from_u32)
    }

    pub const fn get_func(&self) -> fn(f64) -> f64 {
        match self {
            Builtin::Sin => f64::sin,
            Builtin::Cos => f64::cos,
            Builtin::Tan => f64::tan,
            Builtin::Asin => f64::asin,
            Builtin::Acos => f64::acos,
            Builtin::Atan => f64::atan,
            Builtin::Exp => f64::exp,
            Builtin::Ln => f64::ln,
            Builtin::Sqrt => f64::sqrt,
            Builtin::Abs => f64::abs,
        }
    }

    /// Applies the function, rejecting results that leave the reals.
    pub fn evaluate(&self, num: f64) -> Result<f64, EvalError> {
        let result = self.get_func()(num);
        if result.is_finite() || !num.is_finite() {
            Ok(result)
        } else if *self == Builtin::Exp && result.is_infinite() {
            Err(EvalError::Overflow)
        } else {
            Err(EvalError::Domain(self.as_str().to_owned()))
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Asin => "asin",
            Builtin::Acos => "acos",
            Builtin::Atan => "atan",
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Sqrt => "sqrt",
            Builtin::Abs => "abs",
        }
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_every_builtin() {
        let names: Vec<_> = Builtin::all().map(|b| b.as_str()).collect();
        assert_eq!(
            names,
            ["sin", "cos", "tan", "asin", "acos", "atan", "exp", "ln", "sqrt", "abs"]
        );
    }

    #[test]
    fn domain_errors() {
        assert_eq!(Builtin::Sqrt.evaluate(4.0), Ok(2.0));
        assert_eq!(
            Builtin::Sqrt.evaluate(-1.0),
            Err(EvalError::Domain("sqrt".into()))
        );
        assert_eq!(Builtin::Ln.evaluate(0.0), Err(EvalError::Domain("ln".into())));
        assert_eq!(Builtin::Asin.evaluate(2.0), Err(EvalError::Domain("asin".into())));
        assert_eq!(Builtin::Exp.evaluate(1000.0), Err(EvalError::Overflow));
        assert_eq!(Builtin::Exp.evaluate(0.0), Ok(1.0));
    }
}
