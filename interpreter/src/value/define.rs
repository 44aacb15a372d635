use crate::{
    env::Environment,
    error::{AssignmentError, EvalError},
    identifier::Identifier,
    MAX_PARAMETERS,
};

use super::{Expr, Scope, Value};

/// A user-defined function.
///
/// The body sees the arguments first and then `captured`, a copy of the
/// environment taken when the function was defined. Later rebinding in the
/// session does not reach it.
#[derive(Clone, Debug)]
pub struct Define {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Expr,
    captured: Environment,
}

impl Define {
    pub fn new(
        name: Identifier,
        params: Vec<Identifier>,
        body: Expr,
        captured: Environment,
    ) -> Result<Define, AssignmentError> {
        if params.len() > MAX_PARAMETERS {
            return Err(AssignmentError::TooManyParameters(params.len()));
        }
        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(AssignmentError::DuplicateParameter(param.to_string()));
            }
        }
        Ok(Define {
            name,
            params,
            body,
            captured,
        })
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        #[cfg(feature = "tracy")]
        profiling::scope!("Define::call");
        if args.len() != self.params.len() {
            return Err(EvalError::Arity {
                name: self.name.to_string(),
                expected: self.params.len(),
                found: args.len(),
            });
        }
        let frame: Vec<(Identifier, Value)> = self
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        self.body.evaluate(&Scope::with_frame(&frame, &self.captured))
    }
}
