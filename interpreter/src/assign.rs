//! Definition statements: `name := expr` and `name(a, b) := expr`.

use crate::{
    env::Environment,
    error::{AssignmentError, EquationError},
    identifier::Identifier,
    parser::{evaluate, parse_expr},
    value::{Define, Value},
    MAX_PARAMETERS,
};

pub const DELIMITER: &str = ":=";

/// Whether a line is a definition: it starts with a letter and contains
/// the delimiter somewhere.
pub fn is_assignment(text: &str) -> bool {
    text.chars().next().map_or(false, char::is_alphabetic) && text.contains(DELIMITER)
}

/// Splits a definition into the name and what it binds to. Variables are
/// evaluated right away; a parenthesis before the delimiter makes it a
/// function, built over a copy of `env`.
///
/// The caller writes the binding into the environment.
pub fn parse_assignment(
    text: &str,
    env: &Environment,
) -> Result<(Identifier, Value), EquationError> {
    let (lhs, rhs) = text
        .split_once(DELIMITER)
        .ok_or(AssignmentError::MissingDelimiter)?;
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    if rhs.is_empty() {
        return Err(EquationError::from(AssignmentError::EmptyValue));
    }
    match lhs.split_once('(') {
        Some((name, params)) => {
            let name = parse_name(name.trim())?;
            let params = params
                .trim_end()
                .strip_suffix(')')
                .ok_or(AssignmentError::UnclosedParameters)?;
            let define = build_function(name.clone(), parse_params(params)?, rhs, env)?;
            Ok((name, Value::from(define)))
        }
        None => {
            let name = parse_name(lhs)?;
            let value = evaluate(rhs, env)?;
            Ok((name, value))
        }
    }
}

/// Builds a function whose body is resolved against its arguments and
/// then against a snapshot of `env` as it is now.
pub fn build_function(
    name: Identifier,
    params: Vec<Identifier>,
    body: &str,
    env: &Environment,
) -> Result<Define, EquationError> {
    if params.len() > MAX_PARAMETERS {
        return Err(AssignmentError::TooManyParameters(params.len()).into());
    }
    let body = parse_expr(body)?;
    Ok(Define::new(name, params, body, env.clone())?)
}

fn parse_name(name: &str) -> Result<Identifier, AssignmentError> {
    Identifier::new(name).ok_or_else(|| AssignmentError::InvalidName(name.to_owned()))
}

fn parse_params(list: &str) -> Result<Vec<Identifier>, AssignmentError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(str::trim)
        .map(|param| {
            Identifier::new(param)
                .ok_or_else(|| AssignmentError::InvalidParameter(param.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::EvalError;

    fn bind(text: &str, env: &mut Environment) -> Identifier {
        let (name, value) = parse_assignment(text, env).unwrap();
        env.bind(name.clone(), value);
        name
    }

    fn call(env: &Environment, text: &str) -> Value {
        evaluate(text, env).unwrap()
    }

    #[test]
    fn detects_assignments() {
        assert!(is_assignment("x:=5"));
        assert!(is_assignment("f(a, b) := a*b"));
        assert!(!is_assignment("2 := 3"));
        assert!(!is_assignment("x == 5"));
        assert!(!is_assignment("(x):=5"));
    }

    #[test]
    fn variable_is_evaluated_at_definition() {
        let mut env = Environment::with_defaults();
        let (name, value) = parse_assignment("r := 2 * 5", &env).unwrap();
        assert_eq!(name.as_str(), "r");
        assert_eq!(value, Value::Number(10.0));
        env.bind(name, value);
        assert_eq!(call(&env, "r * 2"), Value::Number(20.0));
    }

    #[test]
    fn functions_snapshot_their_environment() {
        let mut env = Environment::with_defaults();
        bind("a := 1", &mut env);
        bind("f(n) := n + a", &mut env);
        bind("a := 100", &mut env);
        assert_eq!(call(&env, "f(2)"), Value::Number(3.0));
        assert_eq!(call(&env, "a"), Value::Number(100.0));
    }

    #[test]
    fn parameters_shadow_globals() {
        let mut env = Environment::with_defaults();
        bind("x := 7", &mut env);
        bind("g(x, y) := x * 10 + y", &mut env);
        assert_eq!(call(&env, "g(1, 2)"), Value::Number(12.0));
        bind("h(pi) := pi", &mut env);
        assert_eq!(call(&env, "h(2)"), Value::Number(2.0));
    }

    #[test]
    fn zero_to_five_parameters() {
        let mut env = Environment::with_defaults();
        bind("k() := 42", &mut env);
        assert_eq!(call(&env, "k()"), Value::Number(42.0));
        bind("s(a, b, c, d, e) := a + b + c + d + e", &mut env);
        assert_eq!(call(&env, "s(1, 2, 3, 4, 5)"), Value::Number(15.0));
        assert_eq!(
            parse_assignment("t(a, b, c, d, e, f) := 1", &env).unwrap_err(),
            EquationError::Assignment(AssignmentError::TooManyParameters(6))
        );
    }

    #[test]
    fn functions_use_other_functions() {
        let mut env = Environment::with_defaults();
        bind("sq(x) := x^2", &mut env);
        bind("hyp(a, b) := sqrt(sq(a) + sq(b))", &mut env);
        assert_eq!(call(&env, "hyp(3, 4)"), Value::Number(5.0));
    }

    #[test]
    fn function_cannot_see_itself() {
        let mut env = Environment::with_defaults();
        bind("f(n) := f(n - 1)", &mut env);
        assert_eq!(
            evaluate("f(3)", &env),
            Err(EquationError::Eval(EvalError::UnknownName("f".into())))
        );
    }

    #[test]
    fn unknown_names_in_body_fail_at_call_time() {
        let mut env = Environment::with_defaults();
        bind("f(n) := n + later", &mut env);
        assert_eq!(
            evaluate("f(1)", &env),
            Err(EquationError::Eval(EvalError::UnknownName("later".into())))
        );
    }

    #[test]
    fn malformed_assignments() {
        let env = Environment::with_defaults();
        let err = |text| parse_assignment(text, &env).unwrap_err();
        assert_eq!(err("x :="), EquationError::from(AssignmentError::EmptyValue));
        assert_eq!(err("x y := 1"), EquationError::from(AssignmentError::InvalidName("x y".into())));
        assert_eq!(err("f(x := 1"), EquationError::from(AssignmentError::UnclosedParameters));
        assert_eq!(err("f(1) := 1"), EquationError::from(AssignmentError::InvalidParameter("1".into())));
        assert_eq!(err("f(a,) := 1"), EquationError::from(AssignmentError::InvalidParameter("".into())));
        assert_eq!(err("f(a, a) := 1"), EquationError::from(AssignmentError::DuplicateParameter("a".into())));
        assert_eq!(err("x = 1"), EquationError::from(AssignmentError::MissingDelimiter));
        assert!(matches!(err("f(a) := a +"), EquationError::Syntax(_)));
        assert!(matches!(err("x := 1/0"), EquationError::Eval(EvalError::DivisionByZero)));
    }

    #[test]
    fn builtins_can_be_rebound() {
        let mut env = Environment::with_defaults();
        bind("pi := 3", &mut env);
        assert_eq!(call(&env, "pi"), Value::Number(3.0));
        bind("sin(x) := x", &mut env);
        assert_eq!(call(&env, "sin(2)"), Value::Number(2.0));
    }
}
