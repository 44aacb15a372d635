use std::fmt::Display;

use crate::{
    assign::{is_assignment, parse_assignment},
    env::Environment,
    error::EquationError,
    identifier::Identifier,
    parser::evaluate,
    value::Value,
};

/// How a failed record is shown in place of its value.
pub const ERROR_SENTINEL: &str = "error";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Comment,
    Equation,
    Assignment,
    /// Blank input.
    None,
}

impl Kind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Kind::Comment => "comment",
            Kind::Equation => "equation",
            Kind::Assignment => "assignment",
            Kind::None => "none",
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result attached to a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    /// Comments, blank lines and function definitions have nothing to show.
    Empty,
    Value(Value),
    Error(EquationError),
}

impl Output {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Output::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&EquationError> {
        match self {
            Output::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Empty)
    }
}

impl Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Empty => Ok(()),
            Output::Value(value) => write!(f, "{value}"),
            Output::Error(_) => write!(f, "{ERROR_SENTINEL}"),
        }
    }
}

/// One submitted line together with its classification and result.
///
/// Classification looks at the text as typed, first match wins:
///  1. blank text is [`Kind::None`];
///  2. a leading `#` makes a comment, which is never evaluated;
///  3. a leading letter plus a `:=` anywhere makes an assignment, and its
///     binding is written into the environment;
///  4. anything else is an equation, evaluated against the environment.
///
/// Nothing here fails: errors end up in [`Output::Error`].
#[derive(Clone, Debug)]
pub struct Equation {
    text: String,
    kind: Kind,
    output: Output,
    binding: Option<Identifier>,
}

impl Equation {
    pub fn new(text: impl Into<String>, env: &mut Environment) -> Self {
        let mut equation = Equation {
            text: text.into(),
            kind: Kind::None,
            output: Output::Empty,
            binding: None,
        };
        equation.classify(env);
        equation
    }

    /// Replaces the text and classifies it again. A binding made by the
    /// previous text stays in the environment.
    pub fn update(&mut self, text: impl Into<String>, env: &mut Environment) {
        self.text = text.into();
        self.classify(env);
    }

    fn classify(&mut self, env: &mut Environment) {
        let text = self.text.as_str();
        self.binding = None;
        (self.kind, self.output) = if text.trim().is_empty() {
            (Kind::None, Output::Empty)
        } else if text.starts_with('#') {
            (Kind::Comment, Output::Empty)
        } else if is_assignment(text) {
            let output = match parse_assignment(text, env) {
                Ok((name, value)) => {
                    let output = if value.is_function() {
                        Output::Empty
                    } else {
                        Output::Value(value.clone())
                    };
                    env.bind(name.clone(), value);
                    self.binding = Some(name);
                    output
                }
                Err(err) => Output::Error(err),
            };
            (Kind::Assignment, output)
        } else {
            let output = match evaluate(text, env) {
                Ok(value) => Output::Value(value),
                Err(err) => Output::Error(err),
            };
            (Kind::Equation, output)
        };
        match &self.output {
            Output::Error(err) => {
                tracing::debug!(text = %self.text, kind = %self.kind, error = %err, "classified")
            }
            output => tracing::debug!(text = %self.text, kind = %self.kind, %output, "classified"),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn value(&self) -> Option<&Value> {
        self.output.value()
    }

    pub fn is_error(&self) -> bool {
        self.output.error().is_some()
    }

    /// The name this record bound, if it is a successful assignment.
    pub fn binding(&self) -> Option<&Identifier> {
        self.binding.as_ref()
    }

    /// The text after `#` for comments.
    pub fn comment(&self) -> Option<&str> {
        match self.kind {
            Kind::Comment => self.text.strip_prefix('#').map(str::trim),
            _ => None,
        }
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.output.is_empty() {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{} = {}", self.text, self.output)
        }
    }
}
