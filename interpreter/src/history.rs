use std::slice;

use thiserror::Error;

use crate::{env::Environment, equation::Equation};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("no entry {index}, the history has {len}")]
    OutOfRange { index: usize, len: usize },
}

/// An ordered list of records and the environment they share.
///
/// Each history is its own session: two histories never see each other's
/// bindings. Removing a record leaves whatever it bound in place.
#[derive(Clone, Debug)]
pub struct History {
    env: Environment,
    equations: Vec<Equation>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_environment(Environment::with_defaults())
    }

    pub fn with_environment(env: Environment) -> Self {
        History {
            env,
            equations: Vec::new(),
        }
    }

    /// Classifies and evaluates one line and appends it.
    pub fn submit(&mut self, text: impl Into<String>) -> &Equation {
        let equation = Equation::new(text, &mut self.env);
        self.equations.push(equation);
        &self.equations[self.equations.len() - 1]
    }

    /// Re-evaluates the record at `index` with new text. Later records are
    /// left as they were.
    pub fn update(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<&Equation, HistoryError> {
        let len = self.equations.len();
        let equation = self
            .equations
            .get_mut(index)
            .ok_or(HistoryError::OutOfRange { index, len })?;
        equation.update(text, &mut self.env);
        Ok(&*equation)
    }

    pub fn remove(&mut self, index: usize) -> Result<Equation, HistoryError> {
        if index < self.equations.len() {
            let removed = self.equations.remove(index);
            tracing::debug!(index, text = removed.text(), "removed");
            Ok(removed)
        } else {
            Err(HistoryError::OutOfRange {
                index,
                len: self.equations.len(),
            })
        }
    }

    /// Drops every record. Bindings survive.
    pub fn clear(&mut self) {
        self.equations.clear();
    }

    /// Drops every record and starts over with a freshly seeded environment.
    pub fn reset(&mut self) {
        self.equations.clear();
        self.env.clear();
        self.env.seed_defaults();
    }

    pub fn get(&self, index: usize) -> Option<&Equation> {
        self.equations.get(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Equation> {
        self.equations.iter()
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Equation;
    type IntoIter = slice::Iter<'a, Equation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
