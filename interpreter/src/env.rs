//! The session environment: every name a session has bound.
//!
//! One `Environment` belongs to one history. It is read by evaluation and
//! written only by assignments, and user functions keep their own copy
//! taken at definition time.

use std::{
    collections::{hash_map::Entry, HashMap},
    f64::consts,
};

use crate::{
    identifier::Identifier,
    value::{Builtin, Value},
};

/// Constants seeded into every new session.
pub const CONSTANTS: [(&str, f64); 3] = [("pi", consts::PI), ("e", consts::E), ("tau", consts::TAU)];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<Identifier, Value>,
}

impl Environment {
    /// An environment with no bindings at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut env = Self::new();
        env.seed_defaults();
        env
    }

    /// Binds the built-in constants and functions, replacing any user
    /// bindings of the same names.
    pub fn seed_defaults(&mut self) {
        for (name, value) in CONSTANTS {
            if let Some(id) = Identifier::new(name) {
                self.bind(id, Value::Number(value));
            }
        }
        for builtin in Builtin::all() {
            if let Some(id) = Identifier::new(builtin.as_str()) {
                self.bind(id, Value::from(builtin));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Binds `name`, returning the value it replaced. Rebinding is silent.
    pub fn bind(&mut self, name: Identifier, value: Value) -> Option<Value> {
        match self.bindings.entry(name) {
            Entry::Occupied(mut entry) => {
                tracing::debug!(name = %entry.key(), "rebinding");
                Some(entry.insert(value))
            }
            Entry::Vacant(entry) => {
                tracing::debug!(name = %entry.key(), "binding");
                entry.insert(value);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Value)> {
        let mut bindings: Vec<_> = self.bindings.iter().collect();
        bindings.sort_unstable_by(|a, b| a.0.cmp(b.0));
        bindings.into_iter()
    }
}
