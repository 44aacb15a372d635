use std::{borrow::Borrow, fmt::Display};

/// A symbol name: a letter followed by letters, digits or underscores.
/// Names are case-sensitive.
#[derive(PartialEq, Eq, Hash, Clone, Debug, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn is_start(c: char) -> bool {
        c.is_alphabetic()
    }

    pub fn is_continue(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    pub fn new(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let first = chars.next()?;
        if Self::is_start(first) && chars.all(Self::is_continue) {
            Some(Identifier(s.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for Identifier {
    /// For names known to be valid at compile time.
    fn from(s: &'static str) -> Self {
        debug_assert!(Identifier::new(s).is_some(), "invalid identifier {s:?}");
        Identifier(s.to_owned())
    }
}
