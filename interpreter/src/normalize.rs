//! Surface-syntax rewriting applied before lexing.
//!
//! A single `^` is the power operator and becomes `**`. A doubled `^^`
//! escapes to a literal `^`, which the parser reads as bitwise xor.
//! Pairs are taken left to right, so `^^^` becomes `^**`.

use std::borrow::Cow;

pub fn normalize(text: &str) -> Cow<'_, str> {
    if !text.contains('^') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
        } else if chars.peek() == Some(&'^') {
            chars.next();
            out.push('^');
        } else {
            out.push_str("**");
        }
    }
    Cow::Owned(out)
}
