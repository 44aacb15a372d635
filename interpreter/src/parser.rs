use std::{
    fmt::Display,
    iter::Peekable,
    ops::{Deref, Range},
    str::CharIndices,
};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    env::Environment,
    error::EquationError,
    identifier::Identifier,
    normalize::normalize,
    value::{Expr, Scope, Value},
};

/// Limit on the depth of the parsed tree. Groups, calls, unary operators
/// and each operator of a chain like `1 + 2 + 3` count as one level.
pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
    Xor,
}

impl Operator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::FloorDiv => "//",
            Operator::Rem => "%",
            Operator::Pow => "**",
            Operator::Xor => "^",
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EqualityOperator {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl EqualityOperator {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EqualityOperator::Equal => "==",
            EqualityOperator::NotEqual => "!=",
            EqualityOperator::Less => "<",
            EqualityOperator::LessOrEqual => "<=",
            EqualityOperator::Greater => ">",
            EqualityOperator::GreaterOrEqual => ">=",
        }
    }

    pub fn holds(&self, a: f64, b: f64) -> bool {
        match self {
            EqualityOperator::Equal => a == b,
            EqualityOperator::NotEqual => a != b,
            EqualityOperator::Less => a < b,
            EqualityOperator::LessOrEqual => a <= b,
            EqualityOperator::Greater => a > b,
            EqualityOperator::GreaterOrEqual => a >= b,
        }
    }
}

impl Display for EqualityOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    Number(f64),
    Identifier(Identifier),
    Operator(Operator),
    Eq(EqualityOperator),
    Ctrl(char),
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::Identifier(id) => write!(f, "{id}"),
            TokenKind::Operator(op) => write!(f, "{op}"),
            TokenKind::Eq(op) => write!(f, "{op}"),
            TokenKind::Ctrl(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    span: Range<usize>,
}

impl Deref for Token {
    type Target = TokenKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl From<Identifier> for TokenKind {
    fn from(id: Identifier) -> Self {
        TokenKind::Identifier(id)
    }
}

impl From<f64> for TokenKind {
    fn from(num: f64) -> Self {
        TokenKind::Number(num)
    }
}

impl From<Operator> for TokenKind {
    fn from(op: Operator) -> Self {
        TokenKind::Operator(op)
    }
}

impl From<EqualityOperator> for TokenKind {
    fn from(op: EqualityOperator) -> Self {
        TokenKind::Eq(op)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Syntax {
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("malformed number")]
    InvalidNumber,
    #[error("expected `{0}`")]
    ExpectedChar(char),
    #[error("expected a value")]
    ExpectedValue,
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),
    #[error("empty expression")]
    Empty,
    #[error("expression nests deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// A syntax error and the byte range of the normalized text it covers.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{err} at {}..{}", .span.start, .span.end)]
pub struct ParseError {
    pub err: Syntax,
    pub span: Range<usize>,
}

impl ParseError {
    pub fn new(err: Syntax, span: Range<usize>) -> Self {
        ParseError { err, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxErrors(pub Vec<ParseError>);

impl Display for SyntaxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("; "))
    }
}

impl std::error::Error for SyntaxErrors {}

pub struct TextParser<'a> {
    text: &'a str,
    iter: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> TextParser<'a> {
    pub fn new(text: &'a str) -> Self {
        TextParser {
            text,
            iter: text.char_indices().peekable(),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn offset(&mut self) -> usize {
        self.iter.peek().map(|&(i, _)| i).unwrap_or(self.text.len())
    }

    fn next_if_char(&mut self, c: char) -> bool {
        self.iter.next_if(|&(_, next)| next == c).is_some()
    }

    fn skip_digits(&mut self) {
        while self.iter.next_if(|&(_, c)| c.is_ascii_digit()).is_some() {}
    }

    fn token(&mut self, token: impl Into<TokenKind>, start: usize) {
        let end = self.offset();
        self.tokens.push(Token {
            kind: token.into(),
            span: start..end,
        });
    }

    fn error(&mut self, kind: Syntax, start: usize) {
        let end = self.offset();
        self.errors.push(ParseError::new(kind, start..end));
    }

    fn parse_number(&mut self, start: usize, first: char) {
        if first != '.' {
            self.skip_digits();
            if self.next_if_char('.') {
                self.skip_digits();
            }
        } else {
            self.skip_digits();
        }
        if let Some(&(_, 'e' | 'E')) = self.iter.peek() {
            let mut exponent = self.iter.clone();
            exponent.next();
            exponent.next_if(|&(_, c)| c == '+' || c == '-');
            if matches!(exponent.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
                self.iter = exponent;
                self.skip_digits();
            }
        }
        let end = self.offset();
        match self.text[start..end].parse::<f64>() {
            Ok(num) if num.is_finite() => self.token(num, start),
            _ => self.error(Syntax::InvalidNumber, start),
        }
    }

    fn parse_raw(&mut self) {
        while let Some((start, current)) = self.iter.next() {
            if current.is_whitespace() {
                continue;
            }
            if Identifier::is_start(current) {
                while self
                    .iter
                    .next_if(|&(_, c)| Identifier::is_continue(c))
                    .is_some()
                {}
                let end = self.offset();
                match Identifier::new(&self.text[start..end]) {
                    Some(id) => self.token(id, start),
                    None => self.error(Syntax::UnexpectedChar(current), start),
                }
            } else if current.is_ascii_digit()
                || (current == '.' && matches!(self.iter.peek(), Some(&(_, c)) if c.is_ascii_digit()))
            {
                self.parse_number(start, current);
            } else if let Some(op) = match current {
                '+' => Some(Operator::Add),
                '-' => Some(Operator::Sub),
                '%' => Some(Operator::Rem),
                '^' => Some(Operator::Xor),
                '*' if self.next_if_char('*') => Some(Operator::Pow),
                '*' => Some(Operator::Mul),
                '/' if self.next_if_char('/') => Some(Operator::FloorDiv),
                '/' => Some(Operator::Div),
                _ => None,
            } {
                self.token(op, start);
            } else if let Some(op) = match current {
                '=' | '!' => {
                    if self.next_if_char('=') {
                        Some(if current == '=' {
                            EqualityOperator::Equal
                        } else {
                            EqualityOperator::NotEqual
                        })
                    } else {
                        self.error(Syntax::ExpectedChar('='), start);
                        continue;
                    }
                }
                '<' if self.next_if_char('=') => Some(EqualityOperator::LessOrEqual),
                '<' => Some(EqualityOperator::Less),
                '>' if self.next_if_char('=') => Some(EqualityOperator::GreaterOrEqual),
                '>' => Some(EqualityOperator::Greater),
                _ => None,
            } {
                self.token(op, start);
            } else if matches!(current, '(' | ')' | ',') {
                self.token(TokenKind::Ctrl(current), start);
            } else {
                self.error(Syntax::UnexpectedChar(current), start);
            }
        }
    }

    pub fn parse(mut self) -> Result<Vec<Token>, Vec<ParseError>> {
        self.parse_raw();
        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }
}

/// Recursive-descent parser over a token slice.
///
/// Precedence from loosest to tightest: comparisons (chainable), `^`,
/// `+ -`, `* / // %`, unary `+ -`, `**` (right associative), calls.
#[derive(Debug)]
pub struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    end: usize,
}

impl<'a> TokenParser<'a> {
    /// `end` is the length of the lexed text, used to place errors at the
    /// end of input.
    pub fn new(tokens: &'a [Token], end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            end,
        }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn here(&self) -> Range<usize> {
        self.current()
            .map(|t| t.span.clone())
            .unwrap_or(self.end..self.end)
    }

    fn error(&self, err: Syntax) -> ParseError {
        ParseError::new(err, self.here())
    }

    fn eat_ctrl(&mut self, c: char) -> bool {
        if matches!(self.current(), Some(Token { kind: TokenKind::Ctrl(k), .. }) if *k == c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_operator(&mut self, ops: &[Operator]) -> Option<Operator> {
        match self.current() {
            Some(Token {
                kind: TokenKind::Operator(op),
                ..
            }) if ops.contains(op) => {
                self.pos += 1;
                Some(*op)
            }
            _ => None,
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(Syntax::TooDeep));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_xor()?;
        let mut rest = Vec::new();
        while let Some(Token {
            kind: TokenKind::Eq(op),
            ..
        }) = self.current()
        {
            self.pos += 1;
            rest.push((*op, self.parse_xor()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_binary(
        &mut self,
        ops: &[Operator],
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut lhs = operand(self)?;
        while let Some(op) = self.eat_operator(ops) {
            if self.depth >= MAX_DEPTH {
                return Err(self.error(Syntax::TooDeep));
            }
            self.depth += 1;
            let rhs = operand(self)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[Operator::Xor], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[Operator::Add, Operator::Sub], Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(
            &[
                Operator::Mul,
                Operator::Div,
                Operator::FloorDiv,
                Operator::Rem,
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.eat_operator(&[Operator::Add, Operator::Sub]) {
            Some(Operator::Sub) => self.nested(|p| Ok(Expr::Neg(Box::new(p.parse_unary()?)))),
            Some(_) => self.nested(|p| Ok(Expr::Pos(Box::new(p.parse_unary()?)))),
            None => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.eat_operator(&[Operator::Pow]).is_some() {
            let exponent = self.nested(Self::parse_unary)?;
            Ok(Expr::binary(Operator::Pow, base, exponent))
        } else {
            Ok(base)
        }
    }

    /// Every call in a chain like `f(1)(2)(3)` is one more level.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let depth = self.depth;
        let mut expr = self.parse_value()?;
        while self.eat_ctrl('(') {
            if self.depth >= MAX_DEPTH {
                return Err(self.error(Syntax::TooDeep));
            }
            self.depth += 1;
            let args = self.parse_args()?;
            expr = Expr::Call(Box::new(expr), args);
        }
        self.depth = depth;
        Ok(expr)
    }

    /// Arguments after an opening parenthesis, consuming the closing one.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat_ctrl(')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_comparison()?);
            if self.eat_ctrl(',') {
                continue;
            }
            if self.eat_ctrl(')') {
                return Ok(args);
            }
            return Err(self.error(Syntax::ExpectedChar(')')));
        }
    }

    fn parse_value(&mut self) -> Result<Expr, ParseError> {
        let Some(current) = self.current() else {
            return Err(self.error(Syntax::ExpectedValue));
        };
        match &current.kind {
            TokenKind::Number(num) => {
                self.pos += 1;
                Ok(Expr::Number(*num))
            }
            TokenKind::Identifier(id) => {
                self.pos += 1;
                Ok(Expr::Identifier(id.clone()))
            }
            TokenKind::Ctrl('(') => {
                self.pos += 1;
                let inner = self.nested(Self::parse_comparison)?;
                if self.eat_ctrl(')') {
                    Ok(inner)
                } else {
                    Err(self.error(Syntax::ExpectedChar(')')))
                }
            }
            _ => Err(self.error(Syntax::ExpectedValue)),
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(self.error(Syntax::Empty));
        }
        let expr = self.parse_comparison()?;
        match self.current() {
            Some(token) => Err(ParseError::new(
                Syntax::UnexpectedToken(token.kind.to_string()),
                token.span.clone(),
            )),
            None => Ok(expr),
        }
    }
}

/// Normalizes and parses one expression.
pub fn parse_expr(string: &str) -> Result<Expr, SyntaxErrors> {
    let normalized = normalize(string);
    let tokens = TextParser::new(&normalized).parse().map_err(SyntaxErrors)?;
    TokenParser::new(&tokens, normalized.len())
        .parse()
        .map_err(|e| SyntaxErrors(vec![e]))
}

/// Evaluates `string` against `env` without modifying it.
pub fn evaluate(string: &str, env: &Environment) -> Result<Value, EquationError> {
    let expr = parse_expr(string)?;
    tracing::trace!(input = string, "evaluating");
    Ok(expr.evaluate(&Scope::global(env))?)
}
