//! Filter expression parsing and evaluation for the in-memory engine.
//!
//! Grammar (the subset the codec and planner emit):
//!
//! ```text
//! expr      := and_expr ("OR" and_expr)*
//! and_expr  := atom ("AND" atom)*
//! atom      := "(" expr ")" | predicate
//! predicate := WORD ":" value ("TO" value)?
//! value     := QUOTED | WORD
//! ```

use facetry_core::{Error, Result};
use serde_json::Value;

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Colon,
    And,
    Or,
    To,
    Quoted(String),
    Word(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(invalid(input, "unterminated quote"));
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | ':' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "TO" => Token::To,
                    _ => Token::Word(word),
                });
            }
        }
    }

    Ok(tokens)
}

fn invalid(input: &str, reason: &str) -> Error {
    Error::backend(format!("Invalid filter expression '{input}': {reason}"))
}

// ============================================================================
// AST
// ============================================================================

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `"value"`: exact string match.
    Quoted(String),
    /// `value`: string or numeric match.
    Bare(String),
    /// `a TO b`: inclusive numeric range.
    Range(f64, f64),
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// All must match.
    And(Vec<Expr>),
    /// Any must match.
    Or(Vec<Expr>),
    /// `attribute:operand`.
    Predicate {
        /// Attribute path
        attribute: String,
        /// Operand
        operand: Operand,
    },
}

impl Expr {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns a backend error for malformed input, as the engine would.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens: &tokens,
            pos: 0,
        };
        let expr = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(invalid(input, "unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Whether a document satisfies the expression.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::And(parts) => parts.iter().all(|p| p.matches(document)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(document)),
            Self::Predicate { attribute, operand } => lookup(document, attribute)
                .map(|value| values_of(value).any(|v| operand_matches(operand, v)))
                .unwrap_or(false),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut parts = vec![self.and_expr()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            parts.push(self.and_expr()?);
        }
        Ok(collapse(parts, Expr::Or))
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut parts = vec![self.atom()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            parts.push(self.atom()?);
        }
        Ok(collapse(parts, Expr::And))
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(invalid(self.input, "missing closing parenthesis")),
                }
            }
            Some(Token::Word(attribute)) => self.predicate(attribute),
            _ => Err(invalid(self.input, "expected an attribute or '('")),
        }
    }

    fn predicate(&mut self, attribute: String) -> Result<Expr> {
        if self.next() != Some(Token::Colon) {
            return Err(invalid(self.input, "expected ':' after attribute"));
        }
        let operand = match self.next() {
            Some(Token::Quoted(value)) => Operand::Quoted(value),
            Some(Token::Word(value)) => {
                if self.peek() == Some(&Token::To) {
                    self.pos += 1;
                    let upper = match self.next() {
                        Some(Token::Word(upper)) => upper,
                        _ => return Err(invalid(self.input, "expected upper bound after TO")),
                    };
                    Operand::Range(self.number(&value)?, self.number(&upper)?)
                } else {
                    Operand::Bare(value)
                }
            }
            _ => return Err(invalid(self.input, "expected a value")),
        };
        Ok(Expr::Predicate { attribute, operand })
    }

    fn number(&self, value: &str) -> Result<f64> {
        value
            .parse()
            .map_err(|_| invalid(self.input, "range bounds must be numeric"))
    }
}

fn collapse(mut parts: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        wrap(parts)
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Resolve a dotted attribute path, preferring literal keys containing dots.
pub fn lookup<'a>(document: &'a Value, attribute: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(attribute) {
        return Some(value);
    }
    let (head, rest) = attribute.split_once('.')?;
    lookup(document.get(head)?, rest)
}

/// Scalar values of an attribute (array elements or the value itself).
pub fn values_of(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter()),
        Value::Null => Box::new(std::iter::empty()),
        other => Box::new(std::iter::once(other)),
    }
}

const EPSILON: f64 = 1e-9;

fn operand_matches(operand: &Operand, value: &Value) -> bool {
    match (operand, value) {
        (Operand::Quoted(expected), Value::String(actual)) => expected == actual,
        (Operand::Bare(expected), Value::String(actual)) => expected == actual,
        (Operand::Bare(expected), Value::Number(actual)) => match (expected.parse::<f64>(), actual.as_f64()) {
            (Ok(expected), Some(actual)) => (expected - actual).abs() < EPSILON,
            _ => false,
        },
        (Operand::Bare(expected), Value::Bool(actual)) => expected == &actual.to_string(),
        (Operand::Range(min, max), Value::Number(actual)) => actual
            .as_f64()
            .is_some_and(|actual| actual >= *min - EPSILON && actual <= *max + EPSILON),
        _ => false,
    }
}
