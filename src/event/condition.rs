//! Event conditions: pure predicates over a [`Payload`].
//!
//! Conditions are plain values so they can be inspected (see
//! [`Condition::kind_hint`]) and parsed from a small text language:
//!
//! ```text
//! type == "touch" and pressed
//! type == "button" and (button == "left" or button == "right") and not change
//! zone >= 3 && zone < 6
//! ```
//!
//! A bare field name tests the field's truthiness. Comparisons against a
//! missing field are false.

use std::fmt;
use std::str::FromStr;

use logos::Logos;

use super::payload::{Payload, Value};

/// Errors from parsing condition text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of condition: {0}")]
    UnexpectedEnd(String),
    #[error("unrecognized character at byte {0}")]
    InvalidCharacter(usize),
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum Token {
    // ── Operators (longer first) ─────────────────────────────────────
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // ── Logic ────────────────────────────────────────────────────────
    #[token("and")]
    #[token("&&")]
    And,
    #[token("or")]
    #[token("||")]
    Or,
    #[token("not")]
    #[token("!")]
    Not,

    // ── Literals ─────────────────────────────────────────────────────
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Str,
    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
}

#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    /// Byte offset into the condition text.
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<PToken>, ConditionError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        let token = result.map_err(|_| ConditionError::InvalidCharacter(span.start))?;
        tokens.push(PToken {
            token,
            pos: span.start,
            text: input[span].to_string(),
        });
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn holds(self, lhs: &Value, rhs: &Value) -> bool {
        if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
            return match self {
                CompareOp::Eq => a == b,
                CompareOp::Ne => a != b,
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                CompareOp::Ge => a >= b,
            };
        }
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            _ => match (lhs.as_str(), rhs.as_str()) {
                (Some(a), Some(b)) => match self {
                    CompareOp::Lt => a < b,
                    CompareOp::Le => a <= b,
                    CompareOp::Gt => a > b,
                    CompareOp::Ge => a >= b,
                    CompareOp::Eq | CompareOp::Ne => false,
                },
                _ => false,
            },
        }
    }
}

/// A predicate over a payload.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Matches every payload.
    Always,
    /// Matches when the named field exists and is truthy.
    Truthy(String),
    /// Compares a field against a constant.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    /// Escape hatch for conditions the text language cannot express.
    Predicate(fn(&Payload) -> bool),
}

impl Condition {
    /// `type == kind`.
    pub fn kind(kind: impl Into<String>) -> Self {
        Condition::field_eq("type", kind.into())
    }

    /// `field == value`.
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// Bare field test.
    pub fn truthy(field: impl Into<String>) -> Self {
        Condition::Truthy(field.into())
    }

    /// Both conditions. Flattens nested conjunctions.
    pub fn and(self, other: Condition) -> Self {
        match self {
            Condition::All(mut parts) => {
                parts.push(other);
                Condition::All(parts)
            }
            first => Condition::All(vec![first, other]),
        }
    }

    /// Either condition. Flattens nested disjunctions.
    pub fn or(self, other: Condition) -> Self {
        match self {
            Condition::Any(mut parts) => {
                parts.push(other);
                Condition::Any(parts)
            }
            first => Condition::Any(vec![first, other]),
        }
    }

    /// Logical negation.
    pub fn negate(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Evaluate against a payload.
    pub fn matches(&self, payload: &Payload) -> bool {
        match self {
            Condition::Always => true,
            Condition::Truthy(field) => payload.field(field).is_some_and(|v| v.truthy()),
            Condition::Compare { field, op, value } => payload
                .field(field)
                .is_some_and(|actual| op.holds(&actual, value)),
            Condition::Not(inner) => !inner.matches(payload),
            Condition::All(parts) => parts.iter().all(|c| c.matches(payload)),
            Condition::Any(parts) => parts.iter().any(|c| c.matches(payload)),
            Condition::Predicate(f) => f(payload),
        }
    }

    /// The payload kind this condition is restricted to, if it requires
    /// `type == "<kind>"` at the top level.
    pub fn kind_hint(&self) -> Option<&str> {
        match self {
            Condition::Compare {
                field,
                op: CompareOp::Eq,
                value: Value::Str(kind),
            } if field == "type" => Some(kind.as_str()),
            Condition::All(parts) => parts.iter().find_map(Condition::kind_hint),
            _ => None,
        }
    }

    /// Parse condition text.
    pub fn parse(input: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(Condition::Always);
        }
        let mut parser = Parser { tokens, cursor: 0 };
        let condition = parser.parse_or()?;
        match parser.peek() {
            None => Ok(condition),
            Some(tok) => Err(ConditionError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected end of condition, got '{}'", tok.text),
            }),
        }
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Condition::parse(s)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn joined(f: &mut fmt::Formatter<'_>, parts: &[Condition], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{part}")?;
            }
            write!(f, ")")
        }
        match self {
            Condition::Always => write!(f, "true"),
            Condition::Truthy(field) => write!(f, "{field}"),
            Condition::Compare { field, op, value } => {
                write!(f, "{field} {} {value}", op.symbol())
            }
            Condition::Not(inner) => write!(f, "not {inner}"),
            Condition::All(parts) => joined(f, parts, "and"),
            Condition::Any(parts) => joined(f, parts, "or"),
            Condition::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Recursive descent parser state.
struct Parser {
    tokens: Vec<PToken>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().is_some_and(|t| &t.token == token) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// or := and ("or" and)*
    fn parse_or(&mut self) -> Result<Condition, ConditionError> {
        let mut parts = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Condition::Any(parts)
        })
    }

    /// and := unary ("and" unary)*
    fn parse_and(&mut self) -> Result<Condition, ConditionError> {
        let mut parts = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Condition::All(parts)
        })
    }

    /// unary := "not" unary | primary
    fn parse_unary(&mut self) -> Result<Condition, ConditionError> {
        if self.eat(&Token::Not) {
            return Ok(self.parse_unary()?.negate());
        }
        self.parse_primary()
    }

    /// primary := "(" or ")" | "true" | "false" | field [op literal]
    fn parse_primary(&mut self) -> Result<Condition, ConditionError> {
        let tok = self
            .advance()
            .ok_or_else(|| ConditionError::UnexpectedEnd("expected a field or '('".into()))?;
        match tok.token {
            Token::ParenOpen => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(t) if t.token == Token::ParenClose => Ok(inner),
                    Some(t) => Err(ConditionError::UnexpectedToken {
                        position: t.pos,
                        message: format!("expected ')', got '{}'", t.text),
                    }),
                    None => Err(ConditionError::UnexpectedEnd("expected ')'".into())),
                }
            }
            Token::True => Ok(Condition::Always),
            Token::False => Ok(Condition::Always.negate()),
            Token::Ident => {
                let op = match self.peek().map(|t| &t.token) {
                    Some(Token::Eq) => CompareOp::Eq,
                    Some(Token::Ne) => CompareOp::Ne,
                    Some(Token::Lt) => CompareOp::Lt,
                    Some(Token::Le) => CompareOp::Le,
                    Some(Token::Gt) => CompareOp::Gt,
                    Some(Token::Ge) => CompareOp::Ge,
                    _ => return Ok(Condition::Truthy(tok.text)),
                };
                self.cursor += 1;
                let value = self.parse_literal()?;
                Ok(Condition::Compare {
                    field: tok.text,
                    op,
                    value,
                })
            }
            _ => Err(ConditionError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected a field or '(', got '{}'", tok.text),
            }),
        }
    }

    /// literal := number | string | "true" | "false" | ident
    fn parse_literal(&mut self) -> Result<Value, ConditionError> {
        let tok = self
            .advance()
            .ok_or_else(|| ConditionError::UnexpectedEnd("expected a value".into()))?;
        match tok.token {
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Str => Ok(Value::Str(tok.text[1..tok.text.len() - 1].to_string())),
            // A bare word on the right-hand side is a string constant.
            Token::Ident => Ok(Value::Str(tok.text)),
            Token::Number => {
                if let Ok(i) = tok.text.parse::<i64>() {
                    return Ok(Value::Int(i));
                }
                tok.text
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| ConditionError::UnexpectedToken {
                        position: tok.pos,
                        message: format!("invalid number '{}'", tok.text),
                    })
            }
            _ => Err(ConditionError::UnexpectedToken {
                position: tok.pos,
                message: format!("expected a value, got '{}'", tok.text),
            }),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
