//! Arithmetic expression evaluation for calculation fields.
//!
//! A small recursive-descent parser over a fixed token grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := number | '-' factor | '(' expr ')'
//! ```
//!
//! Input is sanitized first: lexing stops at the first character outside
//! `[0-9+-*/.() ]` and everything from that character on is discarded. A
//! stripped suffix can leave a dangling trailing operator
//! (`"5 * 2 + alert(1)"` becomes `"5 * 2 +"`); the parser drops that
//! operator and yields the value of the valid prefix. There is no textual
//! `eval` anywhere, so non-arithmetic input can never execute.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExprError {
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token at offset {0}")]
    UnexpectedToken(usize),
    #[error("unbalanced parentheses")]
    UnbalancedParen,
    #[error("trailing tokens after expression")]
    TrailingTokens,
}

/// The sanitized prefix of `input`: everything before the first character
/// outside the arithmetic character set.
pub fn sanitize(input: &str) -> &str {
    let end = input
        .find(|c: char| !matches!(c, '0'..='9' | '+' | '-' | '*' | '/' | '.' | '(' | ')' | ' '))
        .unwrap_or(input.len());
    &input[..end]
}

/// Evaluate an arithmetic expression after sanitization.
///
/// An empty sanitized expression yields 0. Division by zero follows IEEE
/// semantics and surfaces as a non-finite value; callers decide how to store
/// it.
pub fn evaluate_arithmetic(input: &str) -> Result<f64, ExprError> {
    let tokens = lex(sanitize(input))?;
    if tokens.is_empty() {
        return Ok(0.0);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(ExprError::TrailingTokens);
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' => i += 1,
            b'+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            b'*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            b'/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i], b'0'..=b'9' | b'.') {
                    i += 1;
                }
                let text = &input[start..i];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.to_string()))?;
                tokens.push(Token::Number(value));
            }
            // Unreachable after sanitize, kept for direct callers.
            _ => return Err(ExprError::UnexpectedToken(i)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    /// True when consuming the operator at `pos` would leave no operand.
    /// That shape only arises from a stripped suffix; the operator is
    /// dropped rather than rejected.
    fn operator_is_dangling(&self) -> bool {
        self.pos + 1 >= self.tokens.len()
    }

    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            let apply = match op {
                Token::Plus => |a: f64, b: f64| a + b,
                Token::Minus => |a: f64, b: f64| a - b,
                _ => break,
            };
            if self.operator_is_dangling() {
                self.pos += 1;
                break;
            }
            self.pos += 1;
            let rhs = self.term()?;
            value = apply(value, rhs);
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            let apply = match op {
                Token::Star => |a: f64, b: f64| a * b,
                Token::Slash => |a: f64, b: f64| a / b,
                _ => break,
            };
            if self.operator_is_dangling() {
                self.pos += 1;
                break;
            }
            self.pos += 1;
            let rhs = self.factor()?;
            value = apply(value, rhs);
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(value)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.expression()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(ExprError::UnbalancedParen),
                }
            }
            _ => Err(ExprError::UnexpectedToken(self.pos)),
        }
    }
}
