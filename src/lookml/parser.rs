//! Recursive-descent parser for LookML-style block syntax.
//!
//! Produces a raw pair tree that is immediately lowered into typed model
//! values by [`super::lower`]; the tree itself never leaves this module's
//! parent.

use super::lexer::{SpannedToken, Token};
use super::ParseError;

/// A parsed value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    /// Bareword, quoted string, number, or raw expression text.
    Scalar(String),
    /// Bracketed list of scalars.
    List(Vec<String>),
    /// Braced block, optionally labeled: `dimension: id { ... }`.
    Block {
        label: Option<String>,
        pairs: Vec<Pair>,
    },
}

/// One `key: value` pair.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pair {
    pub key: String,
    pub value: Value,
}

pub(crate) struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token stream as a sequence of pairs.
    pub fn parse(mut self) -> Result<Vec<Pair>, ParseError> {
        let mut pairs = Vec::new();
        while self.pos < self.tokens.len() {
            pairs.push(self.parse_pair()?);
        }
        Ok(pairs)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|(_, l)| *l)
            .unwrap_or(0)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn parse_pair(&mut self) -> Result<Pair, ParseError> {
        let line = self.line();
        let key = match self.next() {
            Some(Token::Ident(key)) => key,
            other => {
                return Err(ParseError::ExpectedKey {
                    found: describe(other.as_ref()),
                    line,
                })
            }
        };

        let line = self.line();
        match self.next() {
            Some(Token::Colon) => {}
            other => {
                return Err(ParseError::ExpectedColon {
                    key: key.clone(),
                    found: describe(other.as_ref()),
                    line,
                })
            }
        }

        let value = self.parse_value()?;
        Ok(Pair { key, value })
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let line = self.line();
        match self.next() {
            Some(Token::ExprBlock(text)) => Ok(Value::Scalar(text)),
            Some(Token::StringLit(text)) => Ok(Value::Scalar(text)),
            Some(Token::Number(text)) => Ok(Value::Scalar(text)),
            Some(Token::Ident(word)) => {
                // A bareword followed by `{` labels a block
                if self.peek() == Some(&Token::LBrace) {
                    self.pos += 1;
                    let pairs = self.parse_block_body()?;
                    Ok(Value::Block {
                        label: Some(word),
                        pairs,
                    })
                } else {
                    Ok(Value::Scalar(word))
                }
            }
            Some(Token::LBrace) => {
                let pairs = self.parse_block_body()?;
                Ok(Value::Block { label: None, pairs })
            }
            Some(Token::LBracket) => self.parse_list(),
            other => Err(ParseError::ExpectedValue {
                found: describe(other.as_ref()),
                line,
            }),
        }
    }

    fn parse_block_body(&mut self) -> Result<Vec<Pair>, ParseError> {
        let mut pairs = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(pairs);
                }
                Some(_) => pairs.push(self.parse_pair()?),
                None => {
                    return Err(ParseError::UnclosedBlock { line: self.line() });
                }
            }
        }
    }

    fn parse_list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        loop {
            let line = self.line();
            match self.next() {
                Some(Token::RBracket) => return Ok(Value::List(items)),
                Some(Token::Ident(word)) => items.push(word),
                Some(Token::StringLit(text)) => items.push(text),
                Some(Token::Number(text)) => items.push(text),
                Some(Token::Comma) => {}
                other => {
                    return Err(ParseError::ExpectedValue {
                        found: describe(other.as_ref()),
                        line,
                    })
                }
            }
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(Token::Ident(s)) => format!("identifier `{}`", s),
        Some(Token::StringLit(_)) => "string literal".to_string(),
        Some(Token::Number(n)) => format!("number `{}`", n),
        Some(Token::ExprBlock(_)) => "expression block".to_string(),
        Some(Token::Colon) => "`:`".to_string(),
        Some(Token::LBrace) => "`{`".to_string(),
        Some(Token::RBrace) => "`}`".to_string(),
        Some(Token::LBracket) => "`[`".to_string(),
        Some(Token::RBracket) => "`]`".to_string(),
        Some(Token::Comma) => "`,`".to_string(),
        None => "end of input".to_string(),
    }
}
