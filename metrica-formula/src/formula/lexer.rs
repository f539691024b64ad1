//! Formula tokenizer.
//!
//! Aggregate calls are lexed as a unit: once a function name is seen, its
//! parenthesised argument list is read raw so that field names may contain
//! spaces, hyphens and dots (`COUNT(Student ID)`).

use std::iter::Peekable;
use std::str::CharIndices;

use super::Function;
use crate::error::{FormulaError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Function(Function),
    /// Field name argument of an aggregate call.
    Field(String),
    /// Literal comparison value (second argument of `PERCENTAGE`).
    Literal(String),
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
    Comma,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Function(f) => f.to_string(),
            Self::Field(name) => format!("field '{name}'"),
            Self::Literal(value) => format!("literal '{value}'"),
            Self::Number(n) => n.to_string(),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LeftParen => "'('".to_string(),
            Self::RightParen => "')'".to_string(),
            Self::Comma => "','".to_string(),
        }
    }
}

/// Split a formula into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer {
        chars: input.char_indices().peekable(),
        tokens: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>> {
        while let Some(&(position, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '(' => self.single(Token::LeftParen),
                ')' => self.single(Token::RightParen),
                '0'..='9' | '.' => {
                    let number = self.number()?;
                    self.tokens.push(Token::Number(number));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let name = self.identifier();
                    let function = Function::parse(&name)
                        .ok_or_else(|| FormulaError::UnknownFunction(name.clone()))?;
                    self.call(function)?;
                }
                _ => return Err(FormulaError::UnexpectedCharacter { ch, position }),
            }
        }
        Ok(self.tokens)
    }

    fn single(&mut self, token: Token) {
        self.chars.next();
        self.tokens.push(token);
    }

    fn take_while(&mut self, buf: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !pred(ch) {
                break;
            }
            buf.push(ch);
            self.chars.next();
        }
    }

    fn number(&mut self) -> Result<f64> {
        let mut text = String::new();
        self.take_while(&mut text, |c| c.is_ascii_digit() || c == '.');

        if let Some(&(_, 'e' | 'E')) = self.chars.peek() {
            let mut lookahead = self.chars.clone();
            let mut exponent = String::new();
            if let Some((_, e)) = lookahead.next() {
                exponent.push(e);
            }
            if let Some(&(_, sign @ ('+' | '-'))) = lookahead.peek() {
                exponent.push(sign);
                lookahead.next();
            }
            if matches!(lookahead.peek(), Some((_, d)) if d.is_ascii_digit()) {
                self.chars = lookahead;
                text.push_str(&exponent);
                self.take_while(&mut text, |c| c.is_ascii_digit());
            }
        }

        text.parse::<f64>()
            .map_err(|_| FormulaError::InvalidNumber(text.clone()))
    }

    fn identifier(&mut self) -> String {
        let mut name = String::new();
        self.take_while(&mut name, |c| c.is_alphanumeric() || c == '_');
        name
    }

    /// Lex `( args )` after a function name.
    fn call(&mut self, function: Function) -> Result<()> {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
        match self.chars.next() {
            Some((_, '(')) => {}
            _ => return Err(FormulaError::ExpectedCall(function)),
        }

        let mut raw = String::new();
        loop {
            match self.chars.next() {
                Some((_, ')')) => break,
                Some((_, ch)) => raw.push(ch),
                None => return Err(FormulaError::UnexpectedEnd),
            }
        }

        self.tokens.push(Token::Function(function));
        self.tokens.push(Token::LeftParen);
        if function.takes_value() {
            let (field, value) = raw.split_once(',').ok_or(FormulaError::InvalidArguments {
                function,
                expected: "a field name and a value",
            })?;
            self.tokens.push(Token::Field(field_name(function, field)?));
            self.tokens.push(Token::Comma);
            let value = value.trim().trim_matches(&['\'', '"'][..]);
            if value.is_empty() {
                return Err(FormulaError::InvalidArguments {
                    function,
                    expected: "a non-empty comparison value",
                });
            }
            self.tokens.push(Token::Literal(value.to_string()));
        } else {
            self.tokens.push(Token::Field(field_name(function, &raw)?));
        }
        self.tokens.push(Token::RightParen);
        Ok(())
    }
}

/// Field names are word characters, whitespace, hyphens and dots.
fn field_name(function: Function, raw: &str) -> Result<String> {
    let field = raw.trim();
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace() || c == '-' || c == '.');
    if valid {
        Ok(field.to_string())
    } else {
        Err(FormulaError::InvalidFieldName {
            function,
            field: field.to_string(),
        })
    }
}
