//! Recursive-descent parser producing the formula expression tree.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')' | FUNCTION '(' FIELD (',' LITERAL)? ')'
//! ```

use super::Function;
use super::lexer::Token;
use crate::error::{FormulaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// An aggregate function applied to one dataset field.
    Aggregate {
        function: Function,
        field: String,
        value: Option<String>,
    },
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Visit every aggregate call in evaluation order.
    pub fn for_each_aggregate<'a>(&'a self, f: &mut impl FnMut(Function, &'a str)) {
        match self {
            Self::Number(_) => {}
            Self::Aggregate {
                function, field, ..
            } => f(*function, field),
            Self::Negate(inner) => inner.for_each_aggregate(f),
            Self::Binary { lhs, rhs, .. } => {
                lhs.for_each_aggregate(f);
                rhs.for_each_aggregate(f);
            }
        }
    }
}

pub fn parse(tokens: Vec<Token>) -> Result<Expr> {
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };
    let expr = parser.expr()?;
    match parser.tokens.next() {
        None => Ok(expr),
        Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
    }
}

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.tokens.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(lhs),
            };
            self.tokens.next();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.tokens.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(lhs),
            };
            self.tokens.next();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        match self.tokens.peek() {
            Some(Token::Minus) => {
                self.tokens.next();
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.tokens.next();
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.tokens.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LeftParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::Function(function)) => self.aggregate(function),
            Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn aggregate(&mut self, function: Function) -> Result<Expr> {
        self.expect(&Token::LeftParen)?;
        let field = match self.tokens.next() {
            Some(Token::Field(field)) => field,
            Some(token) => return Err(FormulaError::UnexpectedToken(token.describe())),
            None => return Err(FormulaError::UnexpectedEnd),
        };
        let value = if self.tokens.peek() == Some(&Token::Comma) {
            self.tokens.next();
            match self.tokens.next() {
                Some(Token::Literal(value)) => Some(value),
                Some(token) => return Err(FormulaError::UnexpectedToken(token.describe())),
                None => return Err(FormulaError::UnexpectedEnd),
            }
        } else {
            None
        };
        self.expect(&Token::RightParen)?;
        Ok(Expr::Aggregate {
            function,
            field,
            value,
        })
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.tokens.next() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(FormulaError::UnexpectedToken(token.describe())),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
