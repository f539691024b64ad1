//! Error types for formula parsing and evaluation.

use thiserror::Error;

use crate::formula::Function;

/// Result type for formula operations.
pub type Result<T> = std::result::Result<T, FormulaError>;

/// Errors raised while tokenizing, parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// A function argument names a field the dataset does not have.
    #[error("Column '{column}' not found in survey data. Available columns: {}", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    /// A character outside the formula grammar.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    /// An identifier that is not one of the supported aggregate functions.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A function name that is not followed by an argument list.
    #[error("function {0} must be followed by '('")]
    ExpectedCall(Function),

    /// A field name argument that is empty or holds characters outside
    /// word characters, spaces, hyphens and dots.
    #[error("invalid field name '{field}' in {function}")]
    InvalidFieldName { function: Function, field: String },

    /// A function called with the wrong number of arguments.
    #[error("{function} expects {expected}")]
    InvalidArguments {
        function: Function,
        expected: &'static str,
    },

    /// A numeric literal that does not parse.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// A token that cannot appear at its position.
    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    /// The formula ended while an operand or closing parenthesis was expected.
    #[error("unexpected end of formula")]
    UnexpectedEnd,
}

impl FormulaError {
    /// Wrap an evaluation failure with the formula it came from.
    pub(crate) fn describe(&self, formula: &str) -> String {
        match self {
            Self::UnknownColumn { .. } => self.to_string(),
            other => format!("Could not evaluate formula: {formula}. Evaluation error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_column_message_lists_available_columns() {
        let err = FormulaError::UnknownColumn {
            column: "Age".to_string(),
            available: vec!["Student ID".to_string(), "Course Name".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "Column 'Age' not found in survey data. Available columns: Student ID, Course Name"
        );
    }

    #[test]
    fn describe_prefixes_syntax_errors_with_formula() {
        let err = FormulaError::UnexpectedEnd;

        let message = err.describe("SUM(cases) +");

        assert!(message.starts_with("Could not evaluate formula: SUM(cases) +"));
        assert!(message.ends_with("unexpected end of formula"));
    }
}
