//! Error types and position tracking for configuration parsing
//!
//! This module provides the error taxonomy for the line classifier, the
//! tree builder and the serde layer, along with source-context rendering
//! for user-facing diagnostics.

use std::fmt;
use thiserror::Error;

/// Represents a position in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Creates a position at the given line and column
    pub fn at(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Creates a position at the start of the given line
    pub fn line_start(line: usize) -> Self {
        Self { line, column: 1 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Context information for enhanced error reporting
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The original source text
    pub source: String,
    /// Where the error occurred
    pub position: Position,
    /// Suggested fixes for the error
    pub suggestions: Vec<String>,
    /// Additional help text
    pub help: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context
    pub fn new(source: String, position: Position) -> Self {
        Self {
            source,
            position,
            suggestions: Vec::new(),
            help: None,
        }
    }

    /// Adds a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// Adds help text for the error
    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Extracts the source lines around the error with a caret marker
    pub fn source_snippet(&self) -> String {
        self.extract_lines_around(2)
    }

    /// Extracts lines around the error position with context
    pub fn extract_lines_around(&self, context_lines: usize) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        if lines.is_empty() {
            return String::new();
        }

        // Convert to 0-based and clamp, UnbalancedOpen may point past the last line
        let error_line = self
            .position
            .line
            .saturating_sub(1)
            .min(lines.len().saturating_sub(1));
        let context_start = error_line.saturating_sub(context_lines);
        let context_end = (error_line + context_lines + 1).min(lines.len());
        let line_number_width = context_end.to_string().len();

        let mut result = String::new();
        for (i, line) in lines[context_start..context_end].iter().enumerate() {
            let index = context_start + i;
            result.push_str(&format!(
                "{:width$} | {}\n",
                index + 1,
                line.trim_end_matches('\r'),
                width = line_number_width
            ));

            if index == error_line {
                let spaces =
                    " ".repeat(line_number_width + 3 + self.position.column.saturating_sub(1));
                result.push_str(&format!("{}^  <-- Error here\n", spaces));
            }
        }

        result
    }

    /// Formats the error context for display
    pub fn format_error(&self, error_message: &str) -> String {
        let mut output = format!("Error at {}: {}\n\n", self.position, error_message);
        output.push_str(&self.source_snippet());

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(help) = &self.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Main error type for parsing a configuration document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line classification error
    #[error("Lexical error: {0}")]
    Lex(#[from] LexError),

    /// Tree building error
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),
}

impl ParseError {
    /// Returns the 1-based line the error refers to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Lex(err) => Some(err.line()),
            ParseError::Structure(err) => err.line(),
        }
    }
}

/// Line classification errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A `"` was opened without a matching close on the same line
    #[error("Unterminated quoted value at {line}:{column}")]
    UnterminatedQuote { line: usize, column: usize },

    /// A block-open line with nothing before the `{`
    #[error("Block opened without a key at line {line}")]
    EmptyKeyPath { line: usize },

    /// A `/*` comment without `*/` on the same line
    #[error("Unterminated comment at line {line}")]
    UnterminatedComment { line: usize },
}

impl LexError {
    /// Returns the 1-based line of the offending input
    pub fn line(&self) -> usize {
        match self {
            LexError::UnterminatedQuote { line, .. }
            | LexError::EmptyKeyPath { line }
            | LexError::UnterminatedComment { line } => *line,
        }
    }

    /// Returns the position of the offending input
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedQuote { line, column } => Position::at(*line, *column),
            other => Position::line_start(other.line()),
        }
    }
}

/// Tree building errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    /// `}` with no open scope to close
    #[error("Unexpected '}}' at line {line}: no open block to close")]
    UnexpectedClose { line: usize },

    /// Input ended with scopes still open
    #[error("Unexpected end of input: {open} block(s) left open, innermost opened at line {line}")]
    UnbalancedOpen { open: usize, line: usize },

    /// A key used both as a block and as a scalar or list
    #[error("Key '{key}' at line {line} is used both as a block and as a value")]
    KeyKindConflict { key: String, line: usize },

    /// Nesting exceeded the configured bound
    #[error("Maximum nesting depth of {limit} exceeded at line {line}")]
    MaxDepthExceeded { limit: usize, line: usize },

    /// A repeated leaf key when duplicates are configured as errors
    #[error("Duplicate key '{key}' at line {line}")]
    DuplicateKey { key: String, line: usize },
}

impl StructureError {
    /// Returns the 1-based line of the offending input
    pub fn line(&self) -> Option<usize> {
        match self {
            StructureError::UnexpectedClose { line }
            | StructureError::UnbalancedOpen { line, .. }
            | StructureError::KeyKindConflict { line, .. }
            | StructureError::MaxDepthExceeded { line, .. }
            | StructureError::DuplicateKey { line, .. } => Some(*line),
        }
    }
}

/// Errors raised while deserializing a parsed tree into Rust types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeError {
    /// Custom serde error message
    #[error("{0}")]
    Custom(String),

    /// The tree holds a different kind of value than the target type wants
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        path: String,
    },

    /// A scalar that does not parse as the requested primitive
    #[error("Invalid value '{value}' at '{path}': expected {expected}")]
    InvalidScalar {
        value: String,
        expected: String,
        path: String,
    },
}

impl serde::de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DeError::Custom(msg.to_string())
    }
}

/// Error type for the parse-then-deserialize helpers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VyattaError {
    /// The text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The tree could not be deserialized into the target type
    #[error("Deserialization error: {0}")]
    De(#[from] DeError),
}

impl serde::de::Error for VyattaError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        VyattaError::De(DeError::Custom(msg.to_string()))
    }
}

/// Enhanced error with context information
#[derive(Debug)]
pub struct EnhancedError {
    pub error: ParseError,
    pub context: Option<ErrorContext>,
}

impl EnhancedError {
    /// Creates a new enhanced error
    pub fn new(error: ParseError) -> Self {
        Self {
            error,
            context: None,
        }
    }

    /// Adds context to the error
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Formats the error with context if available
    pub fn format(&self) -> String {
        let base_message = self.error.to_string();
        if let Some(ctx) = &self.context {
            ctx.format_error(&base_message)
        } else {
            base_message
        }
    }
}

impl fmt::Display for EnhancedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl std::error::Error for EnhancedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl ParseError {
    /// Enhances this error with context information from source text
    pub fn with_source_context(self, source: &str) -> EnhancedError {
        let source = source.to_string();
        let context = match &self {
            ParseError::Lex(lex_err) => {
                let ctx = ErrorContext::new(source, lex_err.position());
                match lex_err {
                    LexError::UnterminatedQuote { .. } => ctx
                        .with_suggestion("Add the closing '\"' on the same line".to_string())
                        .with_help("Quoted values cannot span multiple lines".to_string()),
                    LexError::EmptyKeyPath { .. } => ctx
                        .with_suggestion("Put the block name before '{', e.g. 'interfaces {'".to_string()),
                    LexError::UnterminatedComment { .. } => ctx
                        .with_suggestion("Close the comment with '*/' on the same line".to_string()),
                }
            }
            ParseError::Structure(structure_err) => {
                let line = structure_err.line().unwrap_or(1);
                let ctx = ErrorContext::new(source, Position::line_start(line));
                match structure_err {
                    StructureError::UnexpectedClose { .. } => ctx
                        .with_suggestion("Remove the extra '}' or add the missing block header".to_string()),
                    StructureError::UnbalancedOpen { open, .. } => ctx
                        .with_suggestion(format!("Add {} closing '}}'", open))
                        .with_help("Every 'name {' line needs a matching '}' line".to_string()),
                    StructureError::KeyKindConflict { key, .. } => ctx
                        .with_suggestion(format!(
                            "Use '{}' either as a block header or as a value, not both",
                            key
                        )),
                    StructureError::MaxDepthExceeded { limit, .. } => ctx
                        .with_suggestion(format!(
                            "Raise ParserConfig::max_depth above {} if the nesting is intentional",
                            limit
                        )),
                    StructureError::DuplicateKey { key, .. } => ctx
                        .with_suggestion(format!("Remove the repeated '{}' assignment", key))
                        .with_help(
                            "DuplicateKeyBehavior::ImplicitList collects repeated keys into a list"
                                .to_string(),
                        ),
                }
            }
        };

        EnhancedError::new(self).with_context(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_position_display() {
        let pos = Position::at(42, 13);
        assert_eq!(format!("{}", pos), "42:13");
    }

    #[test]
    fn test_parse_error_line() {
        let err: ParseError = LexError::UnterminatedQuote { line: 3, column: 17 }.into();
        assert_eq!(err.line(), Some(3));

        let err: ParseError = StructureError::UnexpectedClose { line: 9 }.into();
        assert_eq!(err.line(), Some(9));
    }

    #[test]
    fn test_lex_error_position() {
        let err = LexError::UnterminatedQuote { line: 2, column: 5 };
        assert_eq!(err.position(), Position::at(2, 5));

        let err = LexError::EmptyKeyPath { line: 4 };
        assert_eq!(err.position(), Position::at(4, 1));
    }

    #[test]
    fn test_error_messages() {
        let err = StructureError::KeyKindConflict {
            key: "address".to_string(),
            line: 7,
        };
        assert_eq!(
            err.to_string(),
            "Key 'address' at line 7 is used both as a block and as a value"
        );

        let err = StructureError::UnexpectedClose { line: 1 };
        assert_eq!(
            err.to_string(),
            "Unexpected '}' at line 1: no open block to close"
        );
    }
}
