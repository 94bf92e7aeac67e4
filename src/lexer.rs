//! Line classifier for Vyatta-style configuration text
//!
//! This module turns raw configuration text into a lazy stream of
//! classified lines. Every physical line is exactly one of: blank, comment,
//! block open, block close or leaf assignment. Indentation carries no
//! meaning and `\r\n` is treated the same as `\n`.

use crate::error::LexError;
use log::warn;
use smallvec::SmallVec;

/// Key path of a block-open line. Headers rarely have more than a few tokens.
pub type KeyPath<'a> = SmallVec<[&'a str; 4]>;

/// Configuration options for the line classifier
#[derive(Debug, Clone)]
pub struct LexerConfig {
    /// Classify whole-line `/* ... */` comments as [`ClassifiedLine::Comment`].
    /// When disabled such lines are read as ordinary leaf assignments.
    pub recognize_comments: bool,
}

impl LexerConfig {
    /// Creates a new lexer configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether whole-line comments are recognized
    pub fn with_recognize_comments(mut self, recognize: bool) -> Self {
        self.recognize_comments = recognize;
        self
    }
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            recognize_comments: true,
        }
    }
}

/// The classification of a single source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine<'a> {
    /// Empty or whitespace-only line
    Blank,
    /// Whole-line `/* ... */` comment, delimiters and surrounding whitespace stripped
    Comment { text: &'a str },
    /// `token+ {`: opens one scope per key path token
    BlockOpen { key_path: KeyPath<'a> },
    /// `}`
    BlockClose,
    /// `key value`, the value may be empty
    Leaf { key: &'a str, value: &'a str },
}

impl<'a> ClassifiedLine<'a> {
    /// Returns a human-readable name for the line kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            ClassifiedLine::Blank => "blank",
            ClassifiedLine::Comment { .. } => "comment",
            ClassifiedLine::BlockOpen { .. } => "block open",
            ClassifiedLine::BlockClose => "block close",
            ClassifiedLine::Leaf { .. } => "leaf",
        }
    }
}

/// A classified line together with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub line: usize,
    pub class: ClassifiedLine<'a>,
}

/// Scanner state while splitting a block header into tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// Between tokens
    Outside,
    /// Inside an unquoted token
    Bare,
    /// Inside a `"..."` token
    Quoted,
}

/// Lazy, single-pass classifier over configuration text
pub struct LineClassifier<'a> {
    lines: std::str::Split<'a, char>,
    line_number: usize,
    config: LexerConfig,
    failed: bool,
}

impl<'a> LineClassifier<'a> {
    /// Creates a classifier with the default configuration
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, LexerConfig::default())
    }

    /// Creates a classifier with a custom configuration
    pub fn with_config(input: &'a str, config: LexerConfig) -> Self {
        Self {
            lines: input.split('\n'),
            line_number: 0,
            config,
            failed: false,
        }
    }

    /// Returns the number of physical lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }
}

impl<'a> Iterator for LineClassifier<'a> {
    type Item = Result<SourceLine<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let raw = self.lines.next()?;
        self.line_number += 1;

        let result = classify_line(raw, self.line_number, &self.config).map(|class| SourceLine {
            line: self.line_number,
            class,
        });
        // The stream ends after the first error
        self.failed = result.is_err();
        Some(result)
    }
}

/// Classifies a single physical line (without its `\n`).
pub fn classify_line<'a>(
    raw: &'a str,
    line: usize,
    config: &LexerConfig,
) -> Result<ClassifiedLine<'a>, LexError> {
    let text = raw.strip_suffix('\r').unwrap_or(raw);
    let trimmed = text.trim();
    let indent = text.len() - text.trim_start().len();

    if trimmed.is_empty() {
        return Ok(ClassifiedLine::Blank);
    }

    if trimmed == "}" {
        return Ok(ClassifiedLine::BlockClose);
    }

    if config.recognize_comments && trimmed.starts_with("/*") {
        return match trimmed[2..].strip_suffix("*/") {
            Some(body) => Ok(ClassifiedLine::Comment { text: body.trim() }),
            None => Err(LexError::UnterminatedComment { line }),
        };
    }

    if let Some(header) = trimmed.strip_suffix('{') {
        let key_path = tokenize_key_path(header.trim_end(), line, text, indent)?;
        if key_path.is_empty() {
            return Err(LexError::EmptyKeyPath { line });
        }
        return Ok(ClassifiedLine::BlockOpen { key_path });
    }

    classify_leaf(trimmed, line, text, indent)
}

/// Splits a block header on whitespace, keeping `"..."` runs as one token
/// with the quotes stripped.
fn tokenize_key_path<'a>(
    header: &'a str,
    line: usize,
    text: &str,
    indent: usize,
) -> Result<KeyPath<'a>, LexError> {
    let mut tokens = KeyPath::new();
    let mut mode = ScanMode::Outside;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match (mode, c) {
            (ScanMode::Outside, '"') => {
                mode = ScanMode::Quoted;
                start = i + 1;
            }
            (ScanMode::Outside, c) if c.is_whitespace() => {}
            (ScanMode::Outside, _) => {
                mode = ScanMode::Bare;
                start = i;
            }
            (ScanMode::Bare, c) if c.is_whitespace() => {
                tokens.push(&header[start..i]);
                mode = ScanMode::Outside;
            }
            (ScanMode::Quoted, '"') => {
                tokens.push(&header[start..i]);
                mode = ScanMode::Outside;
            }
            (ScanMode::Bare, _) | (ScanMode::Quoted, _) => {}
        }
    }

    match mode {
        ScanMode::Outside => {}
        ScanMode::Bare => tokens.push(&header[start..]),
        ScanMode::Quoted => {
            // `start` is one past the opening quote
            return Err(LexError::UnterminatedQuote {
                line,
                column: column_at(text, indent + start - 1),
            });
        }
    }

    Ok(tokens)
}

fn classify_leaf<'a>(
    trimmed: &'a str,
    line: usize,
    text: &str,
    indent: usize,
) -> Result<ClassifiedLine<'a>, LexError> {
    let (key, rest) = if trimmed.starts_with('"') {
        split_quoted(trimmed, line, text, indent)?
    } else {
        match trimmed.find(char::is_whitespace) {
            Some(end) => (&trimmed[..end], &trimmed[end..]),
            None => (trimmed, ""),
        }
    };

    let rest = rest.trim_start();
    if !rest.starts_with('"') {
        return Ok(ClassifiedLine::Leaf { key, value: rest });
    }

    // `trimmed` has no trailing whitespace, so `rest` ends where it ends
    let rest_at = trimmed.len() - rest.len();
    let (value, trailing) = split_quoted(rest, line, text, indent + rest_at)?;
    let trailing = trailing.trim();
    if !trailing.is_empty() {
        warn!(
            "line {}: ignoring '{}' after quoted value of '{}'",
            line, trailing, key
        );
    }

    Ok(ClassifiedLine::Leaf { key, value })
}

/// Splits `"content"rest` into `content` and `rest`. `s` must start with `"`
/// and `offset` is its byte offset within `text`.
fn split_quoted<'a>(
    s: &'a str,
    line: usize,
    text: &str,
    offset: usize,
) -> Result<(&'a str, &'a str), LexError> {
    let body = &s[1..];
    match body.find('"') {
        Some(end) => Ok((&body[..end], &body[end + 1..])),
        None => Err(LexError::UnterminatedQuote {
            line,
            column: column_at(text, offset),
        }),
    }
}

/// 1-based character column of a byte offset within a line
fn column_at(text: &str, byte: usize) -> usize {
    text.get(..byte).map_or(byte, |prefix| prefix.chars().count()) + 1
}

/// Classifies every line of `input`, stopping at the first error
pub fn classify_all<'a>(
    input: &'a str,
    config: LexerConfig,
) -> Result<Vec<SourceLine<'a>>, LexError> {
    LineClassifier::with_config(input, config).collect()
}
