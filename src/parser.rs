//! Tree builder for classified configuration lines
//!
//! This module consumes the line stream produced by the classifier and
//! builds the nested [`ConfigBlock`] tree. Nesting is tracked with an
//! explicit stack of open scopes rather than recursion, so the depth guard
//! in [`ParserConfig`] bounds both parse time and the shape of the result.

use crate::error::{ParseError, StructureError};
use crate::lexer::{ClassifiedLine, LexerConfig, LineClassifier, SourceLine};
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Behavior when a leaf key is assigned more than once in the same block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKeyBehavior {
    /// Collect repeated values into a list, in source order
    ImplicitList,
    /// Keep only the last value
    Override,
    /// Return an error when a key is repeated
    Error,
}

/// Configuration options for the tree builder
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum block nesting level. Each token of a multi-token block
    /// header counts as one level.
    pub max_depth: usize,
    /// Behavior when a leaf key is repeated
    pub duplicate_key_behavior: DuplicateKeyBehavior,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the duplicate key behavior
    pub fn with_duplicate_key_behavior(mut self, behavior: DuplicateKeyBehavior) -> Self {
        self.duplicate_key_behavior = behavior;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            duplicate_key_behavior: DuplicateKeyBehavior::ImplicitList,
        }
    }
}

/// A parsed configuration value.
///
/// Values are never coerced: `cost 2` yields `Scalar("2")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A single assignment
    Scalar(String),
    /// Repeated assignments to one key, in source order
    List(ConfigList),
    /// A `{ ... }` scope
    Block(ConfigBlock),
}

/// Block mapping (preserves insertion order)
pub type ConfigBlock = IndexMap<String, ConfigValue>;

/// Values of a repeated key. Most repeated keys (addresses, name servers)
/// hold only a handful of entries, so small lists stay inline.
pub type ConfigList = SmallVec<[String; 4]>;

impl ConfigValue {
    /// Returns true if the value is a scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, ConfigValue::Scalar(_))
    }

    /// Returns true if the value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, ConfigValue::List(_))
    }

    /// Returns true if the value is a block
    pub fn is_block(&self) -> bool {
        matches!(self, ConfigValue::Block(_))
    }

    /// Returns the string if this is a Scalar variant
    pub fn as_str(&self) -> Option<&str> {
        if let ConfigValue::Scalar(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Returns the items if this is a List variant
    pub fn as_list(&self) -> Option<&[String]> {
        if let ConfigValue::List(items) = self {
            Some(items.as_slice())
        } else {
            None
        }
    }

    /// Returns the mapping if this is a Block variant
    pub fn as_block(&self) -> Option<&ConfigBlock> {
        if let ConfigValue::Block(block) = self {
            Some(block)
        } else {
            None
        }
    }

    /// Looks up a child key if this is a Block variant
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_block().and_then(|block| block.get(key))
    }

    /// Iterates the assigned strings: one for a scalar, each item for a
    /// list, none for a block.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            ConfigValue::Scalar(s) => std::slice::from_ref(s),
            ConfigValue::List(items) => items.as_slice(),
            ConfigValue::Block(_) => &[],
        };
        items.iter().map(String::as_str)
    }

    /// Returns a short name for the value kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Scalar(_) => "scalar",
            ConfigValue::List(_) => "list",
            ConfigValue::Block(_) => "block",
        }
    }
}

/// Walks `path` through nested blocks starting at `block`
pub fn lookup<'b>(block: &'b ConfigBlock, path: &[&str]) -> Option<&'b ConfigValue> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(block.get(*first)?, |value, key| value.get(key))
}

/// One open scope on the nesting stack
#[derive(Debug)]
struct Frame {
    /// Key path from the parent scope, one entry per header token
    path: SmallVec<[String; 4]>,
    /// Contents collected so far; the parent holds an empty placeholder
    block: ConfigBlock,
    /// Line of the block header
    line: usize,
    /// Nesting level of `block`, the root is level 0
    level: usize,
}

/// Builds a [`ConfigBlock`] from classified lines, one line at a time
#[derive(Debug)]
pub struct TreeBuilder {
    root: Frame,
    open: Vec<Frame>,
    config: ParserConfig,
}

impl TreeBuilder {
    /// Creates a builder with the default configuration
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Creates a builder with a custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            root: Frame {
                path: SmallVec::new(),
                block: ConfigBlock::new(),
                line: 0,
                level: 0,
            },
            open: Vec::new(),
            config,
        }
    }

    /// Number of currently open scopes, not counting the root
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn current(&mut self) -> &mut Frame {
        match self.open.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    /// Applies one classified line to the current scope
    pub fn apply(&mut self, line: SourceLine<'_>) -> Result<(), StructureError> {
        match line.class {
            ClassifiedLine::Blank => Ok(()),
            ClassifiedLine::Comment { text } => {
                trace!("line {}: skipping comment '{}'", line.line, text);
                Ok(())
            }
            ClassifiedLine::BlockOpen { key_path } => self.open_block(&key_path, line.line),
            ClassifiedLine::BlockClose => self.close_block(line.line),
            ClassifiedLine::Leaf { key, value } => self.assign(key, value, line.line),
        }
    }

    fn open_block(&mut self, key_path: &[&str], line: usize) -> Result<(), StructureError> {
        let limit = self.config.max_depth;
        let parent = self.current();
        let level = parent.level + key_path.len();
        if level > limit {
            return Err(StructureError::MaxDepthExceeded { limit, line });
        }

        let slot = descend_or_create(&mut parent.block, key_path, line)?;
        // Reopening an existing block continues it
        let block = std::mem::take(slot);

        trace!("line {}: open {:?} at level {}", line, key_path, level);
        self.open.push(Frame {
            path: key_path.iter().map(|token| token.to_string()).collect(),
            block,
            line,
            level,
        });
        Ok(())
    }

    fn close_block(&mut self, line: usize) -> Result<(), StructureError> {
        let frame = self
            .open
            .pop()
            .ok_or(StructureError::UnexpectedClose { line })?;
        trace!(
            "line {}: close {:?} opened at line {}",
            line, frame.path, frame.line
        );

        let parent = self.current();
        match descend(&mut parent.block, &frame.path) {
            Some(slot) => *slot = frame.block,
            None => unreachable!("placeholder for {:?} vanished while open", frame.path),
        }
        Ok(())
    }

    fn assign(&mut self, key: &str, value: &str, line: usize) -> Result<(), StructureError> {
        let behavior = self.config.duplicate_key_behavior;
        let block = &mut self.current().block;

        match block.get_mut(key) {
            None => {
                block.insert(key.to_string(), ConfigValue::Scalar(value.to_string()));
            }
            Some(ConfigValue::Block(_)) => {
                return Err(StructureError::KeyKindConflict {
                    key: key.to_string(),
                    line,
                });
            }
            Some(existing) => match behavior {
                DuplicateKeyBehavior::ImplicitList => match existing {
                    ConfigValue::List(items) => items.push(value.to_string()),
                    ConfigValue::Scalar(first) => {
                        let first = std::mem::take(first);
                        *existing = ConfigValue::List(smallvec![first, value.to_string()]);
                    }
                    ConfigValue::Block(_) => unreachable!("block handled above"),
                },
                DuplicateKeyBehavior::Override => {
                    *existing = ConfigValue::Scalar(value.to_string());
                }
                DuplicateKeyBehavior::Error => {
                    return Err(StructureError::DuplicateKey {
                        key: key.to_string(),
                        line,
                    });
                }
            },
        }
        Ok(())
    }

    /// Consumes the builder and returns the root block if every scope was closed
    pub fn finish(self) -> Result<ConfigBlock, StructureError> {
        if let Some(innermost) = self.open.last() {
            return Err(StructureError::UnbalancedOpen {
                open: self.open.len(),
                line: innermost.line,
            });
        }
        Ok(self.root.block)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Follows `path` from `block`, creating missing blocks on the way
fn descend_or_create<'b>(
    block: &'b mut ConfigBlock,
    path: &[&str],
    line: usize,
) -> Result<&'b mut ConfigBlock, StructureError> {
    let mut current = block;
    for key in path {
        let entry = current
            .entry((*key).to_string())
            .or_insert_with(|| ConfigValue::Block(ConfigBlock::new()));
        current = match entry {
            ConfigValue::Block(child) => child,
            _ => {
                return Err(StructureError::KeyKindConflict {
                    key: (*key).to_string(),
                    line,
                });
            }
        };
    }
    Ok(current)
}

/// Follows `path` from `block` through existing blocks only
fn descend<'b>(block: &'b mut ConfigBlock, path: &[String]) -> Option<&'b mut ConfigBlock> {
    path.iter().try_fold(block, |current, key| match current.get_mut(key) {
        Some(ConfigValue::Block(child)) => Some(child),
        _ => None,
    })
}

/// Builds a tree from already classified lines
pub fn build_tree<'a, I>(lines: I, config: ParserConfig) -> Result<ConfigBlock, StructureError>
where
    I: IntoIterator<Item = SourceLine<'a>>,
{
    let mut builder = TreeBuilder::with_config(config);
    for line in lines {
        builder.apply(line)?;
    }
    builder.finish()
}

/// Configurable front end running the classifier and the tree builder
pub struct VyattaParser<'a> {
    input: &'a str,
    lexer_config: LexerConfig,
    config: ParserConfig,
}

impl<'a> VyattaParser<'a> {
    /// Creates a parser with default configuration
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            lexer_config: LexerConfig::default(),
            config: ParserConfig::default(),
        }
    }

    /// Sets the line classifier configuration
    pub fn with_lexer_config(mut self, config: LexerConfig) -> Self {
        self.lexer_config = config;
        self
    }

    /// Sets the tree builder configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses the whole input. Any error aborts the parse.
    pub fn parse(self) -> Result<ConfigBlock, ParseError> {
        debug!("parsing {} bytes", self.input.len());

        let mut classifier = LineClassifier::with_config(self.input, self.lexer_config);
        let mut builder = TreeBuilder::with_config(self.config);
        for line in &mut classifier {
            builder.apply(line?)?;
        }
        let root = builder.finish()?;

        debug!(
            "parsed {} lines into {} top-level keys",
            classifier.lines_read(),
            root.len()
        );
        Ok(root)
    }
}
