//! # Vyatta Conf Parser
//!
//! A parser for the hierarchical, brace-delimited configuration format used
//! by Vyatta, VyOS and EdgeOS network devices.
//!
//! ## Overview
//!
//! Parsing runs as a two-stage pipeline:
//!
//! 1. The [`lexer`] classifies each physical line as blank, comment,
//!    block open, block close or leaf assignment.
//! 2. The [`parser`] applies those lines to an explicit stack of open
//!    scopes and produces a nested [`ConfigBlock`].
//!
//! Values are kept as strings. A key assigned once is a
//! [`ConfigValue::Scalar`]; a key assigned repeatedly in the same block
//! becomes a [`ConfigValue::List`] in source order; a `{ ... }` scope is a
//! [`ConfigValue::Block`].
//!
//! ## Basic Usage
//!
//! ```rust
//! use vyatta_conf::{parse_conf, lookup, ConfigValue};
//!
//! let text = r#"
//! interfaces {
//!     ethernet eth0 {
//!         address 192.168.0.2/24
//!         address 192.168.1.2/24
//!         description "eth0-upstream #302.5-19a (temp path)"
//!     }
//! }
//! "#;
//!
//! let config = parse_conf(text)?;
//! let eth0 = lookup(&config, &["interfaces", "ethernet", "eth0"]).unwrap();
//!
//! assert_eq!(
//!     eth0.get("description").and_then(ConfigValue::as_str),
//!     Some("eth0-upstream #302.5-19a (temp path)")
//! );
//! assert_eq!(
//!     eth0.get("address").unwrap().values().collect::<Vec<_>>(),
//!     ["192.168.0.2/24", "192.168.1.2/24"]
//! );
//! # Ok::<(), vyatta_conf::ParseError>(())
//! ```
//!
//! ## Serde Integration
//!
//! ```rust
//! use serde::Deserialize;
//! use vyatta_conf::from_str;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "kebab-case")]
//! struct Ssh {
//!     port: u16,
//!     protocol_version: String,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Service {
//!     ssh: Ssh,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Config {
//!     service: Service,
//! }
//!
//! let config: Config = from_str("service {\n ssh {\n  port 22\n  protocol-version v2\n }\n}")?;
//! assert_eq!(config.service.ssh.port, 22);
//! # Ok::<(), vyatta_conf::VyattaError>(())
//! ```
//!
//! ## Error Handling
//!
//! Parsing is all-or-nothing. Every error carries the offending line:
//!
//! ```rust
//! use vyatta_conf::{parse_conf, ParseError, StructureError};
//!
//! let err = parse_conf("system {\n    host-name r1\n").unwrap_err();
//! assert_eq!(
//!     err,
//!     ParseError::Structure(StructureError::UnbalancedOpen { open: 1, line: 1 })
//! );
//!
//! // Render a snippet of the source around the error
//! let report = err.with_source_context("system {\n    host-name r1\n");
//! println!("{}", report);
//! ```

pub mod deserializer;
pub mod error;
pub mod lexer;
pub mod parser;


// Re-export main types and functions
pub use deserializer::{ValueDeserializer, from_block, from_str, from_value};
pub use error::{
    DeError, EnhancedError, ErrorContext, LexError, ParseError, Position, StructureError,
    VyattaError,
};
pub use lexer::{ClassifiedLine, LexerConfig, LineClassifier, SourceLine};
pub use parser::{
    ConfigBlock, ConfigList, ConfigValue, DuplicateKeyBehavior, ParserConfig, TreeBuilder,
    VyattaParser, build_tree, lookup,
};

/// Parses configuration text into its root block using default settings.
///
/// The call holds no state between invocations; independent documents may
/// be parsed concurrently from multiple threads.
pub fn parse_conf(text: &str) -> Result<ConfigBlock, ParseError> {
    VyattaParser::new(text).parse()
}
