//! # nestconf core
//!
//! A recursive-descent parser for nginx-style configuration: directives,
//! nested brace-delimited blocks, quoted strings with escapes and
//! multi-token values.
//!
//! ## Quick Start
//!
//! ```rust
//! use nestconf_core::Parser;
//!
//! let input = "server { listen 80; server_name example.com; }";
//! let mut parser = Parser::new();
//! let config = parser.parse(input).unwrap();
//!
//! let listen = config.get_path(["server", "listen"]).unwrap();
//! assert_eq!(listen.first().and_then(|v| v.as_str()), Some("80"));
//! ```
//!
//! ## Repeated Directives
//!
//! A name seen once holds a single value; repeating it at the same level
//! collects every occurrence in order. Several tokens on one line are
//! joined with a space instead.
//!
//! ```rust
//! let config = nestconf_core::parse("a 1; a 2; d foo bar;");
//! assert_eq!(config.get("a").unwrap().len(), 2);
//! assert_eq!(config.get("d").unwrap().first().unwrap().as_str(), Some("foo bar"));
//! ```
//!
//! ## Error Recovery
//!
//! Malformed input never aborts the parse in the default lenient mode:
//!
//! ```rust
//! use nestconf_core::Parser;
//!
//! let input = "server { root \"/var/www";
//! let mut parser = Parser::new();
//! let result = parser.parse_with_recovery(input);
//!
//! // Tree is still built, errors are collected
//! println!("Directives: {}, Errors: {}", result.config.len(), result.errors.len());
//! ```
//!
//! [`Parser::parse`] and [`parse_strict`] turn the same problems into
//! errors carrying the offending byte span.

pub mod cursor;
pub mod error;
pub mod parser;
pub mod span;
pub mod tree;

pub use error::{ParseError, ParseErrorKind, ParseErrors};
pub use parser::{parse, parse_strict, ParseResult, Parser, DEFAULT_MAX_DEPTH};
pub use tree::{ConfigEntry, ConfigNode, ConfigValue, CowStr, Stats};
