//! # Netlist CST
//!
//! A lossless front end for SPICE-family and Spectre circuit netlists.
//!
//! This library provides:
//! - A context-sensitive lexer driven by a per-dialect configuration
//! - A recursive-descent parser producing a concrete syntax tree that keeps
//!   every byte of the input, trivia and malformed lines included
//! - Line-level error recovery, so one bad line never hides the rest of a file
//! - Diagnostics with line/column positions and rendered source excerpts
//!
//! ## Architecture
//!
//! - [`dialect`] - Dialect presets: prefix tables, keyword sets, lexing switches
//! - [`syntax`] - Lexer, parser, CST and typed views
//! - [`diagnostics`] - Error extraction and rendering
//! - [`error`] - Errors around a parse (I/O, configuration)
//!
//! ## Usage
//!
//! ```bash
//! netlist-cst --dialect hspice --tree amp.sp
//! ```
//!
//! ```
//! use netlist_cst::{parse, Dialect, DialectConfig};
//!
//! let config = DialectConfig::for_dialect(Dialect::Hspice);
//! let source = "* amplifier\nR1 in out 10k\n.end\n";
//! let tree = parse(source, &config);
//! let rebuilt: String = tree.root().children().map(|c| c.full_text()).collect();
//! assert_eq!(rebuilt, source);
//! ```
//!
//! ## Dialects
//!
//! Instance prefixes, keyword sets and some lexical rules differ between
//! simulators. `S1 a b c d sw1` is a voltage-controlled switch to ngspice but
//! an S-parameter block to HSPICE. A single [`DialectConfig`] value feeds both
//! lexer and parser, and `simulator lang=spectre` switches grammars mid-file.

pub mod dialect;
pub mod diagnostics;
pub mod error;
pub mod syntax;

pub use dialect::{Dialect, DialectConfig, Language};
pub use diagnostics::SyntaxDiagnostic;
pub use error::{NetlistError, Result};
pub use syntax::{parse, parse_expression, parse_spectre, tokenize, SourceText, SyntaxTree};
