//! Lexer, parser and concrete syntax tree for SPICE-family and Spectre netlists.
//!
//! The tree is lossless: every byte of the input, trivia and malformed lines
//! included, belongs to exactly one leaf, so printing the full text of the
//! root's children reproduces the file.
//!
//! # Grammar Overview (SPICE)
//!
//! ```text
//! file        = { statement } EOF
//! statement   = title | dot_command | device | "simulator" "lang" "=" name NL
//! dot_command = "." keyword { item } NL [ body terminator ]
//! device      = INSTANCE { node } [ model ] { item } NL
//! item        = name "=" expression | name | atom | "params:"
//! expression  = binary [ "?" expression ":" expression ]
//! atom        = { "+" | "-" | "!" | "~" } primary
//! primary     = NUMBER | STRING | name [ "(" args ")" ]
//!             | "{" expression "}" | "'" expression "'" | "(" expression ")"
//!             | "[" elements "]" | FOREIGN
//! ```
//!
//! # Statement Kinds
//!
//! | Form | Node | Closed by |
//! |------|------|-----------|
//! | `.subckt name ports` | `Subckt` | `.ends [name]` |
//! | `.lib name` | `LibSection` | `.endl [name]` |
//! | `.lib path name` | `LibInclude` | |
//! | `.if (cond)` | `IfBlock` | `.endif` |
//! | `.data name` | `DataBlock` | `.enddata` |
//! | `.control` | `ControlBlock` | `.endc` |
//! | `.model name type` | `Model` | |
//! | `Rname n+ n- value` | `Resistor` | |
//! | `subckt name (ports)` | `SpectreSubckt` | `ends [name]` |
//!
//! # Example
//!
//! ```
//! use netlist_cst::dialect::{Dialect, DialectConfig};
//! use netlist_cst::syntax::{self, SyntaxKind};
//!
//! let config = DialectConfig::for_dialect(Dialect::Ngspice);
//! let tree = syntax::parse(".model nmos nmos level=14\nR1 a b 1k\n", &config);
//! assert!(!tree.had_errors());
//! let kinds: Vec<_> = tree.statements().filter_map(|s| s.production()).collect();
//! assert_eq!(kinds, vec![SyntaxKind::Model, SyntaxKind::Resistor]);
//! ```

pub mod ast;
pub mod chars;
pub mod cst;
pub mod keywords;
pub mod lexer;
mod parser;
pub mod token;

pub use cst::{
    ErrorInfo, ErrorReason, Expected, NodeKind, StrictRule, SyntaxElement, SyntaxKind,
    SyntaxNode, SyntaxToken, SyntaxTree,
};
pub use keywords::Keyword;
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::dialect::{DialectConfig, Language};
use crate::error::{NetlistError, Result};

/// Parse a netlist, starting in the language `config` names.
#[instrument(skip_all, fields(dialect = %config.dialect, len = source.len()))]
pub fn parse<'src>(source: &'src str, config: &DialectConfig) -> SyntaxTree<'src> {
    let (root, had_errors) = Parser::new(source, config).parse_file();
    debug!(had_errors, "parsed netlist");
    SyntaxTree::new(root, source, had_errors)
}

/// Parse a netlist that starts in Spectre, whatever `config` says.
pub fn parse_spectre<'src>(source: &'src str, config: &DialectConfig) -> SyntaxTree<'src> {
    let config = config.clone().with_language(Language::Spectre);
    parse(source, &config)
}

/// Parse `source` as one expression. Trailing tokens become Error nodes.
#[instrument(skip_all, fields(dialect = %config.dialect))]
pub fn parse_expression<'src>(source: &'src str, config: &DialectConfig) -> SyntaxTree<'src> {
    let (root, had_errors) = Parser::for_expression(source, config).parse_expression();
    SyntaxTree::new(root, source, had_errors)
}

/// The raw token stream, trivia included, ending with the `Eof` token.
///
/// The lexer alone does not follow `simulator lang=` switches; the whole
/// stream uses the configured start language.
pub fn tokenize(source: &str, config: &DialectConfig) -> Vec<Token> {
    let mut lexer = Lexer::new(source, config);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        tokens.push(token);
        if token.kind == TokenKind::Eof {
            return tokens;
        }
    }
}

/// A netlist loaded from disk.
#[derive(Debug, Clone)]
pub struct SourceText {
    path: PathBuf,
    text: String,
}

impl SourceText {
    /// Read a UTF-8 netlist. Spans are 32-bit, so files over 4 GiB are refused.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| NetlistError::file_read(&display, e))?;
        if u32::try_from(bytes.len()).is_err() {
            return Err(NetlistError::SourceTooLarge {
                path: display,
                len: bytes.len(),
            });
        }
        let text = String::from_utf8(bytes).map_err(|e| NetlistError::InvalidEncoding {
            path: display,
            offset: e.utf8_error().valid_up_to(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Wrap text that did not come from a file.
    pub fn from_string(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Parse this text with `config`.
    pub fn parse(&self, config: &DialectConfig) -> SyntaxTree<'_> {
        parse(&self.text, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn test_tokenize_ends_with_eof() {
        let tokens = tokenize("R1 a b 1k\n", &DialectConfig::default());
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        let rebuilt: String = tokens
            .iter()
            .map(|t| &"R1 a b 1k\n"[t.span()])
            .collect();
        assert_eq!(rebuilt, "R1 a b 1k\n");
    }

    #[test]
    fn test_tokenize_empty() {
        let tokens = tokenize("", &DialectConfig::default());
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_empty());
    }

    #[test]
    fn test_parse_empty_source() {
        let tree = parse("", &DialectConfig::default());
        assert!(!tree.had_errors());
        assert_eq!(tree.statements().count(), 0);
        assert_eq!(tree.root().full_text(), "");
    }

    #[test]
    fn test_read_missing_file() {
        let err = SourceText::read("/nonexistent/netlist.cir").unwrap_err();
        assert!(matches!(err, NetlistError::FileReadError { .. }));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let path = std::env::temp_dir().join(format!("netlist_cst_bad_{}.cir", std::process::id()));
        std::fs::write(&path, b"R1 a b \xff\n").unwrap();
        let err = SourceText::read(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, NetlistError::InvalidEncoding { offset: 7, .. }));
    }

    #[test]
    fn test_source_text_parse() {
        let source = SourceText::from_string("inline.sp", "V1 in 0 DC 1\n");
        let tree = source.parse(&DialectConfig::for_dialect(Dialect::Ngspice));
        assert!(!tree.had_errors(), "{}", tree.dump());
        assert_eq!(source.path(), Path::new("inline.sp"));
    }
}
