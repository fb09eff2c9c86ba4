//! Tokens produced by the lexer.

use std::fmt;
use std::ops::Range;

use super::keywords::Keyword;
use crate::dialect::DeviceKind;

/// A token: a kind and the byte range it covers.
///
/// Tokens carry no text; slice the source with [`Token::span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Byte offset of the first byte
    pub start: u32,
    /// Byte offset one past the last byte
    pub end: u32,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self { kind, start, end }
    }

    /// Whitespace, comments and continuations.
    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Byte range for slicing the source.
    pub fn span(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// True for the zero-width end marker.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Trivia ===
    /// Spaces and tabs
    Whitespace,
    /// A newline that does not end a statement (blank line or continued line)
    LineBreak,
    /// `* ...` at line start, inline `$`/`;` comments, Spectre `//`
    Comment,
    /// Leading `+` of a continuation line, or Spectre `\` before a newline
    Continuation,

    // === Structure ===
    /// Newline ending a statement
    Newline,
    /// End of input
    Eof,

    // === Words ===
    /// A name or identifier
    Identifier,
    /// A reserved word
    Keyword(Keyword),
    /// Instance name whose prefix selected a device kind
    Instance(DeviceKind),
    /// Numeric literal, including suffix
    Number,
    /// Double-quoted string
    String,
    /// Unquoted include path
    Path,
    /// Free text of a title line
    TitleText,
    /// Backtick-delimited foreign-language span
    Foreign,

    // === Punctuation ===
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;` when it is not a comment
    Semicolon,
    /// `?`
    Question,
    /// `=`
    Equals,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `'`
    Prime,

    // === Operators ===
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    Power,
    /// `^`
    Caret,
    /// `&`
    Amp,
    /// `&&`
    AmpAmp,
    /// `|`
    Pipe,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,

    /// A character no rule accepts
    Unknown,
}

impl TokenKind {
    /// Trivia has no grammatical meaning and is attached to the next token.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineBreak | Self::Comment | Self::Continuation
        )
    }

    /// Newline or end of input.
    pub fn is_line_end(self) -> bool {
        matches!(self, Self::Newline | Self::Eof)
    }

    /// Tokens usable as a node, model or parameter name.
    pub fn is_name(self) -> bool {
        matches!(self, Self::Identifier | Self::Keyword(_))
    }

    /// The keyword, if this is one.
    pub fn keyword(self) -> Option<Keyword> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Whitespace => "whitespace",
            Self::LineBreak => "line break",
            Self::Comment => "comment",
            Self::Continuation => "continuation",
            Self::Newline => "end of line",
            Self::Eof => "end-of-input",
            Self::Identifier => "identifier",
            Self::Keyword(k) => return write!(f, "{k}"),
            Self::Instance(_) => "instance name",
            Self::Number => "number",
            Self::String => "string",
            Self::Path => "path",
            Self::TitleText => "title text",
            Self::Foreign => "foreign expression",
            Self::Dot => "`.`",
            Self::Comma => "`,`",
            Self::Colon => "`:`",
            Self::Semicolon => "`;`",
            Self::Question => "`?`",
            Self::Equals => "`=`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Prime => "`'`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Power => "`**`",
            Self::Caret => "`^`",
            Self::Amp => "`&`",
            Self::AmpAmp => "`&&`",
            Self::Pipe => "`|`",
            Self::PipePipe => "`||`",
            Self::Bang => "`!`",
            Self::Tilde => "`~`",
            Self::EqEq => "`==`",
            Self::BangEq => "`!=`",
            Self::Lt => "`<`",
            Self::LtEq => "`<=`",
            Self::Gt => "`>`",
            Self::GtEq => "`>=`",
            Self::Shl => "`<<`",
            Self::Shr => "`>>`",
            Self::Unknown => "unrecognized character",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_classification() {
        assert!(TokenKind::Comment.is_trivia());
        assert!(TokenKind::LineBreak.is_trivia());
        assert!(!TokenKind::Newline.is_trivia());
        assert!(!TokenKind::Unknown.is_trivia());
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::Eof.to_string(), "end-of-input");
        assert_eq!(TokenKind::Keyword(Keyword::Ends).to_string(), "ENDS");
    }
}
