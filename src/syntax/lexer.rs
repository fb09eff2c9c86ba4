//! Context-sensitive lexer for SPICE and Spectre netlists.
//!
//! The same characters read differently depending on where they appear:
//! `V+` is a node name on a device line but an operator inside `{V+1}`, and
//! `10k-ohm` is one token on a device line but three inside an expression.
//! All of that context lives in [`Lexer`] itself, so two lexers never share
//! state and the lexer never fails: anything it cannot classify becomes
//! [`TokenKind::Unknown`].

use super::chars::{
    ends_path, is_base_specifier, is_based_digit, is_blank, is_identifier_char,
    is_identifier_start, is_instance_char, is_name_char,
};
use super::keywords::{Keyword, KEYWORDS};
use super::token::{Token, TokenKind};
use crate::dialect::{DialectConfig, Language};

/// An open delimiter on the expression-nesting stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// `(`
    Paren,
    /// `{`
    Brace,
    /// `'`
    Prime,
    /// `[`
    Bracket,
    /// The value after an unparenthesized `=`; `filled` once it produced a token
    Implicit { filled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawMode {
    Title,
    Path,
}

#[derive(Debug, Clone)]
struct LexState {
    /// No token yet on this physical line
    line_start: bool,
    /// The current statement produced a significant token
    statement_started: bool,
    /// A newline was continued and the `+` has not been seen yet
    continuing: bool,
    /// The statement began with a device instance name
    instance_line: bool,
    nesting: Vec<Nesting>,
    raw: Option<RawMode>,
    title_pending: bool,
    language: Language,
    last: TokenKind,
}

impl LexState {
    fn new(config: &DialectConfig) -> Self {
        Self {
            line_start: true,
            statement_started: false,
            continuing: false,
            instance_line: false,
            nesting: Vec::new(),
            raw: None,
            title_pending: config.title_line,
            language: config.language,
            last: TokenKind::Newline,
        }
    }

    fn reset_statement(&mut self) {
        self.line_start = true;
        self.statement_started = false;
        self.continuing = false;
        self.instance_line = false;
        self.nesting.clear();
        self.raw = None;
        self.last = TokenKind::Newline;
    }
}

/// Lexer for one source buffer.
pub struct Lexer<'a> {
    source: &'a str,
    config: &'a DialectConfig,
    pos: usize,
    state: LexState,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    ///
    /// Offsets are `u32`; sources must be smaller than 4 GiB.
    pub fn new(source: &'a str, config: &'a DialectConfig) -> Self {
        Self {
            source,
            config,
            pos: 0,
            state: LexState::new(config),
        }
    }

    /// A lexer that reads its whole input as the inside of an expression.
    pub fn for_expression(source: &'a str, config: &'a DialectConfig) -> Self {
        let mut lexer = Self::new(source, config);
        lexer.state.title_pending = false;
        lexer.state.line_start = false;
        lexer.state.statement_started = true;
        lexer.state.nesting.push(Nesting::Paren);
        lexer
    }

    /// Grammar currently being lexed.
    pub fn language(&self) -> Language {
        self.state.language
    }

    /// Switch grammar; takes effect from the next token.
    pub fn set_language(&mut self, language: Language) {
        self.state.language = language;
    }

    /// Byte offset of the next token.
    pub fn position(&self) -> u32 {
        self.pos as u32
    }

    /// Depth of the expression-nesting stack.
    pub fn nesting_depth(&self) -> usize {
        self.state.nesting.len()
    }

    /// Restart lexing at `pos`, which must be the start of a statement.
    pub fn rewind(&mut self, pos: u32) {
        self.pos = pos as usize;
        self.state.reset_statement();
        self.state.title_pending = false;
    }

    /// Get the next token. Returns [`TokenKind::Eof`] forever once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        let start = self.pos;
        let Some(ch) = self.peek() else {
            let end = self.source.len() as u32;
            return Token::new(TokenKind::Eof, end, end);
        };
        let kind = self.scan(ch);
        debug_assert!(self.pos > start, "lexer made no progress at {start}");
        if !kind.is_trivia() {
            self.note_significant(kind);
        }
        Token::new(kind, start as u32, self.pos as u32)
    }

    fn scan(&mut self, ch: char) -> TokenKind {
        if self.state.title_pending {
            self.state.title_pending = false;
            if !self.at_newline() {
                self.eat_to_line_end();
                return TokenKind::TitleText;
            }
        }

        if self.at_newline() {
            return self.newline();
        }
        if is_blank(ch) || ch == '\r' {
            self.eat_blanks();
            self.end_implicit();
            return TokenKind::Whitespace;
        }
        if let Some(kind) = self.trivia(ch) {
            return kind;
        }

        if let Some(raw) = self.state.raw.take() {
            return self.raw_text(raw, ch);
        }

        if !self.state.statement_started && self.state.language == Language::Spice {
            if let Some(kind) = self.statement_head(ch) {
                return kind;
            }
        }

        if ch.is_ascii_digit()
            || (ch == '.' && self.state.statement_started && self.peek_is_digit(1))
        {
            return self.number();
        }
        if is_identifier_start(ch) {
            return self.word();
        }
        self.punctuation(ch)
    }

    /// Comments and continuation markers.
    fn trivia(&mut self, ch: char) -> Option<TokenKind> {
        let spice = self.state.language == Language::Spice;
        if self.state.line_start && ch == '*' {
            self.eat_to_line_end();
            return Some(TokenKind::Comment);
        }
        if spice && self.state.line_start && self.state.continuing && ch == '+' {
            self.bump();
            self.state.continuing = false;
            self.state.line_start = false;
            return Some(TokenKind::Continuation);
        }
        if spice && self.config.inline_comments.contains(ch) {
            self.eat_to_line_end();
            return Some(TokenKind::Comment);
        }
        if !spice && ch == '/' && self.peek_at(1) == Some('/') {
            self.eat_to_line_end();
            return Some(TokenKind::Comment);
        }
        if !spice && ch == '\\' && self.newline_at(1).is_some() {
            let width = self.newline_at(1).unwrap_or(1);
            self.pos += 1 + width;
            self.state.line_start = true;
            self.end_implicit();
            return Some(TokenKind::Continuation);
        }
        None
    }

    /// First token of a SPICE statement: instance names and `simulator`.
    fn statement_head(&mut self, ch: char) -> Option<TokenKind> {
        if !is_identifier_start(ch) {
            return None;
        }
        let word_len = self.source[self.pos..]
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(self.source.len() - self.pos);
        let word = &self.source[self.pos..self.pos + word_len];
        let case_sensitive = self.config.case_sensitive_in(Language::Spice);
        if KEYWORDS.lookup(word, case_sensitive) == Some(Keyword::Simulator)
            && self.config.keyword_enabled(Keyword::Simulator, Language::Spice)
        {
            self.pos += word_len;
            return Some(TokenKind::Keyword(Keyword::Simulator));
        }
        let device = self.config.prefixes.lookup(ch)?;
        self.bump();
        self.eat_while(is_instance_char);
        self.state.instance_line = true;
        Some(TokenKind::Instance(device))
    }

    fn raw_text(&mut self, raw: RawMode, ch: char) -> TokenKind {
        match raw {
            RawMode::Title => {
                self.eat_to_line_end();
                TokenKind::TitleText
            }
            RawMode::Path => match ch {
                '"' | '\'' => self.quoted(ch, TokenKind::String),
                _ => {
                    self.eat_while(|c| !ends_path(c));
                    TokenKind::Path
                }
            },
        }
    }

    fn number(&mut self) -> TokenKind {
        if self.peek() == Some('.') {
            self.bump();
            self.eat_while(|c| c.is_ascii_digit());
        } else {
            self.eat_while(|c| c.is_ascii_digit());
            if self.peek() == Some('.') {
                let next = self.peek_at(1);
                let fraction = match next {
                    Some(c) => c.is_ascii_digit() || !(is_name_char(c) || c == '.'),
                    None => true,
                };
                if fraction {
                    self.bump();
                    self.eat_while(|c| c.is_ascii_digit());
                }
            }
        }

        if self.config.based_literals
            && self.peek() == Some('\'')
            && self.peek_at(1).is_some_and(is_base_specifier)
            && self.peek_at(2).is_some_and(is_based_digit)
        {
            self.bump();
            self.bump();
            self.eat_while(is_based_digit);
            return TokenKind::Number;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_is_digit(digit_at) {
                self.pos += digit_at;
                self.eat_while(|c| c.is_ascii_digit());
            }
        }

        let alphabet = self.name_alphabet();
        self.eat_while(alphabet);
        TokenKind::Number
    }

    fn word(&mut self) -> TokenKind {
        let alphabet = self.name_alphabet();
        let case_sensitive = self.config.case_sensitive_in(self.state.language);
        let mut cursor = KEYWORDS.cursor();
        while let Some(c) = self.peek() {
            if !alphabet(c) {
                break;
            }
            cursor.step(c, case_sensitive);
            self.bump();
        }

        if !self.state.nesting.is_empty() {
            return TokenKind::Identifier;
        }
        match cursor.keyword() {
            Some(keyword) if self.config.keyword_enabled(keyword, self.state.language) => {
                self.after_keyword(keyword);
                TokenKind::Keyword(keyword)
            }
            _ => TokenKind::Identifier,
        }
    }

    fn after_keyword(&mut self, keyword: Keyword) {
        let command = match self.state.language {
            Language::Spice => self.state.last == TokenKind::Dot,
            Language::Spectre => !self.state.statement_started,
        };
        if !command {
            return;
        }
        self.state.raw = match keyword {
            Keyword::Title if self.state.language == Language::Spice => Some(RawMode::Title),
            Keyword::Include | Keyword::Inc | Keyword::Lib | Keyword::AhdlInclude => {
                Some(RawMode::Path)
            }
            _ => None,
        };
    }

    fn punctuation(&mut self, ch: char) -> TokenKind {
        let next = self.peek_at(1);
        let (kind, width) = match ch {
            '(' => (TokenKind::LParen, 1),
            ')' => (TokenKind::RParen, 1),
            '{' => (TokenKind::LBrace, 1),
            '}' => (TokenKind::RBrace, 1),
            '[' => (TokenKind::LBracket, 1),
            ']' => (TokenKind::RBracket, 1),
            '\'' => (TokenKind::Prime, 1),
            '=' if next == Some('=') => (TokenKind::EqEq, 2),
            '=' => (TokenKind::Equals, 1),
            '!' if next == Some('=') => (TokenKind::BangEq, 2),
            '!' => (TokenKind::Bang, 1),
            '<' if next == Some('=') => (TokenKind::LtEq, 2),
            '<' if next == Some('<') => (TokenKind::Shl, 2),
            '<' => (TokenKind::Lt, 1),
            '>' if next == Some('=') => (TokenKind::GtEq, 2),
            '>' if next == Some('>') => (TokenKind::Shr, 2),
            '>' => (TokenKind::Gt, 1),
            '&' if next == Some('&') => (TokenKind::AmpAmp, 2),
            '&' => (TokenKind::Amp, 1),
            '|' if next == Some('|') => (TokenKind::PipePipe, 2),
            '|' => (TokenKind::Pipe, 1),
            '*' if next == Some('*') => (TokenKind::Power, 2),
            '*' => (TokenKind::Star, 1),
            '/' => (TokenKind::Slash, 1),
            '^' => (TokenKind::Caret, 1),
            '~' => (TokenKind::Tilde, 1),
            '%' => (TokenKind::Percent, 1),
            '+' => (TokenKind::Plus, 1),
            '-' => (TokenKind::Minus, 1),
            '?' => (TokenKind::Question, 1),
            ':' => (TokenKind::Colon, 1),
            ',' => (TokenKind::Comma, 1),
            ';' => (TokenKind::Semicolon, 1),
            '.' => (TokenKind::Dot, 1),
            '"' => return self.quoted('"', TokenKind::String),
            '`' if self.config.foreign_escapes && self.state.language == Language::Spice => {
                return self.quoted('`', TokenKind::Foreign)
            }
            _ => {
                self.bump();
                return TokenKind::Unknown;
            }
        };
        self.pos += width;
        self.track_nesting(kind);
        kind
    }

    fn track_nesting(&mut self, kind: TokenKind) {
        let nesting = &mut self.state.nesting;
        match kind {
            TokenKind::LParen => nesting.push(Nesting::Paren),
            TokenKind::LBrace => nesting.push(Nesting::Brace),
            TokenKind::LBracket => nesting.push(Nesting::Bracket),
            TokenKind::RParen => Self::pop_to(nesting, Nesting::Paren),
            TokenKind::RBrace => Self::pop_to(nesting, Nesting::Brace),
            TokenKind::RBracket => Self::pop_to(nesting, Nesting::Bracket),
            TokenKind::Prime
                if self.config.prime_expressions && self.state.language == Language::Spice =>
            {
                if nesting.last() == Some(&Nesting::Prime) {
                    nesting.pop();
                } else {
                    nesting.push(Nesting::Prime);
                }
            }
            TokenKind::Equals if nesting.is_empty() => {
                nesting.push(Nesting::Implicit { filled: false })
            }
            _ => {}
        }
    }

    /// Pop up to and including the innermost `opener`; unmatched closers are ignored.
    fn pop_to(nesting: &mut Vec<Nesting>, opener: Nesting) {
        if let Some(index) = nesting.iter().rposition(|n| *n == opener) {
            nesting.truncate(index);
        }
    }

    /// A string-like span closed by `quote` on the same line.
    fn quoted(&mut self, quote: char, kind: TokenKind) -> TokenKind {
        self.bump();
        while let Some(c) = self.peek() {
            if c == '\n' || (c == '\r' && self.peek_at(1) == Some('\n')) {
                return TokenKind::Unknown;
            }
            self.bump();
            if c == quote {
                return kind;
            }
        }
        TokenKind::Unknown
    }

    fn newline(&mut self) -> TokenKind {
        let width = self.newline_at(0).unwrap_or(1);
        self.pos += width;
        self.state.line_start = true;
        if !self.state.statement_started {
            return TokenKind::LineBreak;
        }
        if self.continues_at(self.pos) {
            self.state.continuing = true;
            self.end_implicit();
            return TokenKind::LineBreak;
        }
        self.state.reset_statement();
        TokenKind::Newline
    }

    /// Does the statement continue on a later `+` line (skipping blank and comment lines)?
    fn continues_at(&self, mut i: usize) -> bool {
        if self.state.language != Language::Spice {
            return false;
        }
        let bytes = self.source.as_bytes();
        loop {
            while matches!(bytes.get(i), Some(b' ' | b'\t')) {
                i += 1;
            }
            match bytes.get(i) {
                Some(b'+') => return true,
                Some(b'*') => match self.source[i..].find('\n') {
                    Some(offset) => i += offset + 1,
                    None => return false,
                },
                Some(b'\n') => i += 1,
                Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => i += 2,
                _ => return false,
            }
        }
    }

    fn note_significant(&mut self, kind: TokenKind) {
        if kind == TokenKind::Newline {
            return;
        }
        self.state.statement_started = true;
        self.state.line_start = false;
        self.state.continuing = false;
        self.state.last = kind;
        if kind != TokenKind::Equals {
            if let Some(Nesting::Implicit { filled }) = self.state.nesting.first_mut() {
                *filled = true;
            }
        }
    }

    /// A separator ends an implicit expression once it has content.
    fn end_implicit(&mut self) {
        if self.state.nesting.last() == Some(&Nesting::Implicit { filled: true }) {
            self.state.nesting.pop();
        }
    }

    fn name_alphabet(&self) -> fn(char) -> bool {
        if !self.state.nesting.is_empty() {
            is_identifier_char
        } else if self.state.instance_line {
            is_instance_char
        } else {
            is_name_char
        }
    }

    // ============ Cursor helpers ============

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn peek_is_digit(&self, n: usize) -> bool {
        self.peek_at(n).is_some_and(|c| c.is_ascii_digit())
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat_blanks(&mut self) {
        while let Some(c) = self.peek() {
            let lone_cr = c == '\r' && self.peek_at(1) != Some('\n');
            if !(is_blank(c) || lone_cr) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat_to_line_end(&mut self) {
        while let Some(c) = self.peek() {
            if self.at_newline() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn at_newline(&self) -> bool {
        self.newline_at(0).is_some()
    }

    /// Byte width of a line terminator starting `n` characters ahead.
    fn newline_at(&self, n: usize) -> Option<usize> {
        let mut chars = self.source[self.pos..].chars().skip(n);
        match (chars.next(), chars.next()) {
            (Some('\n'), _) => Some(1),
            (Some('\r'), Some('\n')) => Some(2),
            _ => None,
        }
    }
}
