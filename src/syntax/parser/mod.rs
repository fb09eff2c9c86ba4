//! Recursive-descent parser producing a lossless CST.
//!
//! Every production returns [`PResult`]. On success the node covers exactly
//! the tokens it consumed. On failure the innermost production synthesizes an
//! Error node that swallows the rest of the line, and each caller folds the
//! children it already holds plus that node into an Incomplete node of its own
//! kind ([`Builder::add`]). The statement list appends whatever comes back and
//! carries on with the next line.

mod commands;
mod devices;
mod expressions;
mod spectre;

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::cst::{
    Element, ErrorInfo, ErrorReason, Expected, Leaf, Node, NodeKind, StrictRule, SyntaxKind,
    Trivia,
};
use super::keywords::Keyword;
use super::lexer::Lexer;
use super::token::TokenKind;
use crate::dialect::{DialectConfig, Language};

/// A fault travelling up the call chain: the Error node, or an Incomplete
/// node that already wraps it.
#[derive(Debug)]
pub(crate) struct Fault(pub(crate) Node);

/// Return type of every production.
pub(crate) type PResult = Result<Node, Fault>;

impl From<Node> for Element {
    fn from(node: Node) -> Self {
        Element::Node(node)
    }
}

impl From<Leaf> for Element {
    fn from(leaf: Leaf) -> Self {
        Element::Token(leaf)
    }
}

/// Children of a production under construction.
pub(crate) struct Builder {
    kind: SyntaxKind,
    children: Vec<Element>,
}

impl Builder {
    pub(crate) fn new(kind: SyntaxKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub(crate) fn token(&mut self, leaf: Leaf) {
        self.children.push(Element::Token(leaf));
    }

    pub(crate) fn node(&mut self, node: Node) {
        self.children.push(Element::Node(node));
    }

    /// Append a sub-result; on failure, fold everything so far into an
    /// Incomplete node of this production.
    pub(crate) fn add<T: Into<Element>>(&mut self, result: Result<T, Fault>) -> Result<(), Fault> {
        match result {
            Ok(child) => {
                self.children.push(child.into());
                Ok(())
            }
            Err(fault) => Err(self.fault(fault)),
        }
    }

    /// Wrap `fault` and the children collected so far into an Incomplete node.
    pub(crate) fn fault(&mut self, Fault(node): Fault) -> Fault {
        let at = node.offset();
        self.children.push(Element::Node(node));
        let children = std::mem::take(&mut self.children);
        Fault(Node::build(NodeKind::Incomplete(self.kind), children, at))
    }

    /// Change the production once lookahead has decided it.
    pub(crate) fn retag(&mut self, kind: SyntaxKind) {
        self.kind = kind;
    }
}

/// Where the statement-list loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListState {
    ExpectStatement,
    InStatement,
    AtTerminator,
    Done,
}

/// Parser for one source buffer.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    source: &'a str,
    config: &'a DialectConfig,
    /// Lookahead leaves; never more than two
    buffer: VecDeque<Leaf>,
    language: Language,
    pending_language: Option<Language>,
    errored: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser reading `source` with `config`.
    pub fn new(source: &'a str, config: &'a DialectConfig) -> Self {
        Self::with_lexer(Lexer::new(source, config), source, config)
    }

    /// Create a parser for a standalone expression.
    pub fn for_expression(source: &'a str, config: &'a DialectConfig) -> Self {
        Self::with_lexer(Lexer::for_expression(source, config), source, config)
    }

    fn with_lexer(lexer: Lexer<'a>, source: &'a str, config: &'a DialectConfig) -> Self {
        Self {
            language: lexer.language(),
            lexer,
            source,
            config,
            buffer: VecDeque::with_capacity(2),
            pending_language: None,
            errored: false,
        }
    }

    /// Parse a whole file. Returns the root and whether any Error node was created.
    pub fn parse_file(mut self) -> (Node, bool) {
        let mut root = Builder::new(SyntaxKind::SourceFile);
        if let Err(Fault(node)) = self.statement_list(&mut root, &[]) {
            root.node(node);
        }
        let eof = self.take();
        root.token(eof);
        (self.finish(root), self.errored)
    }

    /// Parse a single expression filling the whole input.
    pub fn parse_expression(mut self) -> (Node, bool) {
        let mut root = Builder::new(SyntaxKind::SourceFile);
        match self.expression() {
            Ok(node) | Err(Fault(node)) => root.node(node),
        }
        while !self.at(TokenKind::Eof) {
            let Fault(node) = self.error(&[Expected::Token(TokenKind::Eof)]);
            root.node(node);
        }
        let eof = self.take();
        root.token(eof);
        (self.finish(root), self.errored)
    }

    // ============ Token primitives ============

    fn fill(&mut self, n: usize) {
        debug_assert!(n < 2, "lookahead is limited to two tokens");
        while self.buffer.len() <= n {
            let mut trivia = Vec::new();
            let mut start = None;
            let token = loop {
                let token = self.lexer.next_token();
                start.get_or_insert(token.start);
                if !token.is_trivia() {
                    break token;
                }
                trivia.push(Trivia {
                    kind: token.kind,
                    width: token.len(),
                });
            };
            let offset = start.unwrap_or(token.start);
            self.buffer
                .push_back(Leaf::new(token.kind, offset, trivia, token.len()));
        }
    }

    /// Kind of the `n`th significant token ahead (0 or 1).
    pub(crate) fn peek_kind(&mut self, n: usize) -> TokenKind {
        self.fill(n);
        self.buffer.get(n).map_or(TokenKind::Eof, Leaf::kind)
    }

    /// Text of the `n`th token ahead, without trivia.
    pub(crate) fn peek_text(&mut self, n: usize) -> &'a str {
        self.fill(n);
        let source = self.source;
        self.buffer.get(n).map_or("", |leaf| {
            let end = (leaf.offset() + leaf.full_width()) as usize;
            &source[end - leaf.width() as usize..end]
        })
    }

    /// True if the `n`th token ahead is preceded by trivia.
    pub(crate) fn peek_spaced(&mut self, n: usize) -> bool {
        self.fill(n);
        self.buffer.get(n).is_some_and(Leaf::has_leading_trivia)
    }

    pub(crate) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek_kind(0) == kind
    }

    pub(crate) fn at_keyword(&mut self, keyword: Keyword) -> bool {
        self.peek_kind(0) == TokenKind::Keyword(keyword)
    }

    pub(crate) fn at_name(&mut self) -> bool {
        self.peek_kind(0).is_name()
    }

    pub(crate) fn at_line_end(&mut self) -> bool {
        self.peek_kind(0).is_line_end()
    }

    /// `name =` ahead.
    pub(crate) fn at_assignment(&mut self) -> bool {
        self.at_name() && self.peek_kind(1) == TokenKind::Equals
    }

    /// Offset where the next leaf (including its trivia) starts.
    pub(crate) fn position(&mut self) -> u32 {
        self.fill(0);
        self.buffer.front().map_or(self.lexer.position(), Leaf::offset)
    }

    /// Consume the next token.
    pub(crate) fn take(&mut self) -> Leaf {
        self.fill(0);
        let leaf = match self.buffer.pop_front() {
            Some(leaf) => leaf,
            None => {
                let end = self.lexer.position();
                Leaf::new(TokenKind::Eof, end, Vec::new(), 0)
            }
        };
        if leaf.kind() == TokenKind::Newline {
            self.apply_pending_language();
        }
        leaf
    }

    /// Consume the next token if it has the given kind.
    pub(crate) fn accept(&mut self, kind: TokenKind) -> Option<Leaf> {
        self.at(kind).then(|| self.take())
    }

    /// Consume a token of the given kind or fail.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Leaf, Fault> {
        if self.at(kind) {
            Ok(self.take())
        } else {
            Err(self.error(&[Expected::Token(kind)]))
        }
    }

    /// Consume a name-like token (identifier or keyword) or fail.
    pub(crate) fn expect_name(&mut self, what: &'static str) -> Result<Leaf, Fault> {
        if self.at_name() {
            Ok(self.take())
        } else {
            Err(self.error(&[Expected::Production(what)]))
        }
    }

    /// Finish a production.
    pub(crate) fn finish(&mut self, builder: Builder) -> Node {
        let at = self.position();
        Node::build(NodeKind::Syntax(builder.kind), builder.children, at)
    }

    /// A node made of the given leaves.
    pub(crate) fn leaves(&mut self, kind: SyntaxKind, leaves: Vec<Leaf>) -> Node {
        let mut builder = Builder::new(kind);
        for leaf in leaves {
            builder.token(leaf);
        }
        self.finish(builder)
    }

    // ============ Errors ============

    /// Unexpected-token fault at the current position.
    pub(crate) fn error(&mut self, expected: &[Expected]) -> Fault {
        self.error_with(ErrorReason::UnexpectedToken, expected)
    }

    /// Strict-mode fault at the current position.
    pub(crate) fn violation(&mut self, rule: StrictRule) -> Fault {
        self.error_with(ErrorReason::StrictModeViolation(rule), &[])
    }

    /// Build an Error node holding the rest of the line, end of line included.
    fn error_with(&mut self, reason: ErrorReason, expected: &[Expected]) -> Fault {
        self.errored = true;
        let found = self.peek_kind(0);
        let at = self.position();
        debug!(at, %found, ?reason, "syntax error");
        let mut children = Vec::new();
        loop {
            match self.peek_kind(0) {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    children.push(Element::Token(self.take()));
                    break;
                }
                _ => children.push(Element::Token(self.take())),
            }
        }
        let info = ErrorInfo {
            reason,
            found,
            expected: expected.to_vec(),
        };
        Fault(Node::build(NodeKind::Error(Box::new(info)), children, at))
    }

    /// Consume the statement terminator.
    pub(crate) fn end_statement(&mut self, builder: &mut Builder) -> Result<(), Fault> {
        match self.peek_kind(0) {
            TokenKind::Newline => {
                let newline = self.take();
                builder.token(newline);
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(builder.fault(self.error(&[Expected::Token(TokenKind::Newline)]))),
        }
    }

    // ============ Language switching ============

    /// Read the following lines with `language` once this line ends.
    pub(crate) fn switch_language(&mut self, language: Language) {
        self.pending_language = Some(language);
    }

    fn apply_pending_language(&mut self) {
        let Some(language) = self.pending_language.take() else {
            return;
        };
        debug!(from = %self.language, to = %language, "language switch");
        self.language = language;
        self.lexer.set_language(language);
        if let Some(next) = self.buffer.front() {
            let at = next.offset();
            self.buffer.clear();
            self.lexer.rewind(at);
        }
    }

    pub(crate) fn language(&self) -> Language {
        self.language
    }

    pub(crate) fn config(&self) -> &'a DialectConfig {
        self.config
    }

    // ============ Statements ============

    /// Is the next line a terminator from `terminators`?
    fn at_terminator(&mut self, terminators: &[Keyword]) -> bool {
        if terminators.is_empty() {
            return false;
        }
        let keyword = match self.language {
            Language::Spice => {
                if self.at(TokenKind::Dot) {
                    self.peek_kind(1).keyword()
                } else {
                    None
                }
            }
            Language::Spectre => self.peek_kind(0).keyword(),
        };
        keyword.is_some_and(|k| terminators.contains(&k))
    }

    /// Parse statements into `builder` until one of `terminators` starts a
    /// line. The terminator itself is left for the caller. With no
    /// terminators the list runs to end of input.
    pub(crate) fn statement_list(
        &mut self,
        builder: &mut Builder,
        terminators: &[Keyword],
    ) -> Result<(), Fault> {
        let mut state = ListState::ExpectStatement;
        loop {
            state = match state {
                ListState::ExpectStatement if self.at(TokenKind::Eof) => {
                    if terminators.is_empty() {
                        ListState::Done
                    } else {
                        let expected: Vec<_> = terminators
                            .iter()
                            .map(|&k| Expected::Token(TokenKind::Keyword(k)))
                            .collect();
                        return Err(builder.fault(self.error(&expected)));
                    }
                }
                ListState::ExpectStatement if self.at_terminator(terminators) => {
                    ListState::AtTerminator
                }
                ListState::ExpectStatement => ListState::InStatement,
                ListState::InStatement => {
                    let node = match self.statement() {
                        Ok(node) | Err(Fault(node)) => node,
                    };
                    trace!(kind = ?node.kind(), "statement");
                    builder.node(node);
                    ListState::ExpectStatement
                }
                ListState::AtTerminator => ListState::Done,
                ListState::Done => return Ok(()),
            };
        }
    }

    /// A body of statements closed by one of `terminators`.
    pub(crate) fn body(&mut self, terminators: &[Keyword]) -> PResult {
        let mut list = Builder::new(SyntaxKind::StatementList);
        self.statement_list(&mut list, terminators)?;
        Ok(self.finish(list))
    }

    fn statement(&mut self) -> PResult {
        match self.language {
            Language::Spice => self.spice_statement(),
            Language::Spectre => self.spectre_statement(),
        }
    }

    fn spice_statement(&mut self) -> PResult {
        match self.peek_kind(0) {
            TokenKind::Dot => self.dot_command(),
            TokenKind::Instance(kind) => self.device(kind),
            TokenKind::Keyword(Keyword::Simulator) => self.language_switch(),
            TokenKind::TitleText => self.title_line(),
            _ => Err(self.error(&[Expected::Production("statement")])),
        }
    }

    /// `simulator lang=spectre` (valid in both grammars).
    pub(crate) fn language_switch(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::LanguageSwitch);
        b.token(self.take());
        while !self.at_line_end() {
            if self.at_assignment() && self.peek_text(0).eq_ignore_ascii_case("lang") {
                b.add(self.lang_param())?;
            } else {
                b.add(self.tail_item())?;
            }
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    fn lang_param(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Param);
        let name = self.take();
        b.token(name);
        let equals = self.take();
        b.token(equals);
        let language = match self.peek_text(0) {
            text if text.eq_ignore_ascii_case("spectre") => Some(Language::Spectre),
            text if text.eq_ignore_ascii_case("spice") => Some(Language::Spice),
            _ => None,
        };
        match language {
            Some(language) if self.at_name() => {
                let value = self.take();
                let value = self.leaves(SyntaxKind::Name, vec![value]);
                b.node(value);
                self.switch_language(language);
            }
            _ => {
                return Err(b.fault(self.error(&[Expected::Production("`spice` or `spectre`")])))
            }
        }
        Ok(self.finish(b))
    }

    /// First-line title under `title_line`.
    fn title_line(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Title);
        b.token(self.take());
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn parse(input: &str) -> (Node, bool) {
        let config = DialectConfig::default();
        Parser::new(input, &config).parse_file()
    }

    #[test]
    fn test_builder_folds_fault_into_incomplete() {
        let config = DialectConfig::default();
        let mut parser = Parser::new("R1 a", &config);
        let mut b = Builder::new(SyntaxKind::Resistor);
        b.token(parser.take());
        let fault = parser.expect(TokenKind::Equals);
        let Err(Fault(node)) = b.add(fault) else {
            panic!("expected a fault");
        };
        assert_eq!(node.kind(), &NodeKind::Incomplete(SyntaxKind::Resistor));
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.full_width(), 4);
    }

    #[test]
    fn test_error_stops_at_line_end() {
        let (root, errored) = parse("R1 a b 1k\n= = =\nC1 a 0 1p\n");
        assert!(errored);
        let statements: Vec<_> = root
            .children()
            .iter()
            .filter_map(|e| match e {
                Element::Node(n) => Some(n.kind().clone()),
                Element::Token(_) => None,
            })
            .collect();
        assert_eq!(statements.len(), 3);
        assert!(matches!(statements[1], NodeKind::Error(_)));
        assert_eq!(statements[2], NodeKind::Syntax(SyntaxKind::Capacitor));
    }

    #[test]
    fn test_root_covers_source() {
        let source = "* header\n\nR1 a b 1k\n* trailing\n";
        let (root, errored) = parse(source);
        assert!(!errored);
        assert_eq!(root.full_width() as usize, source.len());
    }

    #[test]
    fn test_lookahead_sees_two_tokens() {
        let config = DialectConfig::for_dialect(Dialect::Ngspice);
        let mut parser = Parser::new(".ends foo", &config);
        assert_eq!(parser.peek_kind(0), TokenKind::Dot);
        assert_eq!(parser.peek_kind(1), TokenKind::Keyword(Keyword::Ends));
        assert_eq!(parser.peek_text(1), "ends");
    }

    #[test]
    fn test_language_switch_rewinds_lexer() {
        let config = DialectConfig::default();
        let source = "simulator lang=spectre\nr1 (a b) resistor r=1k\n";
        let (root, errored) = Parser::new(source, &config).parse_file();
        assert!(!errored);
        let kinds: Vec<_> = root
            .children()
            .iter()
            .filter_map(|e| match e {
                Element::Node(n) => Some(n.kind().clone()),
                Element::Token(_) => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Syntax(SyntaxKind::LanguageSwitch),
                NodeKind::Syntax(SyntaxKind::SpectreInstance),
            ]
        );
    }
}
