//! Spectre native statements.
//!
//! ```text
//! statement   = parameters | include | subckt | model | section | library
//!             | global | simulator | instance
//! subckt      = ["inline"] "subckt" name ( "(" port* ")" | port* ) NL body "ends" [name]
//! section     = "section" name NL body "endsection" [name]
//! library     = "library" name NL body "endlibrary" [name]
//! instance    = name [ "(" node* ")" ] master { param }
//! ```
//!
//! Terminators are single keywords, so one token of lookahead finds them.

use super::{Builder, PResult, Parser};
use crate::syntax::cst::{Expected, SyntaxKind};
use crate::syntax::keywords::Keyword;
use crate::syntax::token::TokenKind;

impl Parser<'_> {
    pub(crate) fn spectre_statement(&mut self) -> PResult {
        match self.peek_kind(0) {
            TokenKind::Keyword(Keyword::Simulator) => self.language_switch(),
            TokenKind::Keyword(Keyword::Parameters) => self.keyword_items(SyntaxKind::SpectreParameters),
            TokenKind::Keyword(Keyword::Include | Keyword::AhdlInclude) => self.spectre_include(),
            TokenKind::Keyword(Keyword::Inline | Keyword::Subckt) => self.spectre_subckt(),
            TokenKind::Keyword(Keyword::Model) => self.spectre_model(),
            TokenKind::Keyword(Keyword::Section) => self.spectre_block(
                SyntaxKind::SpectreSection,
                Keyword::Endsection,
                SyntaxKind::SpectreEndSection,
            ),
            TokenKind::Keyword(Keyword::Library) => self.spectre_block(
                SyntaxKind::SpectreLibrary,
                Keyword::Endlibrary,
                SyntaxKind::SpectreEndLibrary,
            ),
            TokenKind::Keyword(Keyword::Global) => self.spectre_global(),
            TokenKind::Keyword(Keyword::Ends | Keyword::Endsection | Keyword::Endlibrary) => {
                Err(self.error(&[Expected::Production("statement")]))
            }
            kind if kind.is_name() => self.spectre_instance(),
            _ => Err(self.error(&[Expected::Production("statement")])),
        }
    }

    /// `keyword item*`
    fn keyword_items(&mut self, kind: SyntaxKind) -> PResult {
        let mut b = Builder::new(kind);
        b.token(self.take());
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `include "file" [section=name]`
    fn spectre_include(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::SpectreInclude);
        b.token(self.take());
        b.add(self.path())?;
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    fn spectre_subckt(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::SpectreSubckt);
        if let Some(inline) = self.accept(TokenKind::Keyword(Keyword::Inline)) {
            b.token(inline);
        }
        b.add(self.expect(TokenKind::Keyword(Keyword::Subckt)))?;
        let name = self.peek_text(0);
        b.add(self.expect_name("subcircuit name"))?;
        if self.at(TokenKind::LParen) {
            b.add(self.node_list())?;
        } else {
            let ports = self.ports();
            b.node(ports);
        }
        self.end_statement(&mut b)?;
        b.add(self.body(&[Keyword::Ends]))?;
        b.add(self.ends_line(name))?;
        Ok(self.finish(b))
    }

    /// `( node* )`
    fn node_list(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::NodeList);
        b.add(self.expect(TokenKind::LParen))?;
        while !self.at(TokenKind::RParen) && !self.at_line_end() {
            b.add(self.node_ref())?;
        }
        b.add(self.expect(TokenKind::RParen))?;
        Ok(self.finish(b))
    }

    /// `model name type param*`
    fn spectre_model(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::SpectreModel);
        b.token(self.take());
        if !self.at_name() {
            return Err(b.fault(self.error(&[Expected::Production("model name")])));
        }
        let name = self.dotted(SyntaxKind::ModelRef);
        b.node(name);
        if !self.at_name() {
            return Err(b.fault(self.error(&[Expected::Production("model type")])));
        }
        let model_type = self.dotted(SyntaxKind::Name);
        b.node(model_type);
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `section name` ... `endsection [name]` and the `library` equivalent.
    fn spectre_block(&mut self, kind: SyntaxKind, terminator: Keyword, end: SyntaxKind) -> PResult {
        let mut b = Builder::new(kind);
        b.token(self.take());
        b.add(self.expect_name("name"))?;
        self.end_statement(&mut b)?;
        b.add(self.body(&[terminator]))?;

        let mut close = Builder::new(end);
        close.token(self.take());
        if self.at_name() {
            close.token(self.take());
        }
        if let Err(fault) = self.end_statement(&mut close) {
            return Err(b.fault(fault));
        }
        let close = self.finish(close);
        b.node(close);
        Ok(self.finish(b))
    }

    /// `global node*`
    fn spectre_global(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::SpectreGlobal);
        b.token(self.take());
        while !self.at_line_end() {
            b.add(self.node_ref())?;
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `name (nodes) master params`. Without parentheses the last bare name
    /// before the parameters is the master.
    fn spectre_instance(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::SpectreInstance);
        b.token(self.take());
        if self.at(TokenKind::LParen) {
            b.add(self.node_list())?;
            if !self.at_name() || self.at_assignment() {
                return Err(b.fault(self.error(&[Expected::Production("master name")])));
            }
            let master = self.dotted(SyntaxKind::ModelRef);
            b.node(master);
        } else {
            let mut groups = Vec::new();
            while (self.at_name() || self.at(TokenKind::Number)) && !self.at_assignment() {
                groups.push(self.dotted_leaves());
            }
            let Some(master) = groups.pop() else {
                return Err(b.fault(self.error(&[Expected::Production("master name")])));
            };
            if !groups.is_empty() {
                let mut nodes = Builder::new(SyntaxKind::NodeList);
                for group in groups {
                    let node = self.leaves(SyntaxKind::NodeRef, group);
                    nodes.node(node);
                }
                let nodes = self.finish(nodes);
                b.node(nodes);
            }
            let master = self.leaves(SyntaxKind::ModelRef, master);
            b.node(master);
        }
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }
}
