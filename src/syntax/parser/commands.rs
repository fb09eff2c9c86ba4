//! Dot-commands.
//!
//! Compound commands parse a header line, a body of statements, and a
//! terminator line. The body stops at a line starting with `.` followed by a
//! terminator keyword, which takes two tokens of lookahead.

use super::{Builder, Fault, PResult, Parser};
use crate::syntax::cst::{Expected, Leaf, Node, StrictRule, SyntaxKind};
use crate::syntax::keywords::Keyword;
use crate::syntax::token::TokenKind;

/// Keywords that only close a block.
const TERMINATORS: &[Keyword] = &[
    Keyword::Ends,
    Keyword::Endl,
    Keyword::Elseif,
    Keyword::Else,
    Keyword::Endif,
    Keyword::Enddata,
    Keyword::Endc,
];

impl Parser<'_> {
    pub(crate) fn dot_command(&mut self) -> PResult {
        let keyword = match self.peek_kind(1) {
            TokenKind::Keyword(keyword) => keyword,
            _ => return self.command(),
        };
        match keyword {
            Keyword::Model => self.model(),
            Keyword::Subckt => self.subckt(),
            Keyword::Include | Keyword::Inc => self.include(),
            Keyword::Lib => self.lib(),
            Keyword::Param | Keyword::Params => self.simple(SyntaxKind::ParamDecl),
            Keyword::Func => self.func_decl(),
            Keyword::Meas | Keyword::Measure => self.simple(SyntaxKind::Measure),
            k if k.is_analysis() => self.simple(SyntaxKind::Analysis),
            Keyword::Option | Keyword::Options | Keyword::Opt => self.simple(SyntaxKind::Options),
            Keyword::Temp => self.simple(SyntaxKind::Temp),
            Keyword::Global => self.global(),
            Keyword::Ic | Keyword::Nodeset => self.simple(SyntaxKind::InitialCondition),
            Keyword::Print | Keyword::Plot | Keyword::Probe | Keyword::Save => {
                self.simple(SyntaxKind::Output)
            }
            Keyword::If => self.if_block(),
            Keyword::Data => self.data_block(),
            Keyword::Control => self.control_block(),
            Keyword::Title => self.title(),
            Keyword::End => self.simple(SyntaxKind::End),
            k if TERMINATORS.contains(&k) => {
                let dot = self.take();
                let mut b = Builder::new(SyntaxKind::Command);
                b.token(dot);
                Err(b.fault(self.error(&[Expected::Production("statement")])))
            }
            _ => self.command(),
        }
    }

    /// `.keyword item*`
    fn simple(&mut self, kind: SyntaxKind) -> PResult {
        let mut b = Builder::new(kind);
        b.token(self.take());
        b.token(self.take());
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `.title text`
    fn title(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Title);
        b.token(self.take());
        b.token(self.take());
        if let Some(text) = self.accept(TokenKind::TitleText) {
            b.token(text);
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// Any other dot-command.
    fn command(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Command);
        b.token(self.take());
        if self.config().strict {
            return Err(b.fault(self.violation(StrictRule::UnknownCommand)));
        }
        b.add(self.expect_name("command name"))?;
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `.model name type [(params)] [params]`
    fn model(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Model);
        b.token(self.take());
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
        if self.at(TokenKind::LParen) {
            b.add(self.param_list())?;
        }
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    fn param_list(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ParamList);
        b.token(self.take());
        while !self.at(TokenKind::RParen) && !self.at_line_end() {
            if let Some(comma) = self.accept(TokenKind::Comma) {
                b.token(comma);
                continue;
            }
            b.add(self.tail_item())?;
        }
        b.add(self.expect(TokenKind::RParen))?;
        Ok(self.finish(b))
    }

    /// `.subckt name ports [params: ...]`, body, `.ends [name]`
    fn subckt(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Subckt);
        b.token(self.take());
        b.token(self.take());
        let name = self.peek_text(0);
        b.add(self.expect_name("subcircuit name"))?;
        let ports = self.ports();
        b.node(ports);
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        b.add(self.body(&[Keyword::Ends]))?;
        b.add(self.ends_line(name))?;
        Ok(self.finish(b))
    }

    /// Port names up to the first parameter.
    pub(crate) fn ports(&mut self) -> Node {
        let mut b = Builder::new(SyntaxKind::NodeList);
        while (self.at_name() || self.at(TokenKind::Number))
            && !self.at_assignment()
            && !(self.at_keyword(Keyword::Params) && self.peek_kind(1) == TokenKind::Colon)
        {
            let port = self.dotted(SyntaxKind::NodeRef);
            b.node(port);
        }
        self.finish(b)
    }

    /// The closing line of a subcircuit, `.ends` or `ends` depending on the
    /// grammar in effect when it is reached. Under strict mode its optional
    /// name must match the one that opened it.
    pub(crate) fn ends_line(&mut self, opened: &str) -> PResult {
        let dot = self.accept(TokenKind::Dot);
        let kind = if dot.is_some() {
            SyntaxKind::Ends
        } else {
            SyntaxKind::SpectreEnds
        };
        let mut b = Builder::new(kind);
        if let Some(dot) = dot {
            b.token(dot);
        }
        b.add(self.expect(TokenKind::Keyword(Keyword::Ends)))?;
        if self.at_name() {
            let closing = self.peek_text(0);
            let case_sensitive = self.config().case_sensitive_in(self.language());
            let matches = if case_sensitive {
                closing == opened
            } else {
                closing.eq_ignore_ascii_case(opened)
            };
            if !matches && self.config().strict {
                return Err(b.fault(self.violation(StrictRule::EndsNameMismatch)));
            }
            b.token(self.take());
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `.keyword [item*]` closing a block.
    fn end_line(&mut self, kind: SyntaxKind) -> PResult {
        let mut b = Builder::new(kind);
        b.token(self.take());
        b.token(self.take());
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `.include path`
    fn include(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Include);
        b.token(self.take());
        b.token(self.take());
        b.add(self.path())?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    pub(crate) fn path(&mut self) -> Result<Leaf, Fault> {
        match self.peek_kind(0) {
            TokenKind::Path | TokenKind::String => Ok(self.take()),
            _ => Err(self.error(&[
                Expected::Token(TokenKind::Path),
                Expected::Token(TokenKind::String),
            ])),
        }
    }

    /// `.lib path section` includes a section of a library file;
    /// `.lib section` opens a section closed by `.endl`.
    fn lib(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::LibInclude);
        b.token(self.take());
        b.token(self.take());
        b.add(self.path())?;
        if self.at_name() {
            b.token(self.take());
            self.end_statement(&mut b)?;
            return Ok(self.finish(b));
        }
        b.retag(SyntaxKind::LibSection);
        self.end_statement(&mut b)?;
        b.add(self.body(&[Keyword::Endl]))?;
        b.add(self.end_line(SyntaxKind::EndLib))?;
        Ok(self.finish(b))
    }

    /// `.func name(args) [=] body`
    fn func_decl(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::FuncDecl);
        b.token(self.take());
        b.token(self.take());
        b.add(self.expect_name("function name"))?;
        b.add(self.func_params())?;
        if let Some(equals) = self.accept(TokenKind::Equals) {
            b.token(equals);
        }
        b.add(self.expression())?;
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    fn func_params(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::FuncParams);
        b.add(self.expect(TokenKind::LParen))?;
        while self.at_name() {
            b.token(self.take());
            if let Some(comma) = self.accept(TokenKind::Comma) {
                b.token(comma);
            }
        }
        b.add(self.expect(TokenKind::RParen))?;
        Ok(self.finish(b))
    }

    /// `.global node*`
    fn global(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::Global);
        b.token(self.take());
        b.token(self.take());
        while !self.at_line_end() {
            b.add(self.node_ref())?;
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    /// `.if (cond)` ... `[.elseif (cond)` ...`]* [.else` ...`] .endif`
    fn if_block(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::IfBlock);
        b.add(self.if_branch(SyntaxKind::IfBranch))?;
        loop {
            match self.peek_kind(1) {
                TokenKind::Keyword(Keyword::Elseif) => {
                    b.add(self.if_branch(SyntaxKind::ElseIfBranch))?
                }
                TokenKind::Keyword(Keyword::Else) => b.add(self.else_branch())?,
                _ => break,
            }
        }
        b.add(self.end_line(SyntaxKind::EndIf))?;
        Ok(self.finish(b))
    }

    fn if_branch(&mut self, kind: SyntaxKind) -> PResult {
        let mut b = Builder::new(kind);
        b.token(self.take());
        b.token(self.take());
        b.add(self.expression())?;
        self.end_statement(&mut b)?;
        b.add(self.body(&[Keyword::Elseif, Keyword::Else, Keyword::Endif]))?;
        Ok(self.finish(b))
    }

    fn else_branch(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ElseBranch);
        b.token(self.take());
        b.token(self.take());
        self.end_statement(&mut b)?;
        b.add(self.body(&[Keyword::Endif]))?;
        Ok(self.finish(b))
    }

    /// Is the next line `.keyword`?
    fn at_dot_keyword(&mut self, keyword: Keyword) -> bool {
        self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Keyword(keyword)
    }

    /// `.data name col*`, rows of values, `.enddata`
    fn data_block(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::DataBlock);
        b.token(self.take());
        b.token(self.take());
        self.items(&mut b)?;
        self.end_statement(&mut b)?;
        while !self.at_dot_keyword(Keyword::Enddata) {
            if self.at(TokenKind::Eof) {
                let expected = [Expected::Token(TokenKind::Keyword(Keyword::Enddata))];
                return Err(b.fault(self.error(&expected)));
            }
            b.add(self.data_row())?;
        }
        b.add(self.end_line(SyntaxKind::EndData))?;
        Ok(self.finish(b))
    }

    fn data_row(&mut self) -> PResult {
        let mut row = Builder::new(SyntaxKind::DataRow);
        self.items(&mut row)?;
        self.end_statement(&mut row)?;
        Ok(self.finish(row))
    }

    /// `.control`, script lines kept verbatim, `.endc`
    fn control_block(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ControlBlock);
        b.token(self.take());
        b.token(self.take());
        self.end_statement(&mut b)?;
        while !self.at_dot_keyword(Keyword::Endc) {
            if self.at(TokenKind::Eof) {
                let expected = [Expected::Token(TokenKind::Keyword(Keyword::Endc))];
                return Err(b.fault(self.error(&expected)));
            }
            let mut line = Builder::new(SyntaxKind::RawLine);
            while !self.at_line_end() {
                line.token(self.take());
            }
            if let Err(fault) = self.end_statement(&mut line) {
                return Err(b.fault(fault));
            }
            let line = self.finish(line);
            b.node(line);
        }
        b.add(self.end_line(SyntaxKind::EndControl))?;
        Ok(self.finish(b))
    }
}

#[cfg(test)]
mod tests {
    use crate::dialect::{Dialect, DialectConfig};
    use crate::syntax::cst::{NodeKind, SyntaxKind};
    use crate::syntax::parse;

    fn kinds(input: &str, config: &DialectConfig) -> Vec<NodeKind> {
        let tree = parse(input, config);
        tree.statements().map(|s| s.kind().clone()).collect()
    }

    #[test]
    fn test_model_with_param_list() {
        let config = DialectConfig::default();
        let tree = parse(".model D1 D (is=1e-14, n=1.05)\n", &config);
        assert!(!tree.had_errors());
        let model = tree.statements().next().unwrap();
        assert!(model.is(SyntaxKind::Model));
        let list = model.first_child(SyntaxKind::ParamList).unwrap();
        assert_eq!(list.child_nodes().count(), 2);
    }

    #[test]
    fn test_subckt_body_and_ends() {
        let config = DialectConfig::default();
        let source = ".subckt amp in out params: gain=2\nR1 in out 1k\n.ends amp\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let subckt = tree.statements().next().unwrap();
        assert!(subckt.is(SyntaxKind::Subckt));
        let body = subckt.first_child(SyntaxKind::StatementList).unwrap();
        assert_eq!(body.child_nodes().count(), 1);
        assert!(subckt.first_child(SyntaxKind::Ends).is_some());
    }

    #[test]
    fn test_missing_ends() {
        let config = DialectConfig::default();
        let tree = parse(".subckt foo a b\nR1 a b 1k\n", &config);
        assert!(tree.had_errors());
        let subckt = tree.statements().next().unwrap();
        assert_eq!(subckt.kind(), &NodeKind::Incomplete(SyntaxKind::Subckt));
        let error = subckt.descendants().find_map(|n| n.error()).unwrap();
        assert_eq!(error.message(), "expected ENDS, found end-of-input");
    }

    #[test]
    fn test_ends_name_mismatch_is_strict_only() {
        let source = ".subckt foo a\n.ends bar\n";
        assert!(!parse(source, &DialectConfig::default()).had_errors());
        assert!(parse(source, &DialectConfig::default().strict(true)).had_errors());
    }

    #[test]
    fn test_ends_follows_language_in_body() {
        let config = DialectConfig::default();
        let source = ".subckt inv in out\nsimulator lang=spectre\nends inv\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let subckt = tree.statements().next().unwrap();
        assert!(subckt.is(SyntaxKind::Subckt));
        assert!(subckt.first_child(SyntaxKind::Ends).is_none());
        let ends = subckt.first_child(SyntaxKind::SpectreEnds).unwrap();
        assert_eq!(ends.text(), "ends inv");
        assert_eq!(tree.root().full_text(), source);
    }

    #[test]
    fn test_unknown_command() {
        let source = ".frobnicate 1 2\n";
        assert_eq!(
            kinds(source, &DialectConfig::default()),
            vec![NodeKind::Syntax(SyntaxKind::Command)]
        );
        assert!(parse(source, &DialectConfig::default().strict(true)).had_errors());
    }

    #[test]
    fn test_lib_forms() {
        let config = DialectConfig::default();
        assert_eq!(
            kinds(".lib models.lib tt\n", &config),
            vec![NodeKind::Syntax(SyntaxKind::LibInclude)]
        );
        assert_eq!(
            kinds(".lib tt\n.model n1 nmos\n.endl tt\n", &config),
            vec![NodeKind::Syntax(SyntaxKind::LibSection)]
        );
    }

    #[test]
    fn test_if_block() {
        let config = DialectConfig::default();
        let source = ".if (a == 1)\nR1 a b 1\n.elseif (a == 2)\nR1 a b 2\n.else\nR1 a b 3\n.endif\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let block = tree.statements().next().unwrap();
        let branches: Vec<_> = block.child_nodes().filter_map(|n| n.production()).collect();
        assert_eq!(
            branches,
            vec![
                SyntaxKind::IfBranch,
                SyntaxKind::ElseIfBranch,
                SyntaxKind::ElseBranch,
                SyntaxKind::EndIf,
            ]
        );
    }

    #[test]
    fn test_control_block_is_raw() {
        let config = DialectConfig::for_dialect(Dialect::Ngspice);
        let source = ".control\nrun\nplot v(out)\n.endc\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let block = tree.statements().next().unwrap();
        let raw = block
            .child_nodes()
            .filter(|n| n.is(SyntaxKind::RawLine))
            .count();
        assert_eq!(raw, 2);
    }

    #[test]
    fn test_data_block() {
        let config = DialectConfig::for_dialect(Dialect::Hspice);
        let source = ".data sweep w l\n1u 2u\n3u 4u\n.enddata\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let rows = tree
            .statements()
            .next()
            .unwrap()
            .child_nodes()
            .filter(|n| n.is(SyntaxKind::DataRow))
            .count();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_stray_terminator() {
        let config = DialectConfig::default();
        let tree = parse(".ends\n", &config);
        assert!(tree.had_errors());
    }

    #[test]
    fn test_analyses_and_outputs() {
        let config = DialectConfig::default();
        let source = ".tran 1n 10u\n.ac dec 10 1 1meg\n.print tran v(out)\n.option reltol=1e-4\n.ic v(a)=0\n.func f(x,y) {x*y}\n.param a=1 b={a*2}\n.global vdd gnd\n.temp 27\n.end\n";
        let tree = parse(source, &config);
        assert!(!tree.had_errors(), "{}", tree.dump());
        let kinds: Vec<_> = tree.statements().filter_map(|s| s.production()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Analysis,
                SyntaxKind::Analysis,
                SyntaxKind::Output,
                SyntaxKind::Options,
                SyntaxKind::InitialCondition,
                SyntaxKind::FuncDecl,
                SyntaxKind::ParamDecl,
                SyntaxKind::Global,
                SyntaxKind::Temp,
                SyntaxKind::End,
            ]
        );
    }
}
