//! Device instance lines.
//!
//! | Prefix | Production | Shape |
//! |--------|------------|-------|
//! | R C L | passive | `name n+ n- [value] {param}` |
//! | K | mutual inductor | `name L1 L2 {Ln} value` |
//! | D Q M J Z S X | model-bearing | `name node* model {arg}` |
//! | V I | source | `name n+ n- [DC v] [AC m [p]] [fn(...)]` |
//! | E G | voltage controlled | `name n+ n- (POLY(n) ... \| VALUE=expr \| TABLE expr=pairs \| nc+ nc- gain)` |
//! | F H | current controlled | `name n+ n- (POLY(n) ... \| vsource gain)` |
//! | B | behavioral | `name n+ n- {param}` |
//! | W | current switch | `name n+ n- vsource model {arg}` |
//! | T | transmission line | `name a+ a- b+ b- {param}` |
//! | S (HSPICE), others | generic | `name node* {param}` |

use tracing::trace;

use super::{Builder, Fault, PResult, Parser};
use crate::dialect::DeviceKind;
use crate::syntax::cst::{Expected, Leaf, Node, StrictRule, SyntaxKind};
use crate::syntax::keywords::Keyword;
use crate::syntax::token::TokenKind;

/// A name or number collected before it is known to be a node or the model.
struct Group {
    leaves: Vec<Leaf>,
    is_name: bool,
}

impl Parser<'_> {
    pub(crate) fn device(&mut self, kind: DeviceKind) -> PResult {
        let mut b = Builder::new(kind.syntax_kind());
        let name = self.take();
        trace!(?kind, name = self.text_of(&name), "device");
        b.token(name);
        match kind {
            DeviceKind::Resistor | DeviceKind::Capacitor | DeviceKind::Inductor => {
                self.passive_tail(&mut b)?
            }
            DeviceKind::MutualInductor => self.coupling_tail(&mut b)?,
            DeviceKind::Diode => self.model_tail(&mut b, 2)?,
            DeviceKind::Bjt | DeviceKind::Mosfet | DeviceKind::Jfet | DeviceKind::Mesfet => {
                self.model_tail(&mut b, 3)?
            }
            DeviceKind::Switch => self.model_tail(&mut b, 4)?,
            DeviceKind::SubcktCall => self.model_tail(&mut b, 0)?,
            DeviceKind::VoltageSource | DeviceKind::CurrentSource => self.source_tail(&mut b)?,
            DeviceKind::Vcvs | DeviceKind::Vccs => self.voltage_controlled_tail(&mut b)?,
            DeviceKind::Cccs | DeviceKind::Ccvs => self.current_controlled_tail(&mut b)?,
            DeviceKind::BehavioralSource => {
                self.pins(&mut b, 2)?;
                self.items(&mut b)?;
            }
            DeviceKind::CurrentSwitch => self.current_switch_tail(&mut b)?,
            DeviceKind::TransmissionLine => {
                self.pins(&mut b, 4)?;
                self.items(&mut b)?;
            }
            DeviceKind::SParameter | DeviceKind::Generic => {
                while (self.at_name() || self.at(TokenKind::Number)) && !self.at_assignment() {
                    let node = self.dotted(SyntaxKind::NodeRef);
                    b.node(node);
                }
                self.items(&mut b)?;
            }
        }
        self.end_statement(&mut b)?;
        Ok(self.finish(b))
    }

    fn text_of(&self, leaf: &Leaf) -> &str {
        let end = (leaf.offset() + leaf.full_width()) as usize;
        &self.source[end - leaf.width() as usize..end]
    }

    /// A node reference (`out`, `0`, `x1.n3`).
    pub(crate) fn node_ref(&mut self) -> PResult {
        if self.at_name() || self.at(TokenKind::Number) {
            Ok(self.dotted(SyntaxKind::NodeRef))
        } else {
            Err(self.error(&[Expected::Production("node name")]))
        }
    }

    fn pins(&mut self, b: &mut Builder, count: usize) -> Result<(), Fault> {
        for _ in 0..count {
            b.add(self.node_ref())?;
        }
        Ok(())
    }

    /// Another instance named in this one (`Vsense`, `L1`).
    fn device_ref(&mut self) -> PResult {
        if self.at_name() {
            Ok(self.dotted(SyntaxKind::DeviceRef))
        } else {
            Err(self.error(&[Expected::Production("device name")]))
        }
    }

    fn passive_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        self.pins(b, 2)?;
        if self.at_line_end() && self.config().strict {
            return Err(b.fault(self.violation(StrictRule::MissingValue)));
        }
        if !self.at_line_end() && !self.at_assignment() && self.at_atom_start() {
            let mut value = Builder::new(SyntaxKind::Argument);
            if let Err(fault) = value.add(self.atom()) {
                return Err(b.fault(fault));
            }
            let value = self.finish(value);
            b.node(value);
        }
        self.items(b)
    }

    fn coupling_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        b.add(self.device_ref())?;
        b.add(self.device_ref())?;
        while self.at_name() && !self.at_assignment() && self.peek_kind(1) != TokenKind::Newline {
            b.add(self.device_ref())?;
        }
        self.items(b)
    }

    /// Nodes followed by a model name. The model is the last name at or
    /// after `min_nodes`; everything before it is a node.
    fn model_tail(&mut self, b: &mut Builder, min_nodes: usize) -> Result<(), Fault> {
        let mut groups = Vec::new();
        while (self.at_name() || self.at(TokenKind::Number))
            && !self.at_assignment()
            && !self.at_keyword(Keyword::On)
            && !self.at_keyword(Keyword::Off)
            && !(self.at_keyword(Keyword::Params) && self.peek_kind(1) == TokenKind::Colon)
        {
            let is_name = self.at_name();
            let leaves = self.dotted_leaves();
            groups.push(Group { leaves, is_name });
        }

        let model = groups
            .iter()
            .rposition(|g| g.is_name)
            .filter(|&index| index >= min_nodes);
        let model_at = model.unwrap_or(groups.len());
        for (index, group) in groups.into_iter().enumerate() {
            let node = if index < model_at {
                self.leaves(SyntaxKind::NodeRef, group.leaves)
            } else if index == model_at {
                self.leaves(SyntaxKind::ModelRef, group.leaves)
            } else {
                self.trailing_group(group)
            };
            b.node(node);
        }

        if model.is_none() {
            if b.kind == SyntaxKind::SubcktCall {
                return Err(b.fault(self.error(&[Expected::Production("subcircuit name")])));
            }
            if self.config().strict {
                return Err(b.fault(self.violation(StrictRule::MissingModel)));
            }
        }
        self.items(b)
    }

    /// A name or number after the model: a flag or a positional argument.
    fn trailing_group(&mut self, group: Group) -> Node {
        let (outer, inner) = if group.is_name {
            (SyntaxKind::Flag, SyntaxKind::Name)
        } else {
            (SyntaxKind::Argument, SyntaxKind::Literal)
        };
        let inner = self.leaves(inner, group.leaves);
        let mut b = Builder::new(outer);
        b.node(inner);
        self.finish(b)
    }

    fn source_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        self.pins(b, 2)?;
        while !self.at_line_end() {
            let assignment = self.peek_kind(1) == TokenKind::Equals;
            match self.peek_kind(0) {
                TokenKind::Keyword(Keyword::Dc) if !assignment => b.add(self.dc_spec())?,
                TokenKind::Keyword(Keyword::Ac) if !assignment => b.add(self.ac_spec())?,
                TokenKind::Keyword(k) if k.is_transient_function() && !assignment => {
                    b.add(self.transient_function())?
                }
                _ => b.add(self.tail_item())?,
            }
        }
        Ok(())
    }

    /// Is the next token a plain value rather than the next keyword clause?
    fn at_value(&mut self) -> bool {
        self.at_atom_start() && !matches!(self.peek_kind(0), TokenKind::Keyword(_))
    }

    fn dc_spec(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::DcSpec);
        b.token(self.take());
        if self.at_value() {
            b.add(self.atom())?;
        }
        Ok(self.finish(b))
    }

    fn ac_spec(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::AcSpec);
        b.token(self.take());
        for _ in 0..2 {
            if !self.at_value() || self.at_assignment() {
                break;
            }
            b.add(self.atom())?;
        }
        Ok(self.finish(b))
    }

    /// `PULSE(v1 v2 td tr tf pw per)` or the same arguments without parentheses.
    fn transient_function(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::TransientFunction);
        b.token(self.take());
        if self.at(TokenKind::LParen) {
            b.add(self.arg_list())?;
        } else {
            while self.at_value() && !self.at_assignment() {
                b.add(self.atom())?;
            }
        }
        Ok(self.finish(b))
    }

    /// E and G elements.
    fn voltage_controlled_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        self.pins(b, 2)?;
        match self.peek_kind(0) {
            TokenKind::Keyword(Keyword::Poly) => b.add(self.poly_spec())?,
            TokenKind::Keyword(Keyword::Value) => b.add(self.value_spec())?,
            TokenKind::Keyword(Keyword::Table) => b.add(self.table_spec())?,
            _ if self.at_assignment() => {}
            _ => self.pins(b, 2)?,
        }
        self.items(b)
    }

    /// F and H elements.
    fn current_controlled_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        self.pins(b, 2)?;
        if self.at_keyword(Keyword::Poly) {
            b.add(self.poly_spec())?;
        } else if !self.at_assignment() {
            b.add(self.device_ref())?;
        }
        self.items(b)
    }

    fn current_switch_tail(&mut self, b: &mut Builder) -> Result<(), Fault> {
        self.pins(b, 2)?;
        b.add(self.device_ref())?;
        if self.at_name() && !self.at_assignment() {
            let model = self.dotted(SyntaxKind::ModelRef);
            b.node(model);
        } else if self.config().strict {
            return Err(b.fault(self.violation(StrictRule::MissingModel)));
        }
        self.items(b)
    }

    /// `POLY(n)`; the controlling nodes and coefficients follow as items.
    fn poly_spec(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::PolySpec);
        b.token(self.take());
        b.add(self.arg_list())?;
        Ok(self.finish(b))
    }

    /// `VALUE = {expr}` (the `=` is optional).
    fn value_spec(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ValueSpec);
        b.token(self.take());
        if let Some(equals) = self.accept(TokenKind::Equals) {
            b.token(equals);
        }
        b.add(self.expression())?;
        Ok(self.finish(b))
    }

    /// `TABLE {expr} = (x1, y1) (x2, y2) ...`
    fn table_spec(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::TableSpec);
        b.token(self.take());
        b.add(self.atom())?;
        if let Some(equals) = self.accept(TokenKind::Equals) {
            b.token(equals);
        }
        while self.at(TokenKind::LParen) {
            b.add(self.arg_list())?;
        }
        Ok(self.finish(b))
    }
}
