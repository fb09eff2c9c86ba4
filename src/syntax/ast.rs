//! Typed views over CST nodes.
//!
//! Each view wraps a [`SyntaxNode`] of one production and exposes its parts
//! by role. Views read the tree; they never copy it. Accessors return `None`
//! when the part is absent, which is normal for Incomplete nodes.

use super::cst::{SyntaxKind, SyntaxNode};
use super::keywords::Keyword;
use super::token::TokenKind;

/// A typed wrapper around a node of known production.
pub trait AstNode<'a>: Sized {
    /// Wrap `node` if it has the right production (complete or not).
    fn cast(node: SyntaxNode<'a>) -> Option<Self>;

    fn syntax(&self) -> SyntaxNode<'a>;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident: $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a>(SyntaxNode<'a>);

        impl<'a> AstNode<'a> for $name<'a> {
            fn cast(node: SyntaxNode<'a>) -> Option<Self> {
                match node.production()? {
                    $(SyntaxKind::$kind)|+ => Some(Self(node)),
                    _ => None,
                }
            }

            fn syntax(&self) -> SyntaxNode<'a> {
                self.0
            }
        }
    };
}

ast_node!(
    /// `R`, `C` or `L` line.
    Passive: Resistor | Capacitor | Inductor
);
ast_node!(
    /// Any device instance line, SPICE or Spectre.
    Device: Resistor | Capacitor | Inductor | MutualInductor | Diode | Bjt | Mosfet | Jfet
        | Mesfet | Switch | CurrentSwitch | SubcktCall | VoltageSource | CurrentSource | Vcvs
        | Vccs | Cccs | Ccvs | BehavioralSource | TransmissionLine | SParameter | GenericDevice
        | SpectreInstance
);
ast_node!(
    /// `.model` or Spectre `model`.
    Model: Model | SpectreModel
);
ast_node!(
    /// `.subckt` or Spectre `subckt`.
    Subckt: Subckt | SpectreSubckt
);
ast_node!(
    /// `.include`, `.inc`, `.lib path name` or Spectre `include`.
    Include: Include | LibInclude | SpectreInclude
);
ast_node!(Param: Param);
ast_node!(BinaryExpression: BinaryExpression);

/// Parameter assignments among a node's direct children and its `ParamList`.
fn params<'a>(node: SyntaxNode<'a>) -> impl Iterator<Item = Param<'a>> + 'a {
    node.child_nodes()
        .flat_map(|child| {
            let nested = child.is(SyntaxKind::ParamList);
            let own = (!nested).then_some(child);
            own.into_iter().chain(
                nested
                    .then(|| child.child_nodes())
                    .into_iter()
                    .flatten(),
            )
        })
        .filter_map(Param::cast)
}

/// The instance name: the first token of the line.
fn leading_name<'a>(node: SyntaxNode<'a>) -> Option<&'a str> {
    node.tokens()
        .next()
        .filter(|t| t.kind().is_name() || matches!(t.kind(), TokenKind::Instance(_)))
        .map(|t| t.text())
}

impl<'a> Param<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.0.child_nodes().next().map(|n| n.text())
    }

    pub fn value(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_nodes().nth(1)
    }
}

impl<'a> Passive<'a> {
    pub fn name(&self) -> Option<&'a str> {
        leading_name(self.0)
    }

    pub fn positive(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_nodes().find(|n| n.is(SyntaxKind::NodeRef))
    }

    pub fn negative(&self) -> Option<SyntaxNode<'a>> {
        self.0
            .child_nodes()
            .filter(|n| n.is(SyntaxKind::NodeRef))
            .nth(1)
    }

    /// The positional value, else a `r=`/`c=`/`l=`/`value=` parameter.
    pub fn value(&self) -> Option<SyntaxNode<'a>> {
        if let Some(arg) = self.0.first_child(SyntaxKind::Argument) {
            return arg.child_nodes().next();
        }
        let wanted = match self.0.production()? {
            SyntaxKind::Resistor => "r",
            SyntaxKind::Capacitor => "c",
            _ => "l",
        };
        self.params()
            .find(|p| {
                p.name()
                    .is_some_and(|n| n.eq_ignore_ascii_case(wanted) || n.eq_ignore_ascii_case("value"))
            })
            .and_then(|p| p.value())
    }

    pub fn params(&self) -> impl Iterator<Item = Param<'a>> + 'a {
        params(self.0)
    }
}

impl<'a> Device<'a> {
    pub fn name(&self) -> Option<&'a str> {
        leading_name(self.0)
    }

    /// Connected nodes, whether listed directly or in parentheses.
    pub fn nodes(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.0.child_nodes().flat_map(|child| {
            let list = child.is(SyntaxKind::NodeList);
            let own = child.is(SyntaxKind::NodeRef).then_some(child);
            own.into_iter().chain(
                list.then(|| child.child_nodes().filter(|n| n.is(SyntaxKind::NodeRef)))
                    .into_iter()
                    .flatten(),
            )
        })
    }

    /// Model, subcircuit or Spectre master name.
    pub fn model(&self) -> Option<&'a str> {
        self.0.first_child(SyntaxKind::ModelRef).map(|n| n.text())
    }

    /// First positional value.
    pub fn value(&self) -> Option<SyntaxNode<'a>> {
        self.0
            .first_child(SyntaxKind::Argument)
            .and_then(|arg| arg.child_nodes().next())
    }

    pub fn params(&self) -> impl Iterator<Item = Param<'a>> + 'a {
        params(self.0)
    }
}

impl<'a> Model<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.0.first_child(SyntaxKind::ModelRef).map(|n| n.text())
    }

    pub fn model_type(&self) -> Option<&'a str> {
        self.0.first_child(SyntaxKind::Name).map(|n| n.text())
    }

    pub fn params(&self) -> impl Iterator<Item = Param<'a>> + 'a {
        params(self.0)
    }
}

impl<'a> Subckt<'a> {
    /// The name after the `subckt` keyword.
    pub fn name(&self) -> Option<&'a str> {
        let mut tokens = self
            .0
            .tokens()
            .skip_while(|t| t.kind() != TokenKind::Keyword(Keyword::Subckt));
        tokens.next();
        tokens.next().filter(|t| t.kind().is_name()).map(|t| t.text())
    }

    pub fn ports(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.0
            .first_child(SyntaxKind::NodeList)
            .into_iter()
            .flat_map(|list| list.child_nodes())
            .filter(|n| n.is(SyntaxKind::NodeRef))
    }

    pub fn params(&self) -> impl Iterator<Item = Param<'a>> + 'a {
        params(self.0)
    }

    /// Statements between the header and the closing line.
    pub fn body(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.0
            .first_child(SyntaxKind::StatementList)
            .into_iter()
            .flat_map(|list| list.child_nodes())
    }

    pub fn ends(&self) -> Option<SyntaxNode<'a>> {
        self.0
            .first_child(SyntaxKind::Ends)
            .or_else(|| self.0.first_child(SyntaxKind::SpectreEnds))
    }
}

impl<'a> Include<'a> {
    /// The path as written, quotes included.
    pub fn path(&self) -> Option<&'a str> {
        self.0
            .tokens()
            .find(|t| matches!(t.kind(), TokenKind::Path | TokenKind::String))
            .map(|t| t.text())
    }
}

impl<'a> BinaryExpression<'a> {
    pub fn lhs(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_nodes().next()
    }

    pub fn op(&self) -> Option<TokenKind> {
        self.0.tokens().next().map(|t| t.kind())
    }

    pub fn rhs(&self) -> Option<SyntaxNode<'a>> {
        self.0.child_nodes().nth(1)
    }
}
