//! Concrete syntax tree.
//!
//! Every byte of the source belongs to exactly one leaf: its significant text
//! plus the trivia in front of it. Nodes store their position relative to the
//! parent together with two widths:
//!
//! ```text
//!   full_width: leading trivia + text
//!   width:      text only (leading trivia trimmed)
//! ```
//!
//! The owned tree ([`Node`], [`Leaf`]) is position-independent; the borrowed
//! views ([`SyntaxNode`], [`SyntaxToken`]) carry an absolute start offset and
//! the source so they can hand out spans and text.

use std::fmt::{self, Write as _};
use std::ops::Range;

use super::token::TokenKind;

/// Productions of the SPICE and Spectre grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// The whole file
    SourceFile,

    // ============ SPICE statements ============
    Title,
    Resistor,
    Capacitor,
    Inductor,
    MutualInductor,
    Diode,
    Bjt,
    Mosfet,
    Jfet,
    Mesfet,
    VoltageSource,
    CurrentSource,
    Vcvs,
    Cccs,
    Vccs,
    Ccvs,
    BehavioralSource,
    Switch,
    CurrentSwitch,
    SParameter,
    TransmissionLine,
    SubcktCall,
    GenericDevice,
    Model,
    Subckt,
    Ends,
    Include,
    LibInclude,
    LibSection,
    EndLib,
    ParamDecl,
    FuncDecl,
    Measure,
    Analysis,
    Options,
    Temp,
    Global,
    InitialCondition,
    Output,
    IfBlock,
    IfBranch,
    ElseIfBranch,
    ElseBranch,
    EndIf,
    DataBlock,
    DataRow,
    EndData,
    ControlBlock,
    RawLine,
    EndControl,
    End,
    /// Unrecognized dot-command
    Command,
    /// `simulator lang=...`
    LanguageSwitch,

    // ============ Spectre statements ============
    SpectreParameters,
    SpectreInclude,
    SpectreSubckt,
    SpectreEnds,
    SpectreModel,
    SpectreSection,
    SpectreEndSection,
    SpectreLibrary,
    SpectreEndLibrary,
    SpectreGlobal,
    SpectreInstance,

    // ============ Statement parts ============
    /// Body of a compound statement
    StatementList,
    /// Node or port names, optionally parenthesized
    NodeList,
    NodeRef,
    ModelRef,
    /// Reference to another instance (`Vsense`, `L1`)
    DeviceRef,
    /// `name = expression`
    Param,
    /// Parenthesized parameter list of a `.model`
    ParamList,
    /// Bare name in a parameter position (`OFF`, `noisy`)
    Flag,
    /// Positional value
    Argument,
    /// `params:`
    ParamsMarker,
    DcSpec,
    AcSpec,
    TransientFunction,
    PolySpec,
    ValueSpec,
    TableSpec,
    /// Formal parameters of `.func`
    FuncParams,

    // ============ Expressions ============
    Literal,
    /// Possibly hierarchical name (`x1.n3`)
    Name,
    FunctionCall,
    ArgList,
    BraceExpression,
    PrimeExpression,
    ParenExpression,
    ArrayExpression,
    ForeignExpression,
    UnaryExpression,
    BinaryExpression,
    TernaryExpression,
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// What went wrong at an Error node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReason {
    /// The token at this position fits no alternative
    UnexpectedToken,
    /// Accepted by the lenient grammar, rejected under `strict`
    StrictModeViolation(StrictRule),
}

/// Rules that only apply in strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrictRule {
    /// R, C or L without a value
    MissingValue,
    /// Model-bearing device without a model name
    MissingModel,
    /// `.ends name` that does not close the open subcircuit
    EndsNameMismatch,
    /// Dot-command the grammar does not know
    UnknownCommand,
}

impl StrictRule {
    fn message(self) -> &'static str {
        match self {
            StrictRule::MissingValue => "device value is required in strict mode",
            StrictRule::MissingModel => "model name is required in strict mode",
            StrictRule::EndsNameMismatch => "ENDS name does not match the subcircuit",
            StrictRule::UnknownCommand => "unknown dot-command in strict mode",
        }
    }
}

/// An alternative the parser would have accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    Production(&'static str),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Production(name) => f.write_str(name),
        }
    }
}

/// Payload of an Error node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub reason: ErrorReason,
    /// Kind of the first token the Error node swallowed
    pub found: TokenKind,
    pub expected: Vec<Expected>,
}

impl ErrorInfo {
    /// Human-readable one-line message.
    pub fn message(&self) -> String {
        match &self.reason {
            ErrorReason::StrictModeViolation(rule) => rule.message().to_string(),
            ErrorReason::UnexpectedToken => match self.expected.as_slice() {
                [] => format!("unexpected {}", self.found),
                [only] => format!("expected {only}, found {}", self.found),
                many => {
                    let list = many
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("expected one of {list}, found {}", self.found)
                }
            },
        }
    }
}

/// Kind of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Syntax(SyntaxKind),
    /// Tokens the parser could not place, through the end of the line
    Error(Box<ErrorInfo>),
    /// A production cut short by a fault; its last child holds the fault
    Incomplete(SyntaxKind),
}

/// A run of trivia in front of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TokenKind,
    pub width: u32,
}

/// A significant token together with its leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    kind: TokenKind,
    offset: u32,
    full_width: u32,
    width: u32,
    trivia: Vec<Trivia>,
}

impl Leaf {
    /// A leaf starting at absolute `offset`; `trivia` precedes the token text.
    pub(crate) fn new(kind: TokenKind, offset: u32, trivia: Vec<Trivia>, width: u32) -> Self {
        let leading: u32 = trivia.iter().map(|t| t.width).sum();
        Self {
            kind,
            offset,
            full_width: leading + width,
            width,
            trivia,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn full_width(&self) -> u32 {
        self.full_width
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn offset(&self) -> u32 {
        self.offset
    }

    /// Leading trivia, in source order.
    pub fn trivia(&self) -> &[Trivia] {
        &self.trivia
    }

    pub(crate) fn has_leading_trivia(&self) -> bool {
        self.full_width != self.width
    }
}

/// Child of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Node(Node),
    Token(Leaf),
}

impl Element {
    fn offset(&self) -> u32 {
        match self {
            Element::Node(n) => n.offset,
            Element::Token(t) => t.offset,
        }
    }

    fn set_offset(&mut self, offset: u32) {
        match self {
            Element::Node(n) => n.offset = offset,
            Element::Token(t) => t.offset = offset,
        }
    }

    fn full_width(&self) -> u32 {
        match self {
            Element::Node(n) => n.full_width,
            Element::Token(t) => t.full_width,
        }
    }

    fn leading(&self) -> u32 {
        match self {
            Element::Node(n) => n.full_width - n.width,
            Element::Token(t) => t.full_width - t.width,
        }
    }
}

/// An interior node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    offset: u32,
    full_width: u32,
    width: u32,
    children: Vec<Element>,
}

impl Node {
    /// Finish a node whose children carry absolute offsets.
    ///
    /// `at` positions a node without children. Afterwards the children's
    /// offsets are relative to the node and the node's own offset is absolute
    /// until its parent is finished.
    pub(crate) fn build(kind: NodeKind, mut children: Vec<Element>, at: u32) -> Self {
        let offset = children.first().map_or(at, Element::offset);
        let full_width = children.iter().map(Element::full_width).sum();
        let mut leading = None;
        for child in &mut children {
            let relative = child.offset() - offset;
            child.set_offset(relative);
            if leading.is_none() && child.full_width() > 0 {
                leading = Some(relative + child.leading());
            }
        }
        let leading = leading.unwrap_or(0);
        Self {
            kind,
            offset,
            full_width,
            width: full_width - leading,
            children,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn full_width(&self) -> u32 {
        self.full_width
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn offset(&self) -> u32 {
        self.offset
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

/// Result of parsing one source buffer.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'src> {
    root: Node,
    source: &'src str,
    had_errors: bool,
}

impl<'src> SyntaxTree<'src> {
    pub(crate) fn new(root: Node, source: &'src str, had_errors: bool) -> Self {
        Self {
            root,
            source,
            had_errors,
        }
    }

    /// The root node.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: &self.root,
            start: self.root.offset,
            source: self.source,
        }
    }

    /// Top-level statements, in order.
    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode<'_>> {
        self.root().child_nodes()
    }

    /// True when any Error node was created.
    pub fn had_errors(&self) -> bool {
        self.had_errors
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// The tree rendered as an indented outline.
    pub fn dump(&self) -> String {
        self.root().dump()
    }
}

/// A node positioned in its source.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxNode<'a> {
    node: &'a Node,
    start: u32,
    source: &'a str,
}

impl<'a> SyntaxNode<'a> {
    pub fn kind(&self) -> &'a NodeKind {
        &self.node.kind
    }

    /// The production, for Syntax and Incomplete nodes.
    pub fn production(&self) -> Option<SyntaxKind> {
        match self.node.kind {
            NodeKind::Syntax(kind) | NodeKind::Incomplete(kind) => Some(kind),
            NodeKind::Error(_) => None,
        }
    }

    /// True for a complete node of `kind`.
    pub fn is(&self, kind: SyntaxKind) -> bool {
        self.node.kind == NodeKind::Syntax(kind)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.node.kind, NodeKind::Error(_))
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self.node.kind, NodeKind::Incomplete(_))
    }

    /// Error payload of an Error node.
    pub fn error(&self) -> Option<&'a ErrorInfo> {
        match &self.node.kind {
            NodeKind::Error(info) => Some(info),
            _ => None,
        }
    }

    /// True if this node or any descendant is an Error node.
    pub fn contains_error(&self) -> bool {
        self.descendants().any(|n| n.is_error())
    }

    /// Span including leading trivia.
    pub fn full_span(&self) -> Range<usize> {
        self.start as usize..(self.start + self.node.full_width) as usize
    }

    /// Span of the significant text.
    pub fn span(&self) -> Range<usize> {
        let leading = self.node.full_width - self.node.width;
        (self.start + leading) as usize..(self.start + self.node.full_width) as usize
    }

    pub fn full_text(&self) -> &'a str {
        &self.source[self.full_span()]
    }

    pub fn text(&self) -> &'a str {
        &self.source[self.span()]
    }

    pub fn raw(&self) -> &'a Node {
        self.node
    }

    /// Direct children, nodes and tokens.
    pub fn children(&self) -> impl Iterator<Item = SyntaxElement<'a>> + 'a {
        let node: &'a Node = self.node;
        let start = self.start;
        let source = self.source;
        node.children.iter().map(move |child| match child {
            Element::Node(node) => SyntaxElement::Node(SyntaxNode {
                node,
                start: start + node.offset,
                source,
            }),
            Element::Token(leaf) => SyntaxElement::Token(SyntaxToken {
                leaf,
                start: start + leaf.offset,
                source,
            }),
        })
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        self.children().filter_map(SyntaxElement::into_node)
    }

    pub fn tokens(&self) -> impl Iterator<Item = SyntaxToken<'a>> + 'a {
        self.children().filter_map(SyntaxElement::into_token)
    }

    /// First child node with the given production (complete or not).
    pub fn first_child(&self, kind: SyntaxKind) -> Option<SyntaxNode<'a>> {
        self.child_nodes().find(|n| n.production() == Some(kind))
    }

    /// First direct token of the given kind.
    pub fn first_token(&self, kind: TokenKind) -> Option<SyntaxToken<'a>> {
        self.tokens().find(|t| t.kind() == kind)
    }

    /// This node and every node below it, in pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'a>> + 'a {
        let mut stack = vec![*self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            let children: Vec<_> = next.child_nodes().collect();
            stack.extend(children.into_iter().rev());
            Some(next)
        })
    }

    /// Indented outline of this subtree, one element per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let span = self.span();
        let _ = match self.kind() {
            NodeKind::Syntax(kind) => writeln!(out, "{indent}{kind}@{span:?}"),
            NodeKind::Incomplete(kind) => writeln!(out, "{indent}Incomplete({kind})@{span:?}"),
            NodeKind::Error(info) => {
                writeln!(out, "{indent}Error@{span:?} \"{}\"", info.message())
            }
        };
        for child in self.children() {
            match child {
                SyntaxElement::Node(node) => node.dump_into(out, depth + 1),
                SyntaxElement::Token(token) => {
                    let _ = writeln!(
                        out,
                        "{indent}  {:?}@{:?} {:?}",
                        token.kind(),
                        token.span(),
                        token.text()
                    );
                }
            }
        }
    }
}

/// A leaf positioned in its source.
#[derive(Debug, Clone, Copy)]
pub struct SyntaxToken<'a> {
    leaf: &'a Leaf,
    start: u32,
    source: &'a str,
}

impl<'a> SyntaxToken<'a> {
    pub fn kind(&self) -> TokenKind {
        self.leaf.kind
    }

    pub fn full_span(&self) -> Range<usize> {
        self.start as usize..(self.start + self.leaf.full_width) as usize
    }

    pub fn span(&self) -> Range<usize> {
        let leading = self.leaf.full_width - self.leaf.width;
        (self.start + leading) as usize..(self.start + self.leaf.full_width) as usize
    }

    pub fn text(&self) -> &'a str {
        &self.source[self.span()]
    }

    pub fn full_text(&self) -> &'a str {
        &self.source[self.full_span()]
    }

    /// Leading trivia pieces with their absolute spans.
    pub fn trivia(&self) -> impl Iterator<Item = (TokenKind, Range<usize>)> + 'a {
        let mut at = self.start as usize;
        self.leaf.trivia.iter().map(move |t| {
            let span = at..at + t.width as usize;
            at = span.end;
            (t.kind, span)
        })
    }
}

/// Either kind of child.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxElement<'a> {
    Node(SyntaxNode<'a>),
    Token(SyntaxToken<'a>),
}

impl<'a> SyntaxElement<'a> {
    pub fn into_node(self) -> Option<SyntaxNode<'a>> {
        match self {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<SyntaxToken<'a>> {
        match self {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        }
    }

    pub fn full_text(&self) -> &'a str {
        match self {
            SyntaxElement::Node(n) => n.full_text(),
            SyntaxElement::Token(t) => t.full_text(),
        }
    }

    pub fn text(&self) -> &'a str {
        match self {
            SyntaxElement::Node(n) => n.text(),
            SyntaxElement::Token(t) => t.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: TokenKind, offset: u32, leading: u32, width: u32) -> Element {
        let trivia = if leading > 0 {
            vec![Trivia {
                kind: TokenKind::Whitespace,
                width: leading,
            }]
        } else {
            Vec::new()
        };
        Element::Token(Leaf::new(kind, offset, trivia, width))
    }

    #[test]
    fn test_widths_skip_leading_trivia() {
        // "  ab cd"
        let node = Node::build(
            NodeKind::Syntax(SyntaxKind::NodeList),
            vec![
                leaf(TokenKind::Identifier, 0, 2, 2),
                leaf(TokenKind::Identifier, 4, 1, 2),
            ],
            0,
        );
        assert_eq!(node.full_width(), 7);
        assert_eq!(node.width(), 5);
    }

    #[test]
    fn test_zero_width_first_child() {
        // an empty node followed by " x"
        let empty = Node::build(NodeKind::Syntax(SyntaxKind::NodeList), Vec::new(), 3);
        let node = Node::build(
            NodeKind::Syntax(SyntaxKind::Argument),
            vec![Element::Node(empty), leaf(TokenKind::Identifier, 3, 1, 1)],
            3,
        );
        assert_eq!(node.full_width(), 2);
        assert_eq!(node.width(), 1);
    }

    #[test]
    fn test_views_slice_source() {
        let source = " R1 a";
        let node = Node::build(
            NodeKind::Syntax(SyntaxKind::Resistor),
            vec![
                leaf(TokenKind::Identifier, 0, 1, 2),
                leaf(TokenKind::Identifier, 3, 1, 1),
            ],
            0,
        );
        let tree = SyntaxTree::new(node, source, false);
        let root = tree.root();
        assert_eq!(root.full_text(), " R1 a");
        assert_eq!(root.text(), "R1 a");
        let texts: Vec<_> = root.tokens().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["R1", "a"]);
        let trivia: Vec<_> = root.tokens().next().unwrap().trivia().collect();
        assert_eq!(trivia, vec![(TokenKind::Whitespace, 0..1)]);
    }

    #[test]
    fn test_error_messages() {
        let single = ErrorInfo {
            reason: ErrorReason::UnexpectedToken,
            found: TokenKind::Eof,
            expected: vec![Expected::Token(TokenKind::Keyword(
                crate::syntax::keywords::Keyword::Ends,
            ))],
        };
        assert_eq!(single.message(), "expected ENDS, found end-of-input");

        let many = ErrorInfo {
            reason: ErrorReason::UnexpectedToken,
            found: TokenKind::Comma,
            expected: vec![
                Expected::Token(TokenKind::Identifier),
                Expected::Production("expression"),
            ],
        };
        assert_eq!(
            many.message(),
            "expected one of identifier, expression, found `,`"
        );
    }
}
