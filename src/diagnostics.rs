//! Syntax diagnostics extracted from a parsed tree.
//!
//! The parser records faults as Error nodes instead of returning them.
//! [`collect`] walks the tree and turns each Error node into a
//! [`SyntaxDiagnostic`] with a line/column position and the chain of
//! productions that were cut short around it. [`SyntaxDiagnostic::render`]
//! prints a source excerpt with a caret label through miette.

use std::fmt;
use std::ops::Range;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};

use crate::syntax::{ErrorReason, Expected, NodeKind, SyntaxKind, SyntaxNode, SyntaxTree, TokenKind};

/// Byte offset to line/column lookup.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset where each line starts
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    /// 1-based line and column (in characters) of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let start = self.starts[line];
        let column = self
            .source
            .get(start..offset)
            .map_or(offset - start, |prefix| prefix.chars().count());
        (line + 1, column + 1)
    }
}

/// One syntax fault found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    pub reason: ErrorReason,
    /// Byte range of the offending text, trivia excluded
    pub span: Range<usize>,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
    pub found: TokenKind,
    pub expected: Vec<Expected>,
    /// Incomplete productions enclosing the fault, outermost first
    pub context: Vec<SyntaxKind>,
}

impl SyntaxDiagnostic {
    /// Render a caret excerpt of `source`, labelled with `source_name`.
    pub fn render(&self, source_name: &str, source: &str) -> String {
        let report = Report {
            message: self.message.clone(),
            src: NamedSource::new(source_name, source.to_string()),
            span: (self.span.start, self.span.len()).into(),
            label: self.label(),
            help: self.help(),
        };
        let mut out = String::new();
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        if handler.render_report(&mut out, &report).is_err() {
            return format!("{source_name}:{self}");
        }
        out
    }

    fn label(&self) -> String {
        match self.found {
            TokenKind::Eof => "input ends here".to_string(),
            found => format!("found {found}"),
        }
    }

    fn help(&self) -> Option<String> {
        let innermost = self.context.last()?;
        Some(format!("while parsing {innermost}"))
    }
}

impl fmt::Display for SyntaxDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// A renderable diagnostic with rich formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(netlist::syntax))]
struct Report {
    message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    label: String,
    #[help]
    help: Option<String>,
}

/// Every Error node in `tree`, in source order.
pub fn collect(tree: &SyntaxTree<'_>) -> Vec<SyntaxDiagnostic> {
    let index = LineIndex::new(tree.source());
    let mut out = Vec::new();
    let mut context = Vec::new();
    walk(tree.root(), &index, &mut context, &mut out);
    out
}

fn walk(
    node: SyntaxNode<'_>,
    index: &LineIndex<'_>,
    context: &mut Vec<SyntaxKind>,
    out: &mut Vec<SyntaxDiagnostic>,
) {
    match node.kind() {
        NodeKind::Error(info) => {
            let span = node.span();
            let (line, column) = index.line_col(span.start);
            out.push(SyntaxDiagnostic {
                message: info.message(),
                reason: info.reason.clone(),
                span,
                line,
                column,
                found: info.found,
                expected: info.expected.clone(),
                context: context.clone(),
            });
        }
        NodeKind::Incomplete(kind) => {
            context.push(*kind);
            for child in node.child_nodes() {
                walk(child, index, context, out);
            }
            context.pop();
        }
        NodeKind::Syntax(_) => {
            for child in node.child_nodes() {
                walk(child, index, context, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, DialectConfig};
    use crate::syntax::{parse, StrictRule};

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\ncd\n\nµx");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(1), (1, 2));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(6), (3, 1));
        // after a two-byte character
        assert_eq!(index.line_col(9), (4, 2));
    }

    #[test]
    fn test_valid_tree_has_no_diagnostics() {
        let tree = parse("R1 a b 1k\n", &DialectConfig::default());
        assert!(collect(&tree).is_empty());
    }

    #[test]
    fn test_missing_ends() {
        let tree = parse(".subckt foo a b\nR1 a b 1k\n", &DialectConfig::default());
        let diagnostics = collect(&tree);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.message, "expected ENDS, found end-of-input");
        assert_eq!((d.line, d.column), (3, 1));
        assert_eq!(d.found, TokenKind::Eof);
        assert_eq!(d.context.first(), Some(&SyntaxKind::Subckt));
    }

    #[test]
    fn test_position_of_bad_line() {
        let source = "R1 a b 1k\n.model\nC1 a 0 1p\n";
        let tree = parse(source, &DialectConfig::default());
        let diagnostics = collect(&tree);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 2);
        assert_eq!(diagnostics[0].context, vec![SyntaxKind::Model]);
    }

    #[test]
    fn test_strict_reason() {
        let config = DialectConfig::for_dialect(Dialect::Ngspice).strict(true);
        let tree = parse("C1 a 0\n", &config);
        let diagnostics = collect(&tree);
        assert_eq!(
            diagnostics[0].reason,
            ErrorReason::StrictModeViolation(StrictRule::MissingValue)
        );
    }

    #[test]
    fn test_render_contains_message_and_name() {
        let source = ".subckt foo a b\nR1 a b 1k\n";
        let tree = parse(source, &DialectConfig::default());
        let diagnostics = collect(&tree);
        let rendered = diagnostics[0].render("amp.cir", source);
        assert!(rendered.contains("expected ENDS, found end-of-input"), "{rendered}");
        assert!(rendered.contains("amp.cir"), "{rendered}");
    }

    #[test]
    fn test_display() {
        let tree = parse("R1 a b 1k\n=\n", &DialectConfig::default());
        let diagnostics = collect(&tree);
        assert_eq!(diagnostics[0].to_string(), "2:1: expected statement, found `=`");
    }
}
