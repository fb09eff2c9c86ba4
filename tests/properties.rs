//! Property-based tests over generated netlists.
//!
//! 1. **Round-trip** - the root's children reproduce any input byte-for-byte
//! 2. **Widths** - every node's full text is the concatenation of its children
//! 3. **Tokenization idempotence** - re-lexing the significant tokens, one
//!    space apart, gives the same kinds
//! 4. **Isolation** - a garbage line leaves the surrounding statements intact

use netlist_cst::dialect::{Dialect, DialectConfig};
use netlist_cst::syntax::{self, SyntaxKind, SyntaxNode, Token, TokenKind};
use proptest::prelude::*;

/// Lines that parse cleanly under every SPICE dialect.
const VALID_LINES: &[&str] = &[
    "R1 a b 1k",
    "C2 out 0 10p ic=0",
    "L1 n1 n2 1u",
    "D1 a k dmod",
    "M1 d g s b nch w=1u l={lmin*2}",
    "Q1 c b e npn",
    "V1 in 0 DC 1 AC 1",
    "I1 0 x PULSE(0 1m 0 1n 1n 5u 10u)",
    "E1 o 0 a b 10",
    "X1 a b amp gain=2",
    ".model nmos nmos level=14",
    ".param w=1u l=45n",
    ".tran 1n 10u",
    ".options reltol=1e-4",
    "* comment",
    "",
];

/// Openers left dangling at the end of a line.
const OPEN_DELIMITERS: &[&str] = &["{", "{a", "(1", "[", "'", "`", "\"", "={"];

fn dialect() -> impl Strategy<Value = Dialect> {
    prop::sample::select(Dialect::ALL)
}

fn valid_line() -> impl Strategy<Value = String> {
    prop::sample::select(VALID_LINES).prop_map(ToString::to_string)
}

fn spice_dialect() -> impl Strategy<Value = Dialect> {
    dialect().prop_filter("SPICE grammar", |d| *d != Dialect::Spectre)
}

/// A valid line cut after a few words and left inside an open delimiter.
fn truncated_line() -> impl Strategy<Value = String> {
    let junk = prop::sample::select(OPEN_DELIMITERS);
    (valid_line(), 1usize..6, junk).prop_map(|(line, words, junk)| {
        let head: Vec<_> = line.split(' ').take(words).collect();
        format!("{} {junk}", head.join(" "))
    })
}

/// Netlist-flavoured noise: the characters the lexer treats specially, or
/// lines broken off inside a value.
fn noisy_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 \t\n.,:;=+*/(){}\\[\\]'\"`$!&|^<>?~%@#_-]{0,160}",
        prop::collection::vec(prop_oneof![truncated_line(), valid_line()], 1..8)
            .prop_map(|lines| lines.join("\n") + "\n"),
    ]
}

fn significant(tokens: &[Token]) -> Vec<TokenKind> {
    tokens
        .iter()
        .map(|t| t.kind)
        .filter(|k| !k.is_trivia() && *k != TokenKind::Eof)
        .collect()
}

/// The significant tokens of `source`, one space apart, one statement per line.
fn respaced(source: &str, tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut line_start = true;
    for token in tokens.iter().filter(|t| !t.is_trivia()) {
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Newline => {
                out.push('\n');
                line_start = true;
            }
            _ => {
                if !line_start {
                    out.push(' ');
                }
                out.push_str(&source[token.span()]);
                line_start = false;
            }
        }
    }
    out
}

fn check_widths(node: SyntaxNode<'_>) -> Result<(), TestCaseError> {
    let joined: String = node.children().map(|c| c.full_text()).collect();
    prop_assert_eq!(joined.as_str(), node.full_text());
    for child in node.child_nodes() {
        check_widths(child)?;
    }
    Ok(())
}

proptest! {
    #[test]
    fn round_trip_any_text(source in noisy_text(), dialect in dialect()) {
        let config = DialectConfig::for_dialect(dialect);
        let tree = syntax::parse(&source, &config);
        let rebuilt: String = tree.root().children().map(|c| c.full_text()).collect();
        prop_assert_eq!(rebuilt, source);
    }

    #[test]
    fn round_trip_arbitrary_unicode(source in "\\PC{0,80}") {
        let config = DialectConfig::default();
        let tree = syntax::parse(&source, &config);
        prop_assert_eq!(tree.root().full_text(), source.as_str());
    }

    #[test]
    fn node_widths_are_consistent(source in noisy_text()) {
        let config = DialectConfig::default();
        let tree = syntax::parse(&source, &config);
        check_widths(tree.root())?;
    }

    #[test]
    fn tokenization_is_idempotent(
        lines in prop::collection::vec(valid_line(), 1..12),
        dialect in spice_dialect(),
    ) {
        let source = lines.join("\n") + "\n";
        let config = DialectConfig::for_dialect(dialect);
        let tokens = syntax::tokenize(&source, &config);
        let rebuilt: String = tokens.iter().map(|t| &source[t.span()]).collect();
        prop_assert_eq!(&rebuilt, &source);

        let respaced = respaced(&source, &tokens);
        let again = syntax::tokenize(&respaced, &config);
        prop_assert_eq!(significant(&tokens), significant(&again), "{:?}", respaced);
    }

    #[test]
    fn valid_netlists_parse_cleanly(lines in prop::collection::vec(valid_line(), 0..20)) {
        let source = lines.join("\n") + "\n";
        let config = DialectConfig::for_dialect(Dialect::Ngspice);
        let tree = syntax::parse(&source, &config);
        prop_assert!(!tree.had_errors(), "{}", tree.dump());
    }

    #[test]
    fn garbage_line_is_isolated(
        before in prop::collection::vec(valid_line(), 1..8),
        after in prop::collection::vec(valid_line(), 1..8),
    ) {
        let good = |lines: &[String]| {
            lines.iter().filter(|l| !l.is_empty() && !l.starts_with('*')).count()
        };
        let expected = good(&before) + good(&after);
        let source = format!("{}\n= ) (\n{}\n", before.join("\n"), after.join("\n"));
        let config = DialectConfig::for_dialect(Dialect::Ngspice);
        let tree = syntax::parse(&source, &config);

        let statements: Vec<_> = tree.statements().collect();
        let broken = statements.iter().filter(|s| s.contains_error()).count();
        prop_assert_eq!(broken, 1, "{}", tree.dump());
        let clean = statements
            .iter()
            .filter(|s| !s.contains_error() && s.production() != Some(SyntaxKind::StatementList))
            .count();
        prop_assert_eq!(clean, expected);
    }
}
