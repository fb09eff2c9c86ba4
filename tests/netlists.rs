//! End-to-end parsing of whole netlists through the public API.

use netlist_cst::dialect::{DeviceKind, Dialect, DialectConfig};
use netlist_cst::diagnostics;
use netlist_cst::syntax::ast::{AstNode, Device, Model, Passive, Subckt};
use netlist_cst::syntax::{self, NodeKind, SyntaxKind, SyntaxNode, TokenKind};
use rstest::rstest;

fn kinds(tree: &syntax::SyntaxTree<'_>) -> Vec<SyntaxKind> {
    tree.statements().filter_map(|s| s.production()).collect()
}

fn rebuilt(tree: &syntax::SyntaxTree<'_>) -> String {
    tree.root().children().map(|c| c.full_text()).collect()
}

/// Fully parenthesized rendering of an expression tree.
fn shape(node: SyntaxNode<'_>) -> String {
    match node.production() {
        Some(SyntaxKind::BinaryExpression) => {
            let nodes: Vec<_> = node.child_nodes().map(shape).collect();
            let op = node.tokens().next().map(|t| t.text()).unwrap_or_default();
            format!("({} {op} {})", nodes[0], nodes[1])
        }
        Some(SyntaxKind::UnaryExpression) => {
            let op = node.tokens().next().map(|t| t.text()).unwrap_or_default();
            let inner = node.child_nodes().next().map(shape).unwrap_or_default();
            format!("({op}{inner})")
        }
        Some(SyntaxKind::ParenExpression) => {
            node.child_nodes().next().map(shape).unwrap_or_default()
        }
        _ => node.text().to_string(),
    }
}

#[test]
fn test_model_then_resistor() {
    let config = DialectConfig::default();
    let tree = syntax::parse(".model nmos nmos level=14\nR1 a b 1k\n", &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(kinds(&tree), vec![SyntaxKind::Model, SyntaxKind::Resistor]);

    let mut statements = tree.statements();
    let model = Model::cast(statements.next().unwrap()).unwrap();
    assert_eq!(model.name(), Some("nmos"));
    let resistor = Passive::cast(statements.next().unwrap()).unwrap();
    assert_eq!(resistor.value().unwrap().text(), "1k");
}

#[test]
fn test_unterminated_subckt() {
    let config = DialectConfig::default();
    let tree = syntax::parse(".subckt foo a b\nR1 a b 1k\n", &config);
    assert!(tree.had_errors());
    let statements: Vec<_> = tree.statements().collect();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].kind(),
        &NodeKind::Incomplete(SyntaxKind::Subckt)
    );
    let error = statements[0]
        .descendants()
        .find_map(|n| n.error())
        .unwrap();
    assert_eq!(error.message(), "expected ENDS, found end-of-input");
}

#[test]
fn test_amplifier_deck() {
    let source = "\
* two-stage amplifier
.param vdd=1.8 gain={2*vdd}
.include \"models/ptm45.lib\"
.subckt stage in out vdd vss w=1u
M1 out in vss vss nch w={w} l=45n
R1 vdd out 10k
.ends stage
X1 in mid vdd 0 stage w=2u
X2 mid out vdd 0 stage
Vdd vdd 0 DC {vdd}
Vin in 0 DC 0.9 AC 1 SIN(0.9 10m 1k)
C1 out 0 1p
.tran 1n 10u
.end
";
    let config = DialectConfig::for_dialect(Dialect::Ngspice);
    let tree = syntax::parse(source, &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(rebuilt(&tree), source);

    let subckt = tree
        .statements()
        .find_map(Subckt::cast)
        .unwrap();
    assert_eq!(subckt.name(), Some("stage"));
    assert_eq!(subckt.ports().count(), 4);
    assert_eq!(subckt.body().count(), 2);

    let calls: Vec<_> = tree
        .statements()
        .filter(|s| s.is(SyntaxKind::SubcktCall))
        .filter_map(Device::cast)
        .map(|d| d.model().unwrap_or_default().to_string())
        .collect();
    assert_eq!(calls, vec!["stage", "stage"]);
}

#[rstest]
#[case(Dialect::Ngspice, DeviceKind::Switch)]
#[case(Dialect::Hspice, DeviceKind::SParameter)]
fn test_s_prefix_by_dialect(#[case] dialect: Dialect, #[case] expected: DeviceKind) {
    let source = "S1 a b c d sw1 ON\n";
    let config = DialectConfig::for_dialect(dialect);
    let tokens = syntax::tokenize(source, &config);
    assert_eq!(tokens[0].kind, TokenKind::Instance(expected));

    let tree = syntax::parse(source, &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(kinds(&tree), vec![expected.syntax_kind()]);
}

#[rstest]
#[case("2 + 3 * 4 ** 2", "(2 + (3 * (4 ** 2)))")]
#[case("2 ** 3 ** 2", "(2 ** (3 ** 2))")]
#[case("a || b && c", "(a || (b && c))")]
#[case("a | b ^ c & d", "(a | (b ^ (c & d)))")]
#[case("a == b < c", "(a == (b < c))")]
#[case("(1 + 2) * 3", "((1 + 2) * 3)")]
#[case("-a * b", "((-a) * b)")]
#[case("10 % 4 / 2", "((10 % 4) / 2)")]
fn test_precedence(#[case] input: &str, #[case] expected: &str) {
    let config = DialectConfig::default();
    let tree = syntax::parse_expression(input, &config);
    assert!(!tree.had_errors(), "{input}: {}", tree.dump());
    let expr = tree.statements().next().unwrap();
    assert_eq!(shape(expr), expected);
}

#[rstest]
#[case("R1 a b 1k\nC1 a\nL1 a b 1u\n.model m1 nmos\n", 4)]
#[case("V1 in 0 DC 1\n= = =\nR1 in 0 1k\n", 3)]
#[case(".param x=1\n.model\n.param y=2\nR1 a b {x+y}\n", 4)]
fn test_error_isolation(#[case] source: &str, #[case] statements: usize) {
    let config = DialectConfig::default();
    let tree = syntax::parse(source, &config);
    assert!(tree.had_errors());
    assert_eq!(rebuilt(&tree), source);

    let all: Vec<_> = tree.statements().collect();
    assert_eq!(all.len(), statements);
    let bad = all.iter().filter(|s| s.contains_error()).count();
    assert_eq!(bad, 1);
    assert_eq!(diagnostics::collect(&tree).len(), 1);
}

#[test]
fn test_language_switch_mid_file() {
    let source = "\
R1 a b 1k
simulator lang=spectre
r2 (a b) resistor r=1k
parameters w=2u
simulator lang=spice
C1 a 0 1p
";
    let config = DialectConfig::default();
    let tree = syntax::parse(source, &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(
        kinds(&tree),
        vec![
            SyntaxKind::Resistor,
            SyntaxKind::LanguageSwitch,
            SyntaxKind::SpectreInstance,
            SyntaxKind::SpectreParameters,
            SyntaxKind::LanguageSwitch,
            SyntaxKind::Capacitor,
        ]
    );
    assert_eq!(rebuilt(&tree), source);
}

#[rstest]
#[case("2.682n")]
#[case("1.5Meg")]
#[case("1e-14")]
#[case(".5")]
fn test_single_number(#[case] text: &str) {
    let config = DialectConfig::default();
    let source = format!("R1 a b {text}\n");
    let tokens = syntax::tokenize(&source, &config);
    let numbers: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number)
        .map(|t| &source[t.span()])
        .collect();
    assert_eq!(numbers, vec![text]);
}

#[test]
fn test_based_literal() {
    let config = DialectConfig::for_dialect(Dialect::Spectre);
    let source = "parameters mask=123'hAB\n";
    let tokens = syntax::tokenize(source, &config);
    let numbers: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number)
        .map(|t| &source[t.span()])
        .collect();
    assert_eq!(numbers, vec!["123'hAB"]);
}

#[test]
fn test_brace_expression_in_param() {
    let config = DialectConfig::default();
    let tree = syntax::parse("R2 n1 n2 r={1-foe-bar}\n", &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    let brace = tree
        .root()
        .descendants()
        .find(|n| n.is(SyntaxKind::BraceExpression))
        .unwrap();
    let inner = brace.child_nodes().next().unwrap();
    assert_eq!(shape(inner), "((1 - foe) - bar)");
}

#[test]
fn test_strict_mode_reports_more() {
    let source = "R1 a b\n.ends other\n.frobnicate\n";
    let lenient = syntax::parse(source, &DialectConfig::default());
    let strict = syntax::parse(source, &DialectConfig::default().strict(true));
    let lenient_count = diagnostics::collect(&lenient).len();
    let strict_count = diagnostics::collect(&strict).len();
    assert!(strict_count > lenient_count, "{}", strict.dump());
}

#[test]
fn test_title_line() {
    let config = DialectConfig::for_dialect(Dialect::Ngspice).with_title_line(true);
    let tree = syntax::parse("My amp: R=1k, (test)\nR1 a b 1k\n", &config);
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(kinds(&tree), vec![SyntaxKind::Title, SyntaxKind::Resistor]);
}

#[test]
fn test_spectre_file() {
    let source = "\
// inverter
simulator lang=spectre
include \"models.scs\" section=tt
subckt inv (in out vdd vss)
  mp (out in vdd vdd) pch w=2u l=45n
  mn (out in vss vss) nch w=1u \\
     l=45n
ends inv
x1 (a b vdd 0) inv
";
    let tree = syntax::parse_spectre(source, &DialectConfig::default());
    assert!(!tree.had_errors(), "{}", tree.dump());
    assert_eq!(rebuilt(&tree), source);
    let subckt = tree.statements().find_map(Subckt::cast).unwrap();
    assert_eq!(subckt.name(), Some("inv"));
    assert_eq!(subckt.body().count(), 2);
}
