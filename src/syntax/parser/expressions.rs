//! Expressions: precedence climbing over binary operators, with unary
//! operators folded into primaries and the ternary above the table.
//!
//! | Level | Operators | Associativity |
//! |-------|-----------|---------------|
//! | 1  | `\|\|`              | Left |
//! | 3  | `&&`                | Left |
//! | 5  | `\|`                | Left |
//! | 7  | `^`                 | Left |
//! | 9  | `&`                 | Left |
//! | 11 | `==` `!=`           | Left |
//! | 13 | `<` `<=` `>` `>=`   | Left |
//! | 15 | `<<` `>>`           | Left |
//! | 17 | `+` `-`             | Left |
//! | 19 | `*` `/` `%`         | Left |
//! | 21 | `**`                | Right |

use super::{Builder, Fault, PResult, Parser};
use crate::syntax::cst::{Expected, Leaf, Node, NodeKind, SyntaxKind};
use crate::syntax::keywords::Keyword;
use crate::syntax::token::TokenKind;

#[derive(Debug, Clone, Copy)]
struct BindingPower {
    left: u8,
    right: u8,
}

impl BindingPower {
    const fn left_assoc(precedence: u8) -> Self {
        Self {
            left: precedence,
            right: precedence + 1,
        }
    }

    const fn right_assoc(precedence: u8) -> Self {
        Self {
            left: precedence + 1,
            right: precedence,
        }
    }
}

/// Binding power of a binary operator; `None` ends the expression.
fn binary_binding_power(kind: TokenKind) -> Option<BindingPower> {
    use TokenKind::*;
    let bp = match kind {
        PipePipe => BindingPower::left_assoc(1),
        AmpAmp => BindingPower::left_assoc(3),
        Pipe => BindingPower::left_assoc(5),
        Caret => BindingPower::left_assoc(7),
        Amp => BindingPower::left_assoc(9),
        EqEq | BangEq => BindingPower::left_assoc(11),
        Lt | LtEq | Gt | GtEq => BindingPower::left_assoc(13),
        Shl | Shr => BindingPower::left_assoc(15),
        Plus | Minus => BindingPower::left_assoc(17),
        Star | Slash | Percent => BindingPower::left_assoc(19),
        Power => BindingPower::right_assoc(21),
        _ => return None,
    };
    Some(bp)
}

impl Parser<'_> {
    /// A full expression, ternary included.
    pub(crate) fn expression(&mut self) -> PResult {
        let condition = self.binary(0)?;
        if !self.at(TokenKind::Question) {
            return Ok(condition);
        }
        let mut b = Builder::new(SyntaxKind::TernaryExpression);
        b.node(condition);
        b.token(self.take());
        b.add(self.expression())?;
        b.add(self.expect(TokenKind::Colon))?;
        b.add(self.expression())?;
        Ok(self.finish(b))
    }

    fn binary(&mut self, min_bp: u8) -> PResult {
        let mut lhs = self.atom()?;
        while let Some(bp) = binary_binding_power(self.peek_kind(0)) {
            if bp.left < min_bp {
                break;
            }
            let mut b = Builder::new(SyntaxKind::BinaryExpression);
            b.node(lhs);
            b.token(self.take());
            b.add(self.binary(bp.right))?;
            lhs = self.finish(b);
        }
        Ok(lhs)
    }

    /// A unary-prefixed primary. Whitespace separates positional values, so
    /// device and command arguments are atoms rather than full expressions.
    pub(crate) fn atom(&mut self) -> PResult {
        match self.peek_kind(0) {
            TokenKind::Minus | TokenKind::Plus | TokenKind::Bang | TokenKind::Tilde => {
                let mut b = Builder::new(SyntaxKind::UnaryExpression);
                b.token(self.take());
                b.add(self.atom())?;
                Ok(self.finish(b))
            }
            _ => self.primary(),
        }
    }

    /// True when the next token can start an atom.
    pub(crate) fn at_atom_start(&mut self) -> bool {
        matches!(
            self.peek_kind(0),
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Identifier
                | TokenKind::Keyword(_)
                | TokenKind::Instance(_)
                | TokenKind::Foreign
                | TokenKind::LBrace
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Prime
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Bang
                | TokenKind::Tilde
        )
    }

    fn primary(&mut self) -> PResult {
        match self.peek_kind(0) {
            TokenKind::Number | TokenKind::String => {
                let literal = self.take();
                Ok(self.leaves(SyntaxKind::Literal, vec![literal]))
            }
            TokenKind::Foreign => {
                let foreign = self.take();
                Ok(self.leaves(SyntaxKind::ForeignExpression, vec![foreign]))
            }
            TokenKind::Identifier | TokenKind::Keyword(_) | TokenKind::Instance(_) => {
                self.name_or_call()
            }
            TokenKind::LBrace => {
                self.delimited(SyntaxKind::BraceExpression, TokenKind::LBrace, TokenKind::RBrace)
            }
            TokenKind::LParen => {
                self.delimited(SyntaxKind::ParenExpression, TokenKind::LParen, TokenKind::RParen)
            }
            TokenKind::Prime => {
                self.delimited(SyntaxKind::PrimeExpression, TokenKind::Prime, TokenKind::Prime)
            }
            TokenKind::LBracket => self.array(),
            _ => Err(self.error(&[Expected::Production("expression")])),
        }
    }

    /// A (possibly hierarchical) name, turned into a call when `(` follows directly.
    fn name_or_call(&mut self) -> PResult {
        let name = self.dotted(SyntaxKind::Name);
        if self.at(TokenKind::LParen) && !self.peek_spaced(0) {
            let mut b = Builder::new(SyntaxKind::FunctionCall);
            b.node(name);
            b.add(self.arg_list())?;
            return Ok(self.finish(b));
        }
        Ok(name)
    }

    /// Name tokens joined by `.` with no trivia in between (`x1.x2.n3`).
    pub(crate) fn dotted(&mut self, kind: SyntaxKind) -> Node {
        let parts = self.dotted_leaves();
        self.leaves(kind, parts)
    }

    pub(crate) fn dotted_leaves(&mut self) -> Vec<Leaf> {
        let mut parts = vec![self.take()];
        while self.at(TokenKind::Dot)
            && !self.peek_spaced(0)
            && (self.peek_kind(1).is_name() || self.peek_kind(1) == TokenKind::Number)
            && !self.peek_spaced(1)
        {
            parts.push(self.take());
            parts.push(self.take());
        }
        parts
    }

    fn delimited(&mut self, kind: SyntaxKind, open: TokenKind, close: TokenKind) -> PResult {
        let mut b = Builder::new(kind);
        b.add(self.expect(open))?;
        b.add(self.expression())?;
        b.add(self.expect(close))?;
        Ok(self.finish(b))
    }

    /// `( a, b c )`: commas are optional between arguments.
    pub(crate) fn arg_list(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ArgList);
        b.add(self.expect(TokenKind::LParen))?;
        self.elements(&mut b, TokenKind::RParen)?;
        b.add(self.expect(TokenKind::RParen))?;
        Ok(self.finish(b))
    }

    fn array(&mut self) -> PResult {
        let mut b = Builder::new(SyntaxKind::ArrayExpression);
        b.add(self.expect(TokenKind::LBracket))?;
        self.elements(&mut b, TokenKind::RBracket)?;
        b.add(self.expect(TokenKind::RBracket))?;
        Ok(self.finish(b))
    }

    fn elements(&mut self, b: &mut Builder, close: TokenKind) -> Result<(), Fault> {
        while !self.at(close) && !self.at_line_end() {
            b.add(self.expression())?;
            if let Some(comma) = self.accept(TokenKind::Comma) {
                b.token(comma);
            }
        }
        Ok(())
    }

    /// An atom in a parameter position: `name = expr`, a bare name (flag) or
    /// a positional value.
    pub(crate) fn tail_item(&mut self) -> PResult {
        if self.at_keyword(Keyword::Params) && self.peek_kind(1) == TokenKind::Colon {
            let params = self.take();
            let colon = self.take();
            return Ok(self.leaves(SyntaxKind::ParamsMarker, vec![params, colon]));
        }
        let atom = self.atom()?;
        if self.at(TokenKind::Equals) {
            let mut b = Builder::new(SyntaxKind::Param);
            b.node(atom);
            b.token(self.take());
            b.add(self.expression())?;
            return Ok(self.finish(b));
        }
        let kind = if atom.kind() == &NodeKind::Syntax(SyntaxKind::Name) {
            SyntaxKind::Flag
        } else {
            SyntaxKind::Argument
        };
        let mut b = Builder::new(kind);
        b.node(atom);
        Ok(self.finish(b))
    }

    /// Items until the end of the line.
    pub(crate) fn items(&mut self, b: &mut Builder) -> Result<(), Fault> {
        while !self.at_line_end() {
            b.add(self.tail_item())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::dialect::DialectConfig;
    use crate::syntax::cst::{NodeKind, SyntaxKind};
    use crate::syntax::{parse_expression, SyntaxNode};

    /// Fully parenthesized rendering of an expression tree.
    fn shape(node: SyntaxNode<'_>) -> String {
        match node.production() {
            Some(SyntaxKind::BinaryExpression) => {
                let parts: Vec<_> = node.children().collect();
                let lhs = parts[0].into_node().map(shape).unwrap_or_default();
                let op = parts[1].text();
                let rhs = parts
                    .get(2)
                    .and_then(|p| p.into_node())
                    .map(shape)
                    .unwrap_or_default();
                format!("({lhs} {op} {rhs})")
            }
            Some(SyntaxKind::UnaryExpression) => {
                let parts: Vec<_> = node.children().collect();
                let inner = parts[1].into_node().map(shape).unwrap_or_default();
                format!("({}{inner})", parts[0].text())
            }
            Some(SyntaxKind::TernaryExpression) => {
                let nodes: Vec<_> = node.child_nodes().map(shape).collect();
                format!("({} ? {} : {})", nodes[0], nodes[1], nodes[2])
            }
            _ => node.text().to_string(),
        }
    }

    fn parsed(input: &str) -> String {
        let config = DialectConfig::default();
        let tree = parse_expression(input, &config);
        assert!(!tree.had_errors(), "{input}: {}", tree.dump());
        let expr = tree.statements().next().unwrap();
        shape(expr)
    }

    #[test]
    fn test_power_binds_tightest() {
        assert_eq!(parsed("2 + 3 * 4 ** 2"), "(2 + (3 * (4 ** 2)))");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(parsed("2 ** 3 ** 2"), "(2 ** (3 ** 2))");
    }

    #[test]
    fn test_minus_is_left_associative() {
        assert_eq!(parsed("1 - 2 - 3"), "((1 - 2) - 3)");
    }

    #[test]
    fn test_logical_below_comparison() {
        assert_eq!(parsed("a < b && c == d"), "((a < b) && (c == d))");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(parsed("a > 1 ? b : c + 1"), "((a > 1) ? b : (c + 1))");
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        assert_eq!(parsed("-2 ** 2"), "((-2) ** 2)");
    }

    #[test]
    fn test_call_and_hierarchical_name() {
        let config = DialectConfig::default();
        let tree = parse_expression("v(x1.out, 0) * 2", &config);
        assert!(!tree.had_errors());
        let kinds: Vec<_> = tree
            .root()
            .descendants()
            .filter_map(|n| n.production())
            .collect();
        assert!(kinds.contains(&SyntaxKind::FunctionCall));
        let name = tree
            .root()
            .descendants()
            .filter(|n| n.is(SyntaxKind::Name))
            .nth(1)
            .unwrap();
        assert_eq!(name.text(), "x1.out");
    }

    #[test]
    fn test_missing_operand_is_incomplete() {
        let config = DialectConfig::default();
        let tree = parse_expression("1 +", &config);
        assert!(tree.had_errors());
        let expr = tree.statements().next().unwrap();
        assert_eq!(
            expr.kind(),
            &NodeKind::Incomplete(SyntaxKind::BinaryExpression)
        );
    }
}
