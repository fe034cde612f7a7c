//! Recursive-descent parser for formula text.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr := mult (('+' | '-') mult)*
//! mult := pow (('*' | '/' | '%') pow)*
//! pow  := atom ('^' atom)*
//! atom := NUMBER | NAME ['(' args ')'] | '-' expr | '+' expr | '(' expr ')'
//! ```
//!
//! Fixed variables are folded into number leaves and renamed variables keep
//! their declared name in the tree. Both are recorded as edits against the
//! source spans and applied after parsing to build the translated text.
//!
//! Both the parser's own recursion and the height of the built tree are capped
//! at [`MAX_DEPTH`], so evaluating or dropping a parsed term stays shallow.

use super::ast::{BinaryOperator, Term};
use super::error::ParseError;
use super::functions::{self, RANDOM};
use super::lexer::{tokenize, Token, TokenKind};
use super::scope::Scope;
use crate::units::Unformat;
use std::ops::Range;

/// Deepest nesting the parser accepts, counting both parser recursion and
/// the height of the resulting term tree.
pub const MAX_DEPTH: usize = 256;

/// Result of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub term: Term,
    /// Source text with fixed-variable and rename substitutions applied
    pub translated: String,
}

/// Replacement of a source span in the translated text.
#[derive(Debug, Clone, PartialEq)]
struct Edit {
    span: Range<usize>,
    replacement: String,
}

/// Parse `input` against the fixed variables and renames of `scope`.
pub fn parse_expression(
    input: &str,
    scope: &Scope,
    units: &dyn Unformat,
) -> Result<Parsed, ParseError> {
    let tokens = tokenize(input, units)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
        scope,
        edits: Vec::new(),
    };
    let term = parser.parse()?;
    let translated = apply_edits(input, &parser.edits);
    Ok(Parsed { term, translated })
}

fn apply_edits(input: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&input[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&input[cursor..]);
    out
}

/// Text substituted for a fixed variable.
///
/// Negative values are parenthesized so the translated text still parses
/// after an operator (`2-y` becomes `2-(-3)`).
pub fn format_value(value: f64) -> String {
    if value.is_sign_negative() {
        format!("({})", value)
    } else {
        format!("{}", value)
    }
}

/// A term together with the height of its tree.
struct Node {
    term: Term,
    height: usize,
}

impl Node {
    fn leaf(term: Term) -> Self {
        Node { term, height: 1 }
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    scope: &'a Scope,
    edits: Vec<Edit>,
}

impl<'a> Parser<'a> {
    fn current(&self) -> &Token {
        // `tokenize` always ends the stream with `End`, and `advance` never moves past it.
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn position(&self) -> usize {
        self.current().span.start
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        if self.current().kind == TokenKind::End {
            return Err(ParseError::new("Unexpected end of expression", self.position()));
        }
        self.index += 1;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
        if self.current().kind != kind {
            return Err(ParseError::new(
                format!("Wrong sequence: expected {:?}, found {:?}", kind, self.current().kind),
                self.position(),
            ));
        }
        self.advance()
    }

    fn too_deep(&self) -> ParseError {
        ParseError::new("Expression nested too deeply", self.position())
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn node(&self, term: Term, height: usize) -> Result<Node, ParseError> {
        if height > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(Node { term, height })
    }

    fn join(&self, op: BinaryOperator, left: Node, right: Node) -> Result<Node, ParseError> {
        let height = left.height.max(right.height) + 1;
        self.node(Term::binary(op, left.term, right.term), height)
    }

    fn parse(&mut self) -> Result<Term, ParseError> {
        let node = self.parse_additive()?;
        if self.current().kind != TokenKind::End {
            return Err(ParseError::new("Unexpected end of expression", self.position()));
        }
        Ok(node.term)
    }

    // Additive: mult (('+' | '-') mult)*
    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.join(op, left, right)?;
        }

        Ok(left)
    }

    // Multiplicative: pow (('*' | '/' | '%') pow)*
    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_power()?;
            left = self.join(op, left, right)?;
        }

        Ok(left)
    }

    // Power: atom ('^' atom)*  (left associative)
    fn parse_power(&mut self) -> Result<Node, ParseError> {
        let mut base = self.parse_atom()?;

        while self.current().kind == TokenKind::Caret {
            self.advance()?;
            let exp = self.parse_atom()?;
            base = self.join(BinaryOperator::Pow, base, exp)?;
        }

        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        let Token { kind, span } = self.current().clone();
        match kind {
            TokenKind::Number(value) => {
                self.advance()?;
                Ok(Node::leaf(Term::Number(value)))
            }
            TokenKind::Name(name) => {
                self.advance()?;
                if self.current().kind == TokenKind::LParen {
                    self.advance()?;
                    self.descend()?;
                    let call = self.parse_call(name)?;
                    self.ascend();
                    Ok(call)
                } else {
                    Ok(Node::leaf(self.reference(name, span)))
                }
            }
            // A leading minus negates everything up to the end of the enclosing expression.
            TokenKind::Minus => {
                self.advance()?;
                self.descend()?;
                let operand = self.parse_additive()?;
                self.ascend();
                self.node(Term::negate(operand.term), operand.height + 1)
            }
            TokenKind::Plus => {
                self.advance()?;
                self.descend()?;
                let operand = self.parse_additive()?;
                self.ascend();
                Ok(operand)
            }
            TokenKind::LParen => {
                self.advance()?;
                self.descend()?;
                let inner = self.parse_additive()?;
                self.expect(TokenKind::RParen)?;
                self.ascend();
                Ok(inner)
            }
            TokenKind::End => Err(ParseError::new("Unexpected end of expression", span.start)),
            other => Err(ParseError::new(
                format!("Unexpected token: {:?}", other),
                span.start,
            )),
        }
    }

    /// Arguments of `name(`, with the opening paren already consumed.
    fn parse_call(&mut self, name: String) -> Result<Node, ParseError> {
        if name == RANDOM {
            self.expect(TokenKind::RParen)?;
            return Ok(Node::leaf(Term::Random));
        }

        let registry = functions::registry();
        if registry.unary(&name).is_some() {
            let arg = self.parse_additive()?;
            self.expect(TokenKind::RParen)?;
            let height = arg.height + 1;
            let term = Term::Function {
                name,
                arg: Box::new(arg.term),
            };
            self.node(term, height)
        } else if registry.binary(&name).is_some() {
            let first = self.parse_additive()?;
            self.expect(TokenKind::Comma)?;
            let second = self.parse_additive()?;
            self.expect(TokenKind::RParen)?;
            let height = first.height.max(second.height) + 1;
            let term = Term::Function2 {
                name,
                first: Box::new(first.term),
                second: Box::new(second.term),
            };
            self.node(term, height)
        } else {
            Err(ParseError::new(
                format!("Function not found: '{}'", name),
                self.position(),
            ))
        }
    }

    /// A bare name: random draw, folded fixed variable, or variable leaf.
    fn reference(&mut self, name: String, span: Range<usize>) -> Term {
        if name == RANDOM {
            return Term::Random;
        }

        if self.scope.is_fixed(&name) {
            let value = self.scope.value(&name).unwrap_or_default();
            self.edits.push(Edit {
                span,
                replacement: format_value(value),
            });
            return Term::Number(value);
        }

        if let Some(display) = self.scope.display_name(&name) {
            if display != name {
                self.edits.push(Edit {
                    span,
                    replacement: display.to_string(),
                });
            }
        }
        Term::Variable(name)
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::units::Architectural;

    fn parse(input: &str) -> Result<Parsed, ParseError> {
        parse_expression(input, &Scope::new(), &Architectural)
    }

    fn term(input: &str) -> Term {
        parse(input).unwrap().term
    }

    fn num(value: f64) -> Term {
        Term::Number(value)
    }

    fn var(name: &str) -> Term {
        Term::Variable(name.to_string())
    }

    #[test]
    fn test_parse_simple_number() {
        assert_eq!(term("42"), num(42.0));
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        assert_eq!(
            term("1 + 2 * 3"),
            Term::binary(
                BinaryOperator::Add,
                num(1.0),
                Term::binary(BinaryOperator::Mul, num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(
            term("(1 + 2) * 3"),
            Term::binary(
                BinaryOperator::Mul,
                Term::binary(BinaryOperator::Add, num(1.0), num(2.0)),
                num(3.0)
            )
        );
    }

    #[test]
    fn test_power_is_left_associative() {
        assert_eq!(
            term("2^3^2"),
            Term::binary(
                BinaryOperator::Pow,
                Term::binary(BinaryOperator::Pow, num(2.0), num(3.0)),
                num(2.0)
            )
        );
    }

    #[test]
    fn test_modulo_binds_like_multiplication() {
        assert_eq!(
            term("1 + 5 % 2"),
            Term::binary(
                BinaryOperator::Add,
                num(1.0),
                Term::binary(BinaryOperator::Mod, num(5.0), num(2.0))
            )
        );
    }

    #[test]
    fn test_leading_minus_literal() {
        assert_eq!(
            term("-3+5"),
            Term::binary(BinaryOperator::Add, num(-3.0), num(5.0))
        );
    }

    #[test]
    fn test_unary_minus_wraps_rest_of_expression() {
        assert_eq!(
            term("-x+1"),
            Term::negate(Term::binary(BinaryOperator::Add, var("x"), num(1.0)))
        );
        assert_eq!(
            term("-(3+5)"),
            Term::negate(Term::binary(BinaryOperator::Add, num(3.0), num(5.0)))
        );
    }

    #[test]
    fn test_unary_plus_is_discarded() {
        assert_eq!(term("+x"), var("x"));
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(
            term("sqrt(16)"),
            Term::Function {
                name: "sqrt".into(),
                arg: Box::new(num(16.0))
            }
        );
        assert_eq!(
            term("MAX(1, x)"),
            Term::Function2 {
                name: "max".into(),
                first: Box::new(num(1.0)),
                second: Box::new(var("x"))
            }
        );
    }

    #[test]
    fn test_random_forms() {
        assert_eq!(term("random()"), Term::Random);
        assert_eq!(term("Random"), Term::Random);
        assert!(parse("random(1)").is_err());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(term("PI"), var("pi"));
    }

    #[test]
    fn test_unknown_function_error() {
        let err = parse("mystery(5)").unwrap_err();
        assert!(err.message.contains("Function not found"));
    }

    #[test]
    fn test_binary_function_needs_comma() {
        assert!(parse("max(1 2)").is_err());
        assert!(parse("max(1)").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("(1 + 2").is_err());
        assert!(parse("1 +").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("2*-3").is_err());
        assert!(parse("1 )").is_err());
    }

    #[test]
    fn test_translated_text_without_substitutions() {
        let parsed = parse("  Width * 2 ").unwrap();
        assert_eq!(parsed.translated, "  Width * 2 ");
    }

    #[test]
    fn test_fixed_variable_is_folded() {
        let mut scope = Scope::new();
        scope.declare("y", 5.0);
        scope.mark_fixed("y");

        let parsed = parse_expression("Y+1", &scope, &Architectural).unwrap();
        assert_eq!(parsed.term, Term::binary(BinaryOperator::Add, num(5.0), num(1.0)));
        assert_eq!(parsed.translated, "5+1");
    }

    #[test]
    fn test_rename_rewrites_text_only() {
        let mut scope = Scope::new();
        scope.declare("old", 2.0);
        scope.rename("old", "new");

        let parsed = parse_expression("old + old*2", &scope, &Architectural).unwrap();
        assert_eq!(parsed.translated, "new + new*2");
        assert_eq!(
            parsed.term,
            Term::binary(
                BinaryOperator::Add,
                var("old"),
                Term::binary(BinaryOperator::Mul, var("old"), num(2.0))
            )
        );
    }

    #[test]
    fn test_identity_rename_keeps_source_case() {
        let mut scope = Scope::new();
        scope.declare("x", 1.0);
        let parsed = parse_expression("X", &scope, &Architectural).unwrap();
        assert_eq!(parsed.translated, "X");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5.0), "5");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(-3.0), "(-3)");
    }

    #[test]
    fn test_negative_fixed_value_translates_to_parsable_text() {
        let mut scope = Scope::new();
        scope.declare("y", -3.0);
        scope.mark_fixed("y");

        let parsed = parse_expression("2-y", &scope, &Architectural).unwrap();
        assert_eq!(parsed.translated, "2-(-3)");
        assert_eq!(
            parse(&parsed.translated).unwrap().term,
            Term::binary(BinaryOperator::Sub, num(2.0), num(-3.0))
        );
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let input = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&input).unwrap_err();
        assert_eq!(err.message, "Expression nested too deeply");
        assert!(err.position <= MAX_DEPTH + 1);
    }

    #[test]
    fn test_deep_prefix_and_call_chains_are_rejected() {
        let minus = format!("{}x{}", "-(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&minus).unwrap_err();
        assert_eq!(err.message, "Expression nested too deeply");

        let calls = format!("{}1{}", "abs(".repeat(100_000), ")".repeat(100_000));
        let err = parse(&calls).unwrap_err();
        assert_eq!(err.message, "Expression nested too deeply");
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        let input = format!("{}1", "1+".repeat(100_000));
        let err = parse(&input).unwrap_err();
        assert_eq!(err.message, "Expression nested too deeply");
    }

    #[test]
    fn test_nesting_within_limit_parses() {
        let depth = MAX_DEPTH - 1;
        let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(term(&input), var("x"));

        let input = format!("{}1", "1+".repeat(100));
        assert!(parse(&input).is_ok());
    }
}
