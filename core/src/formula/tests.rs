//! End-to-end behaviour of the formula language.

use super::*;

fn eval(text: &str) -> f64 {
    let mut expression = Expression::new();
    expression.set_expression(text).unwrap();
    expression.evaluate().unwrap()
}

#[test]
fn test_arithmetic_precedence() {
    assert!((eval("2+3*4") - 14.0).abs() < 1e-10);
    assert!((eval("(2+3)*4") - 20.0).abs() < 1e-10);
}

#[test]
fn test_power_is_left_associative() {
    assert!((eval("2^3^2") - 64.0).abs() < 1e-10);
}

#[test]
fn test_leading_minus_and_negated_group() {
    assert!((eval("-3+5") - 2.0).abs() < 1e-10);
    assert!((eval("-(3+5)") + 8.0).abs() < 1e-10);
}

#[test]
fn test_modulo_of_rounded_operands() {
    assert_eq!(eval("5.6%2"), 0.0);
}

#[test]
fn test_variables_are_read_live() {
    let mut expression = Expression::new();
    expression.declare_variable("x", 10.0).unwrap();
    expression.set_expression("x*2").unwrap();
    assert_eq!(expression.evaluate(), Some(20.0));

    expression.declare_variable("X", 3.0).unwrap();
    assert_eq!(expression.evaluate(), Some(6.0));
}

#[test]
fn test_fixed_variable_is_folded_into_text_and_tree() {
    let mut expression = Expression::new();
    expression.declare_fixed_variable("y", 5.0).unwrap();
    expression.set_expression("y+1").unwrap();

    assert_eq!(expression.translated_text(), "5+1");
    assert_eq!(expression.evaluate(), Some(6.0));
    assert!(expression.is_const_expression());

    // The folded value is a parse-time snapshot.
    expression.declare_fixed_variable("y", 50.0).unwrap();
    assert_eq!(expression.evaluate(), Some(6.0));
}

#[test]
fn test_rename_changes_text_not_lookup() {
    let mut expression = Expression::new();
    expression.declare_variable("old", 4.0).unwrap();
    expression.rename_variable("old", "new");
    expression.set_expression("old+1").unwrap();

    assert_eq!(expression.translated_text(), "new+1");
    assert_eq!(expression.evaluate(), Some(5.0));

    let mut names = Vec::new();
    expression.collect_variables(&mut names);
    assert_eq!(names, vec!["old"]);
}

#[test]
fn test_redeclare_resets_rename() {
    let mut expression = Expression::new();
    expression.declare_variable("old", 4.0).unwrap();
    expression.rename_variable("old", "new");
    expression.declare_variable("old", 5.0).unwrap();
    expression.set_expression("old+1").unwrap();
    assert_eq!(expression.translated_text(), "old+1");
}

#[test]
fn test_collect_variables_skips_constants() {
    let mut expression = Expression::new();
    expression.set_expression("x+y+pi").unwrap();

    let mut names = Vec::new();
    expression.collect_variables(&mut names);
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn test_collect_variables_keeps_seeded_entries() {
    let mut expression = Expression::new();
    expression.set_expression("a * b + a").unwrap();

    let mut names = vec!["b".to_string(), "z".to_string()];
    expression.collect_variables(&mut names);
    assert_eq!(names, vec!["b", "z", "a"]);
}

#[test]
fn test_const_expression_detection() {
    let mut expression = Expression::new();

    expression.set_expression("2+3*sin(1)").unwrap();
    assert!(expression.is_const_expression());

    expression.set_expression("x+1").unwrap();
    assert!(!expression.is_const_expression());

    expression.set_expression("random()+1").unwrap();
    assert!(!expression.is_const_expression());
}

#[test]
fn test_variable_named_like_expression_is_duplicate() {
    let mut expression = Expression::new();
    expression.set_name("total").unwrap();
    assert_eq!(
        expression.declare_variable("total", 1.0),
        Err(FormulaError::DuplicateKey("total".into()))
    );
}

#[test]
fn test_translated_text_round_trip() {
    let sources = [
        "2 + 3 * 4",
        "-(x + 1) * max(2, y) % 3",
        "5'-6 1/2\" / 2",
        "sqrt(2) ^ 2 - 10-1/2",
        "(-3) + e * pi",
    ];
    for source in sources {
        let mut expression = Expression::new();
        expression.declare_variable("x", 1.5).unwrap();
        expression.declare_variable("y", 7.0).unwrap();
        expression.set_expression(source).unwrap();
        let first = expression.evaluate().unwrap();

        let translated = expression.translated_text().to_string();
        expression.set_expression(&translated).unwrap();
        assert_eq!(expression.evaluate(), Some(first), "round trip of '{}'", source);
    }
}

#[test]
fn test_architectural_lengths_in_formulas() {
    let mut expression = Expression::new();
    expression.declare_variable("count", 3.0).unwrap();
    expression.set_expression("count * 2'-6\" + 1/2'").unwrap();
    // 3 * 30 + 6
    assert!((expression.evaluate().unwrap() - 96.0).abs() < 1e-10);
}

#[test]
fn test_invalid_inputs_collapse_to_one_kind() {
    let mut expression = Expression::new();
    for text in ["", "1 +", "(1", "max(1)", "foo(1)", "1 $ 2", "1 2", "1.2.3", "2*-3"] {
        assert!(
            matches!(expression.set_expression(text), Err(FormulaError::InvalidInput(_))),
            "'{}' should be rejected",
            text
        );
    }
}

#[test]
fn test_term_serialization_round_trip() {
    let mut expression = Expression::new();
    expression.set_expression("max(a, 2) * (-(b + 1))").unwrap();
    let term = expression.term().unwrap();

    let json = serde_json::to_string(term).unwrap();
    let restored: Term = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, term);
}
