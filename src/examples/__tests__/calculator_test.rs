use crate::examples::calculator::calculator_parser;
use crate::rex::Rex;
use crate::symbols::{Associativity, NonTerminal, OperatorLevel, OperatorScope, Production, Terminal};
use crate::{fuser, transformer, GrammarBuilder, ParseErrorKind, Parser};
use std::rc::Rc;

#[test]
fn multiplication_binds_tighter_than_addition() {
    let parser = calculator_parser();
    assert_eq!(parser.parse("1+2*3").unwrap(), 7);
    assert_eq!(parser.parse("2*3+4").unwrap(), 10);
    assert_eq!(parser.parse("8/2/2").unwrap(), 2);
}

#[test]
fn subtraction_is_left_associative() {
    let parser = calculator_parser();
    assert_eq!(parser.parse("1-2-3").unwrap(), -4);
    assert_eq!(parser.parse("10-2+3").unwrap(), 11);
}

#[test]
fn unary_minus_binds_tightest() {
    let parser = calculator_parser();
    assert_eq!(parser.parse("-1+2").unwrap(), 1);
    assert_eq!(parser.parse("-2*3").unwrap(), -6);
    assert_eq!(parser.parse("--4").unwrap(), 4);
}

#[test]
fn parentheses_override_precedence() {
    let parser = calculator_parser();
    assert_eq!(parser.parse("2*(3+4)").unwrap(), 14);
    assert_eq!(parser.parse("(1-2)-3").unwrap(), -4);
}

#[test]
fn division_by_zero_surfaces_the_callback_error() {
    let parser = calculator_parser();
    let error = parser.parse("1/0").unwrap_err();
    match &error.kind {
        ParseErrorKind::UserDiagnostic(inner) => {
            assert_eq!(format!("{}", inner), "division by zero")
        }
        other => panic!("expected a user diagnostic, found {:?}", other),
    }
}

#[test]
fn dangling_operator_is_a_syntax_error() {
    let parser = calculator_parser();
    let error = parser.parse("1+*2").unwrap_err();
    match &error.kind {
        ParseErrorKind::SyntaxError { actual, .. } => assert_eq!(actual.as_deref(), Some("'*'")),
        other => panic!("expected a syntax error, found {:?}", other),
    }
    assert_eq!(error.position.column, 3);
}

/// A chain of a non-associative operator fails at parse time, not at build
/// time.
fn comparison_parser() -> Parser<i64> {
    let number = Rc::new(Terminal::new(
        "Number",
        Rex::chars(['0'..='9']).plus(),
        transformer(|_, lexeme| Ok(lexeme.parse::<i64>()?)),
    ));
    let eq = Rc::new(Terminal::literal("=="));

    let expr: Rc<NonTerminal<i64>> = Rc::new(NonTerminal::init("Expr"));
    expr.set_productions(vec![
        Production::new(
            vec![(&expr).into(), (&eq).into(), (&expr).into()],
            fuser(|_, values| Ok((values[0] == values[2]) as i64)),
        ),
        Production::new(vec![(&number).into()], fuser(|_, values| Ok(values[0]))),
    ]);

    let mut builder = GrammarBuilder::new("Comparisons", &expr);
    builder.operator_scope(OperatorScope::new(vec![OperatorLevel::literals(
        Associativity::NonAssoc,
        &["=="],
    )]));
    Parser::new(builder).unwrap()
}

#[test]
fn non_associative_chains_fail_when_parsed() {
    let parser = comparison_parser();
    assert_eq!(parser.parse("1==1").unwrap(), 1);
    assert_eq!(parser.parse("1==2").unwrap(), 0);

    let error = parser.parse("1==2==3").unwrap_err();
    match &error.kind {
        ParseErrorKind::SyntaxError { actual, .. } => assert_eq!(actual.as_deref(), Some("'=='")),
        other => panic!("expected a syntax error, found {:?}", other),
    }
}
