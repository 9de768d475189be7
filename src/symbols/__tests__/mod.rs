use super::{Associativity, Group, NonTerminal, OperatorLevel, OperatorScope, Production, Terminal};
use crate::{fuser, transformer};
use std::rc::Rc;

fn noop() -> crate::FuserFn<()> {
    fuser(|_, _| Ok(()))
}

#[test]
fn the_first_production_assignment_wins() {
    let x = Rc::new(Terminal::new(
        "x",
        crate::rex::Rex::string("x"),
        transformer(|_, _| Ok(())),
    ));
    let nt: NonTerminal<()> = NonTerminal::init("A");
    nt.set_productions(vec![Production::new(vec![(&x).into()], noop())]);
    nt.set_productions(vec![
        Production::new(vec![(&x).into()], noop()),
        Production::new(vec![], noop()),
    ]);

    assert_eq!(nt.productions().unwrap().len(), 1);
    assert_eq!(nt.ignored_assignments(), 1);
}

#[test]
fn literals_are_named_by_their_text() {
    let plus: Terminal<()> = Terminal::literal("+");
    assert_eq!(plus.name(), "'+'");
    assert_eq!(plus.literal_text(), Some("+"));

    let named: Terminal<()> = Terminal::new(
        "Plus",
        crate::rex::Rex::string("+"),
        transformer(|_, _| Ok(())),
    );
    assert_eq!(named.literal_text(), None);
}

#[test]
fn group_constructors_set_the_expected_attributes() {
    let line: Group<()> = Group::line("Comment", "//");
    assert!(line.attributes().ends_on_eof);
    assert!(line.attributes().advance_by_char);
    assert!(!line.attributes().keep_end_token);

    let block: Group<()> = Group::block("Block", "{", "}");
    assert!(!block.attributes().ends_on_eof);
    assert!(block.attributes().keep_end_token);

    let noise = block.noise();
    assert!(noise.attributes().is_noise);
}

#[test]
fn nesting_is_recorded_by_name() {
    let outer: Rc<Group<()>> = Rc::new(Group::block("Outer", "{", "}"));
    let inner: Rc<Group<()>> = Rc::new(Group::block("Inner", "[", "]"));
    outer.allow_nested(&inner);
    outer.allow_self_nesting();

    assert_eq!(outer.nested_names(), vec!["Inner".to_string(), "Outer".to_string()]);
}

#[test]
fn operator_scope_lookup_reports_level_and_associativity() {
    let scope = OperatorScope::new(vec![
        OperatorLevel::literals(Associativity::Left, &["+", "-"]),
        OperatorLevel::literals(Associativity::Right, &["^"]),
        OperatorLevel::tags(Associativity::PrecedenceOnly, &["negate"]),
    ]);

    assert_eq!(scope.find_literal("+"), Some((0, Associativity::Left)));
    assert_eq!(scope.find_literal("^"), Some((1, Associativity::Right)));
    assert_eq!(scope.find_literal("%"), None);
    assert_eq!(scope.find_tag("negate"), Some((2, Associativity::PrecedenceOnly)));
    assert_eq!(scope.find_tag("+"), None);
}

#[test]
fn precedence_tags_ride_on_productions() {
    let x = Rc::new(Terminal::new(
        "x",
        crate::rex::Rex::string("x"),
        transformer(|_, _| Ok(())),
    ));
    let production: Production<()> =
        Production::new(vec![(&x).into()], noop()).with_precedence("negate");
    assert_eq!(production.precedence_tag(), Some("negate"));
}
