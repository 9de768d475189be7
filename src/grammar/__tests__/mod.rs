use crate::rex::Rex;
use crate::symbols::{NonTerminal, Production, Terminal};
use crate::util::CancellationToken;
use crate::{fuser, transformer, GrammarBuilder};
use std::rc::Rc;

fn term(name: &str, rex: Rex) -> Rc<Terminal<()>> {
    Rc::new(Terminal::new(name, rex, transformer(|_, _| Ok(()))))
}

fn noop() -> crate::FuserFn<()> {
    fuser(|_, _| Ok(()))
}

fn codes(diagnostics: &[crate::BuildDiagnostic]) -> Vec<&'static str> {
    diagnostics.iter().filter_map(|d| d.code()).collect()
}

#[test]
fn an_empty_nonterminal_fails_the_build() {
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    let dangling: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Dangling"));
    start.set_productions(vec![Production::new(vec![(&dangling).into()], noop())]);

    let errors = GrammarBuilder::new("G", &start).build().unwrap_err();
    assert!(codes(&errors).contains(&"EmptyNonterminal"));
}

#[test]
fn duplicate_productions_are_rejected() {
    let x = term("x", Rex::string("x"));
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![
        Production::new(vec![(&x).into()], noop()),
        Production::new(vec![(&x).into()], noop()),
    ]);

    let errors = GrammarBuilder::new("G", &start).build().unwrap_err();
    assert!(codes(&errors).contains(&"DuplicateProduction"));
}

#[test]
fn duplicate_terminal_names_are_rejected() {
    let a = term("Same", Rex::string("a"));
    let b = term("Same", Rex::string("b"));
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![
        Production::new(vec![(&a).into()], noop()),
        Production::new(vec![(&b).into()], noop()),
    ]);

    let errors = GrammarBuilder::new("G", &start).build().unwrap_err();
    assert!(codes(&errors).contains(&"DuplicateSpecialName"));
}

#[test]
fn nullable_regexes_are_rejected_at_the_tokenizer_level() {
    let maybe = term("Maybe", Rex::chars(['a'..='z']).star());
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(vec![(&maybe).into()], noop())]);

    let errors = GrammarBuilder::new("G", &start).build().unwrap_err();
    assert!(codes(&errors).contains(&"NullableSymbol"));
}

#[test]
fn void_branches_warn_but_do_not_fail() {
    let odd = term(
        "Odd",
        Rex::choice(vec![Rex::string("a"), Rex::void()]),
    );
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(vec![(&odd).into()], noop())]);

    assert!(GrammarBuilder::new("G", &start).build().is_ok());
}

#[test]
fn equal_literals_collapse_into_one_terminal() {
    let plus_a: Rc<Terminal<()>> = Rc::new(Terminal::literal("+"));
    let plus_b: Rc<Terminal<()>> = Rc::new(Terminal::literal("+"));
    let x = term("x", Rex::string("x"));
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![
        Production::new(vec![(&x).into(), (&plus_a).into(), (&x).into()], noop()),
        Production::new(vec![(&plus_b).into(), (&x).into()], noop()),
    ]);

    let (packed, _) = GrammarBuilder::new("G", &start).build().unwrap();
    let pluses = packed
        .terminals
        .iter()
        .filter(|t| t.name == "'+'")
        .count();
    assert_eq!(pluses, 1);
}

#[test]
fn the_state_cap_fails_the_build() {
    let word = term("Word", Rex::chars(['a'..='z']).plus());
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(vec![(&word).into()], noop())]);

    let mut builder = GrammarBuilder::new("G", &start);
    builder.max_tokenizer_states(1);
    let errors = builder.build().unwrap_err();
    assert!(codes(&errors).contains(&"DfaStateLimitExceeded"));
}

#[test]
fn a_cancelled_build_returns_no_diagnostics() {
    let x = term("x", Rex::string("x"));
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(vec![(&x).into()], noop())]);

    let token = CancellationToken::new();
    token.cancel();
    let mut builder = GrammarBuilder::new("G", &start);
    builder.cancellation_token(token);
    let errors = builder.build().unwrap_err();
    assert!(errors.is_empty());
}

#[test]
fn packed_grammars_list_their_productions() {
    let x = term("x", Rex::string("x"));
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(vec![(&x).into()], noop())]);

    let (packed, _) = GrammarBuilder::new("G", &start).build().unwrap();
    let listing = packed.listing().unwrap();
    assert!(listing.contains("<Start> ::= x"));
    assert_eq!(packed.properties.name, "G");
}
