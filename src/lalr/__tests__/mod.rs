use super::{build_lalr, LrAction};
use crate::error::BuildMessage;
use crate::grammar::{GrammarDefinition, ProductionDef, SymbolRef, TerminalDef};
use crate::symbols::Associativity;
use crate::util::CancellationToken;

fn definition(
    terminals: &[(&str, Option<(usize, Associativity)>)],
    nonterminals: &[&str],
    productions: &[(u32, &[SymbolRef], Option<(usize, Associativity)>)],
) -> GrammarDefinition {
    GrammarDefinition {
        name: "Tables".to_string(),
        case_sensitive: true,
        terminals: terminals
            .iter()
            .map(|(name, precedence)| TerminalDef {
                name: name.to_string(),
                rex: None,
                hidden: false,
                precedence: *precedence,
            })
            .collect(),
        noise: Vec::new(),
        group_starts: Vec::new(),
        group_ends: Vec::new(),
        virtuals: Vec::new(),
        nonterminals: nonterminals.iter().map(|n| n.to_string()).collect(),
        productions: productions
            .iter()
            .map(|(head, handle, precedence)| ProductionDef {
                head: *head,
                handle: handle.to_vec(),
                precedence: *precedence,
            })
            .collect(),
        groups: Vec::new(),
        start_symbol: 0,
    }
}

fn t(index: u32) -> SymbolRef {
    SymbolRef::terminal(index)
}

fn nt(index: u32) -> SymbolRef {
    SymbolRef::nonterminal(index)
}

#[test]
fn a_left_recursive_list_builds_without_conflicts() {
    // S -> S ',' x | x
    let definition = definition(
        &[(",", None), ("x", None)],
        &["S"],
        &[
            (0, &[nt(0), t(0), t(1)], None),
            (0, &[t(1)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    let initial = table.state(super::LalrTable::INITIAL);
    assert!(matches!(initial.action(t(1)), Some(LrAction::Shift(_))));
    assert!(initial.action(t(0)).is_none());
    assert!(initial.goto(0).is_some());
}

#[test]
fn lalr_merging_keeps_the_state_count_small() {
    // An LR(1) automaton for this grammar has more states than its LALR
    // merge; the merged table must stay below the raw LR(1) count.
    // S -> a A | b A ; A -> x x
    let definition = definition(
        &[("a", None), ("b", None), ("x", None)],
        &["S", "A"],
        &[
            (0, &[t(0), nt(1)], None),
            (0, &[t(1), nt(1)], None),
            (1, &[t(2), t(2)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();
    // Cores: start, a, b, x, xx, aA, bA, A-goto... merged x-states appear
    // once, not per context.
    assert!(table.len() <= 9, "expected a merged table, got {} states", table.len());
}

#[test]
fn an_ambiguous_grammar_without_a_scope_reports_shift_reduce() {
    // E -> E '+' E | x
    let definition = definition(
        &[("+", None), ("x", None)],
        &["E"],
        &[
            (0, &[nt(0), t(0), nt(0)], None),
            (0, &[t(1)], None),
        ],
    );
    let errors = build_lalr(&definition, &CancellationToken::new()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        &e.message,
        BuildMessage::LrConflict {
            kind: crate::LrConflictKind::ShiftReduce,
            terminal: Some(name),
            ..
        } if name == "+"
    )));
}

#[test]
fn precedence_resolves_the_dangling_operator() {
    // Same grammar, but '+' is left-associative level 0.
    let prec = Some((0, Associativity::Left));
    let definition = definition(
        &[("+", prec), ("x", None)],
        &["E"],
        &[
            (0, &[nt(0), t(0), nt(0)], prec),
            (0, &[t(1)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    // In the state holding `E -> E + E .`, the '+' lookahead reduces.
    let reducing = table.states.iter().any(|state| {
        matches!(state.action(t(0)), Some(LrAction::Reduce(0)))
    });
    assert!(reducing, "left associativity should reduce on '+'");
}

#[test]
fn right_associativity_shifts_instead() {
    let prec = Some((0, Associativity::Right));
    let definition = definition(
        &[("^", prec), ("x", None)],
        &["E"],
        &[
            (0, &[nt(0), t(0), nt(0)], prec),
            (0, &[t(1)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    let reduces_on_operator = table.states.iter().any(|state| {
        matches!(state.action(t(0)), Some(LrAction::Reduce(0)))
    });
    assert!(!reduces_on_operator, "right associativity should shift on '^'");
}

#[test]
fn non_associative_operators_produce_error_actions() {
    let prec = Some((0, Associativity::NonAssoc));
    let definition = definition(
        &[("==", prec), ("x", None)],
        &["E"],
        &[
            (0, &[nt(0), t(0), nt(0)], prec),
            (0, &[t(1)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    let has_error_action = table.states.iter().any(|state| {
        matches!(state.action(t(0)), Some(LrAction::Error))
    });
    assert!(has_error_action, "NonAssoc ties become parse-time errors");
}

#[test]
fn higher_levels_bind_tighter() {
    // E -> E + E | E * E | x with * on the tighter level.
    let plus = Some((0, Associativity::Left));
    let star = Some((1, Associativity::Left));
    let definition = definition(
        &[("+", plus), ("*", star), ("x", None)],
        &["E"],
        &[
            (0, &[nt(0), t(0), nt(0)], plus),
            (0, &[nt(0), t(1), nt(0)], star),
            (0, &[t(2)], None),
        ],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    // After `E + E .` the '+' lookahead reduces (left associative) while
    // the tighter '*' shifts.
    let after_plus = table.states.iter().any(|state| {
        matches!(state.action(t(0)), Some(LrAction::Reduce(0)))
            && matches!(state.action(t(1)), Some(LrAction::Shift(_)))
    });
    assert!(after_plus);

    // After `E * E .` both lookaheads reduce.
    let after_star = table.states.iter().any(|state| {
        matches!(state.action(t(0)), Some(LrAction::Reduce(1)))
            && matches!(state.action(t(1)), Some(LrAction::Reduce(1)))
    });
    assert!(after_star);
}

#[test]
fn reduce_reduce_conflicts_are_reported() {
    // S -> A | B ; A -> x ; B -> x
    let definition = definition(
        &[("x", None)],
        &["S", "A", "B"],
        &[
            (0, &[nt(1)], None),
            (0, &[nt(2)], None),
            (1, &[t(0)], None),
            (2, &[t(0)], None),
        ],
    );
    let errors = build_lalr(&definition, &CancellationToken::new()).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        &e.message,
        BuildMessage::LrConflict {
            kind: crate::LrConflictKind::ReduceReduce,
            terminal: None,
            ..
        }
    )));
}

#[test]
fn empty_handles_reduce_on_their_lookahead() {
    // S -> A x ; A -> (empty)
    let definition = definition(
        &[("x", None)],
        &["S", "A"],
        &[(0, &[nt(1), t(0)], None), (1, &[], None)],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    let initial = table.state(super::LalrTable::INITIAL);
    assert!(matches!(initial.action(t(0)), Some(LrAction::Reduce(1))));
}

#[test]
fn accept_sits_on_the_eof_action() {
    let definition = definition(
        &[("x", None)],
        &["S"],
        &[(0, &[t(0)], None)],
    );
    let table = build_lalr(&definition, &CancellationToken::new()).unwrap();

    let accepting = table
        .states
        .iter()
        .filter(|state| matches!(state.eof_action, Some(LrAction::Accept)))
        .count();
    assert_eq!(accepting, 1);
}
