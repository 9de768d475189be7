use super::build_dfa;
use crate::grammar::{
    BuildOptions, GrammarDefinition, SymbolKind, SymbolRef, TerminalDef,
};
use crate::rex::{LowerContext, Rex};
use crate::util::CancellationToken;

/// A definition holding only tokenizer symbols, enough to build a DFA.
fn definition(symbols: &[(&str, Rex)]) -> GrammarDefinition {
    let mut lower = LowerContext::new();
    GrammarDefinition {
        name: "Tokens".to_string(),
        case_sensitive: true,
        terminals: symbols
            .iter()
            .map(|(name, rex)| TerminalDef {
                name: name.to_string(),
                rex: Some(lower.lower(rex, true)),
                hidden: false,
                precedence: None,
            })
            .collect(),
        noise: Vec::new(),
        group_starts: Vec::new(),
        group_ends: Vec::new(),
        virtuals: Vec::new(),
        nonterminals: vec!["S".to_string()],
        productions: Vec::new(),
        groups: Vec::new(),
        start_symbol: 0,
    }
}

fn build(symbols: &[(&str, Rex)]) -> super::Dfa {
    build_dfa(
        &definition(symbols),
        &BuildOptions::default(),
        &CancellationToken::new(),
    )
    .unwrap()
}

fn accepts(dfa: &super::Dfa, input: &str) -> Option<u32> {
    dfa.accepts(input).map(|symbol| {
        assert_eq!(symbol.kind, SymbolKind::Terminal);
        symbol.index
    })
}

#[test]
fn literals_and_classes_tokenize_by_longest_match() {
    let dfa = build(&[
        ("if", Rex::string("if")),
        ("Identifier", Rex::chars(['a'..='z']).plus()),
        ("Number", Rex::chars(['0'..='9']).plus()),
    ]);

    assert_eq!(accepts(&dfa, "if"), Some(0));
    assert_eq!(accepts(&dfa, "iffy"), Some(1));
    assert_eq!(accepts(&dfa, "i"), Some(1));
    assert_eq!(accepts(&dfa, "x9"), None);
    assert_eq!(accepts(&dfa, "42"), Some(2));
    assert_eq!(accepts(&dfa, ""), None);
}

#[test]
fn fixed_length_symbols_win_over_looped_ones() {
    // "true" is loop-free (priority 0); the identifier loops (priority 1).
    let dfa = build(&[
        ("true", Rex::string("true")),
        ("Identifier", Rex::chars(['a'..='z']).plus()),
    ]);
    assert_eq!(accepts(&dfa, "true"), Some(0));
    assert_eq!(accepts(&dfa, "truex"), Some(1));
    assert_eq!(accepts(&dfa, "tru"), Some(1));
}

#[test]
fn equal_priority_overlap_is_a_conflict() {
    let errors = build_dfa(
        &definition(&[
            ("First", Rex::chars(['a'..='z']).plus()),
            ("Second", Rex::chars(['a'..='z']).plus()),
        ]),
        &BuildOptions::default(),
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), Some("IndistinguishableSymbols"));
    let message = format!("{}", errors[0]);
    assert!(message.contains("First") && message.contains("Second"));
}

#[test]
fn priority_does_not_mask_conflicts_when_disabled() {
    let options = BuildOptions {
        prioritize_fixed_length_symbols: false,
        ..BuildOptions::default()
    };
    let result = build_dfa(
        &definition(&[
            ("true", Rex::string("true")),
            ("Identifier", Rex::chars(['a'..='z']).plus()),
        ]),
        &options,
        &CancellationToken::new(),
    );
    let errors = result.unwrap_err();
    assert_eq!(errors[0].code(), Some("IndistinguishableSymbols"));
}

#[test]
fn inverted_classes_take_the_default_transition() {
    // A double-quoted string with no escapes.
    let dfa = build(&[(
        "String",
        Rex::concat(vec![
            Rex::char('"'),
            Rex::not_chars(['"']).star(),
            Rex::char('"'),
        ]),
    )]);

    assert_eq!(accepts(&dfa, "\"hello world\""), Some(0));
    assert_eq!(accepts(&dfa, "\"\""), Some(0));
    assert_eq!(accepts(&dfa, "\"unterminated"), None);
    assert_eq!(accepts(&dfa, "\"a\"b\""), None);
}

#[test]
fn suppressed_inverted_ranges_fail_explicitly() {
    // [^0-9] must not fall through to the default on a digit.
    let dfa = build(&[
        ("NotDigit", Rex::not_chars(['0'..='9'])),
        ("Digits", Rex::chars(['0'..='9']).plus()),
    ]);

    assert_eq!(accepts(&dfa, "x"), Some(0));
    assert_eq!(accepts(&dfa, "5"), Some(1));
    assert_eq!(accepts(&dfa, "55"), Some(1));
}

#[test]
fn any_char_matches_everything_once() {
    let dfa = build(&[("Any", Rex::any_char())]);
    assert_eq!(accepts(&dfa, "a"), Some(0));
    assert_eq!(accepts(&dfa, "\u{10FFFF}"), Some(0));
    assert_eq!(accepts(&dfa, "ab"), None);
}

#[test]
fn bounded_loops_accept_only_their_range() {
    let dfa = build(&[("Two2Four", Rex::char('a').between(2, 4))]);
    assert_eq!(accepts(&dfa, "a"), None);
    assert_eq!(accepts(&dfa, "aa"), Some(0));
    assert_eq!(accepts(&dfa, "aaaa"), Some(0));
    assert_eq!(accepts(&dfa, "aaaaa"), None);
}

#[test]
fn alternation_shares_states_between_branches() {
    let dfa = build(&[(
        "Keyword",
        Rex::choice(vec![
            Rex::string("true"),
            Rex::string("false"),
            Rex::string("null"),
        ]),
    )]);
    assert_eq!(accepts(&dfa, "true"), Some(0));
    assert_eq!(accepts(&dfa, "false"), Some(0));
    assert_eq!(accepts(&dfa, "null"), Some(0));
    assert_eq!(accepts(&dfa, "nul"), None);
}

#[test]
fn the_dfa_agrees_with_the_direct_regex_interpretation() {
    let terms = [
        Rex::string("true"),
        Rex::chars(['a'..='z']).plus(),
        Rex::concat(vec![
            Rex::char('"'),
            Rex::not_chars(['"']).star(),
            Rex::char('"'),
        ]),
        Rex::char('a').between(2, 4),
        Rex::concat(vec![
            Rex::chars(['0'..='9']).plus(),
            Rex::concat(vec![Rex::char('.'), Rex::chars(['0'..='9']).plus()]).optional(),
        ]),
        Rex::choice(vec![Rex::string("ab"), Rex::string("abc"), Rex::char('x')]),
    ];
    let samples = [
        "", "a", "t", "tr", "true", "truex", "zebra", "\"\"", "\"hi\"", "\"open", "aa",
        "aaa", "aaaa", "aaaaa", "1", "12.5", "12.", ".5", "ab", "abc", "abcd", "x", "xx",
    ];

    for (index, term) in terms.iter().enumerate() {
        let mut lower = LowerContext::new();
        let lowered = lower.lower(term, true);
        let dfa = build(&[("Probe", term.clone())]);
        for sample in samples {
            assert_eq!(
                lowered.matches(sample),
                accepts(&dfa, sample).is_some(),
                "term {} disagrees on {:?}",
                index,
                sample
            );
        }
    }
}

#[test]
fn case_folding_happens_during_lowering() {
    let mut lower = LowerContext::new();
    let definition = GrammarDefinition {
        name: "Tokens".to_string(),
        case_sensitive: false,
        terminals: vec![TerminalDef {
            name: "Keyword".to_string(),
            rex: Some(lower.lower(&Rex::string("if"), false)),
            hidden: false,
            precedence: None,
        }],
        noise: Vec::new(),
        group_starts: Vec::new(),
        group_ends: Vec::new(),
        virtuals: Vec::new(),
        nonterminals: vec!["S".to_string()],
        productions: Vec::new(),
        groups: Vec::new(),
        start_symbol: 0,
    };
    let dfa = build_dfa(
        &definition,
        &BuildOptions::default(),
        &CancellationToken::new(),
    )
    .unwrap();

    for input in ["if", "IF", "If", "iF"] {
        assert_eq!(dfa.accepts(input), Some(SymbolRef::terminal(0)), "{}", input);
    }
    assert_eq!(dfa.accepts("ix"), None);
}
