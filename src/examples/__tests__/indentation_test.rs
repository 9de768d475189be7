use crate::examples::indentation::indentation_parser;
use crate::ParseErrorKind;

#[test]
fn indentation_becomes_virtual_block_tokens() {
    let parser = indentation_parser();
    let tokens = parser.tokenize("A\n    B\n    C\n        D\n").unwrap();

    let names: Vec<String> = tokens
        .iter()
        .map(|token| parser.grammar().symbol_name(token.symbol))
        .collect();
    assert_eq!(
        names,
        vec![
            "Name",
            "BlockStart",
            "Name",
            "Name",
            "BlockStart",
            "Name",
            "BlockEnd",
            "BlockEnd"
        ]
    );
}

#[test]
fn blocks_nest_in_the_parsed_tree() {
    let parser = indentation_parser();
    let tree = parser.parse("A\n    B\n    C\n        D\n").unwrap();

    // A owns the outer block; C owns the block around D.
    let a_item = tree.find("Item").expect("A should own a block");
    assert_eq!(a_item.children()[0].name(), Some("Name"));
    let a_block = &a_item.children()[1];
    assert_eq!(a_block.name(), Some("Block"));
    let c_item = a_block.find("Item").expect("C nests inside A's block");
    assert_eq!(c_item.children()[1].name(), Some("Block"));
}

#[test]
fn flat_input_needs_no_blocks() {
    let parser = indentation_parser();
    let tokens = parser.tokenize("A\nB\nC\n").unwrap();
    assert_eq!(tokens.len(), 3);
    assert!(parser.parse("A\nB\nC\n").is_ok());
}

#[test]
fn blank_lines_do_not_change_the_level() {
    let parser = indentation_parser();
    let tokens = parser.tokenize("A\n\n    B\n\n    C\n").unwrap();
    let names: Vec<String> = tokens
        .iter()
        .map(|token| parser.grammar().symbol_name(token.symbol))
        .collect();
    assert_eq!(
        names,
        vec!["Name", "BlockStart", "Name", "Name", "BlockEnd"]
    );
}

#[test]
fn mismatched_dedent_is_a_user_diagnostic() {
    let parser = indentation_parser();
    let error = parser.parse("A\n    B\n   C\n").unwrap_err();

    match &error.kind {
        ParseErrorKind::UserDiagnostic(inner) => assert_eq!(
            format!("{}", inner),
            "unindent does not match any outer indentation level"
        ),
        other => panic!("expected a user diagnostic, found {:?}", other),
    }
    assert_eq!(error.position.line, 3);
    assert_eq!(error.position.column, 4);
}

#[test]
fn missing_dedents_are_emitted_at_end_of_input() {
    let parser = indentation_parser();
    // No trailing newline after the deepest line.
    let tokens = parser.tokenize("A\n    B\n        D").unwrap();
    let names: Vec<String> = tokens
        .iter()
        .map(|token| parser.grammar().symbol_name(token.symbol))
        .collect();
    assert_eq!(
        names,
        vec![
            "Name",
            "BlockStart",
            "Name",
            "BlockStart",
            "Name",
            "BlockEnd",
            "BlockEnd"
        ]
    );
}
