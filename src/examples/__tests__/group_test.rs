use crate::rex::Rex;
use crate::symbols::{Group, NonTerminal, Production, Terminal};
use crate::{fuser, transformer, GrammarBuilder, ParseErrorKind, Parser};
use std::rc::Rc;

/// `x` with a `//` line comment.
fn line_comment_parser() -> Parser<String> {
    let x = Rc::new(Terminal::new(
        "x",
        Rex::string("x"),
        transformer(|_, lexeme| Ok(lexeme.to_string())),
    ));
    let start: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(
        vec![(&x).into()],
        fuser(|_, mut values| Ok(values.pop().unwrap())),
    )]);

    let mut builder = GrammarBuilder::new("LineComments", &start);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t']).plus());
    builder.add_line_comment("//");
    Parser::new(builder).unwrap()
}

#[test]
fn line_comment_is_discarded() {
    let parser = line_comment_parser();
    assert_eq!(parser.parse("x // remainder").unwrap(), "x");

    let tokens = parser.tokenize("x // remainder").unwrap();
    assert_eq!(tokens.len(), 1);
}

#[test]
fn line_comment_at_end_of_input_needs_no_newline() {
    let parser = line_comment_parser();
    assert_eq!(parser.parse("x //").unwrap(), "x");
    assert_eq!(parser.parse("x // no newline here").unwrap(), "x");
}

#[test]
fn line_comment_ends_at_the_line_break() {
    let x = Rc::new(Terminal::new(
        "x",
        Rex::string("x"),
        transformer(|_, lexeme| Ok(lexeme.to_string())),
    ));
    let list: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("List"));
    list.set_productions(vec![
        Production::new(
            vec![(&x).into()],
            fuser(|_, mut values| Ok(values.pop().unwrap())),
        ),
        Production::new(
            vec![(&list).into(), (&x).into()],
            fuser(|_, values| Ok(format!("{}{}", values[0], values[1]))),
        ),
    ]);

    // With a line group in the grammar the shared NewLine symbol tokenizes
    // the line breaks; plain whitespace stays within the line.
    let mut builder = GrammarBuilder::new("LineComments", &list);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t']).plus());
    builder.add_line_comment("//");
    let parser = Parser::new(builder).unwrap();

    assert_eq!(parser.parse("x // comment\nx x").unwrap(), "xxx");
}

/// A nestable `{` ... `}` block delivered as one container token.
fn block_group_parser() -> Parser<String> {
    let group = Rc::new(
        Group::block("Block Group", "{", "}")
            .with_transformer(transformer(|_, text| Ok(text.to_string()))),
    );
    group.allow_self_nesting();

    let start: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(
        vec![(&group).into()],
        fuser(|_, mut values| Ok(values.pop().unwrap())),
    )]);

    let mut builder = GrammarBuilder::new("Blocks", &start);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t', '\r', '\n']).plus());
    Parser::new(builder).unwrap()
}

#[test]
fn nested_blocks_come_back_as_one_token() {
    let parser = block_group_parser();
    assert_eq!(parser.parse("{ { inner } }").unwrap(), "{ { inner } }");
    assert_eq!(parser.parse("{}").unwrap(), "{}");
    assert_eq!(parser.parse("{ a { b { c } } d }").unwrap(), "{ a { b { c } } d }");
}

#[test]
fn unterminated_block_reports_the_group() {
    let parser = block_group_parser();
    let error = parser.parse("{ { inner }").unwrap_err();
    match &error.kind {
        ParseErrorKind::UnexpectedEndOfInputInGroup { group_name } => {
            assert_eq!(group_name, "Block Group")
        }
        other => panic!("expected a group error, found {:?}", other),
    }
    // The diagnostic points at the end of the input.
    assert_eq!(error.position.index, "{ { inner }".chars().count());
}

#[test]
fn block_comments_are_noise() {
    let x = Rc::new(Terminal::new(
        "x",
        Rex::string("x"),
        transformer(|_, lexeme| Ok(lexeme.to_string())),
    ));
    let pair: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("Pair"));
    pair.set_productions(vec![Production::new(
        vec![(&x).into(), (&x).into()],
        fuser(|_, values| Ok(format!("{}{}", values[0], values[1]))),
    )]);

    let mut builder = GrammarBuilder::new("BlockComments", &pair);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t', '\r', '\n']).plus());
    builder.add_block_comment("/*", "*/");
    let parser = Parser::new(builder).unwrap();

    assert_eq!(parser.parse("x /* a\nmultiline\ncomment */ x").unwrap(), "xx");
}

#[test]
fn stray_group_end_is_a_lexical_error() {
    let parser = block_group_parser();
    let error = parser.parse("} {}").unwrap_err();
    match &error.kind {
        ParseErrorKind::LexicalError { token_text, .. } => assert_eq!(token_text, "}"),
        other => panic!("expected a lexical error, found {:?}", other),
    }
}
