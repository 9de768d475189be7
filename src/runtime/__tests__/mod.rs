use crate::rex::Rex;
use crate::symbols::{NonTerminal, Production, Terminal};
use crate::{
    fuser, transformer, ChunkSource, GrammarBuilder, ISource, ParseErrorKind, ParseStatus,
    Parser, Position, StringSource,
};
use std::rc::Rc;

fn word_parser(case_sensitive: bool) -> Parser<String> {
    let keyword = Rc::new(Terminal::new(
        "begin",
        Rex::string("begin"),
        transformer(|_, lexeme| Ok(lexeme.to_string())),
    ));
    let start: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(
        vec![(&keyword).into()],
        fuser(|_, mut values| Ok(values.pop().unwrap())),
    )]);

    let mut builder = GrammarBuilder::new("Words", &start);
    builder.case_sensitive(case_sensitive);
    Parser::new(builder).unwrap()
}

#[test]
fn sources_track_line_and_column() {
    let mut source = StringSource::new("ab\ncd");
    assert_eq!(source.position(), Position::new(1, 1, 0));
    source.consume(2);
    assert_eq!(source.position(), Position::new(1, 3, 2));
    source.consume(1);
    assert_eq!(source.position(), Position::new(2, 1, 3));
    assert_eq!(source.remaining(), "cd");
    assert!(source.is_final_block());
}

#[test]
fn chunk_sources_grow_and_finish() {
    let mut source = ChunkSource::new();
    assert!(!source.is_final_block());
    source.push_chunk("ab");
    source.consume(1);
    source.push_chunk("cd");
    assert_eq!(source.remaining(), "bcd");
    source.finish();
    assert!(source.is_final_block());
}

#[test]
fn case_insensitive_grammars_fold_keywords() {
    let parser = word_parser(false);
    assert_eq!(parser.parse("begin").unwrap(), "begin");
    assert_eq!(parser.parse("BEGIN").unwrap(), "BEGIN");
    assert_eq!(parser.parse("Begin").unwrap(), "Begin");

    let strict = word_parser(true);
    assert!(strict.parse("BEGIN").is_err());
}

#[test]
fn lexical_errors_abbreviate_the_offending_text() {
    let parser = word_parser(true);
    let long_garbage = "!".repeat(80);
    let error = parser.parse(&long_garbage).unwrap_err();
    match &error.kind {
        ParseErrorKind::LexicalError { token_text, .. } => {
            assert_eq!(token_text.chars().count(), 20);
        }
        other => panic!("expected a lexical error, found {:?}", other),
    }

    let error = parser.parse("!@\nrest").unwrap_err();
    match &error.kind {
        ParseErrorKind::LexicalError { token_text, .. } => assert_eq!(token_text, "!@"),
        other => panic!("expected a lexical error, found {:?}", other),
    }
}

#[test]
fn hidden_terminals_stay_out_of_expected_lists() {
    let visible = Rc::new(Terminal::new(
        "Visible",
        Rex::string("v"),
        transformer(|_, _| Ok(())),
    ));
    let hidden = Rc::new(
        Terminal::new("Secret", Rex::string("s"), transformer(|_, _| Ok(()))).hidden(),
    );
    let start: Rc<NonTerminal<()>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![
        Production::new(vec![(&visible).into()], fuser(|_, _| Ok(()))),
        Production::new(vec![(&hidden).into()], fuser(|_, _| Ok(()))),
    ]);
    let parser = Parser::new(GrammarBuilder::new("G", &start)).unwrap();

    let error = parser.parse("x").unwrap_err();
    match &error.kind {
        ParseErrorKind::LexicalError { expected_tokens, .. } => {
            assert!(expected_tokens.iter().any(|e| e == "Visible"));
            assert!(!expected_tokens.iter().any(|e| e == "Secret"));
        }
        other => panic!("expected a lexical error, found {:?}", other),
    }
}

#[test]
fn independent_sessions_do_not_interfere() {
    let parser = word_parser(true);

    let mut first_source = ChunkSource::new();
    let mut second_source = ChunkSource::new();
    let mut first = parser.session();
    let mut second = parser.session();

    first_source.push_chunk("be");
    assert!(matches!(
        first.advance(&mut first_source).unwrap(),
        ParseStatus::Pending
    ));

    second_source.push_chunk("begin");
    second_source.finish();
    match second.advance(&mut second_source).unwrap() {
        ParseStatus::Complete(value) => assert_eq!(value, "begin"),
        ParseStatus::Pending => panic!("the second session had its final block"),
    }

    first_source.push_chunk("gin");
    first_source.finish();
    match first.advance(&mut first_source).unwrap() {
        ParseStatus::Complete(value) => assert_eq!(value, "begin"),
        ParseStatus::Pending => panic!("the first session had its final block"),
    }
}

#[test]
fn token_spans_cover_the_lexeme() {
    let parser = word_parser(true);
    let tokens = parser.tokenize("begin").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].start, Position::new(1, 1, 0));
    assert_eq!(tokens[0].end, Position::new(1, 6, 5));
}

#[test]
fn user_errors_in_transformers_carry_the_token_position() {
    let failing = Rc::new(Terminal::new(
        "Number",
        Rex::chars(['0'..='9']).plus(),
        transformer(|_, lexeme| {
            lexeme
                .parse::<i64>()
                .map_err(|e| e.into())
        }),
    ));
    let start: Rc<NonTerminal<i64>> = Rc::new(NonTerminal::init("Start"));
    start.set_productions(vec![Production::new(
        vec![(&failing).into()],
        fuser(|_, values| Ok(values[0])),
    )]);
    let mut builder = GrammarBuilder::new("G", &start);
    builder.add_noise("Whitespace", Rex::chars([' ']).plus());
    let parser = Parser::new(builder).unwrap();

    // Overflows i64, so the transformer itself fails.
    let error = parser.parse("  99999999999999999999999999").unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::UserDiagnostic(_)));
    assert_eq!(error.position.column, 3);
}
