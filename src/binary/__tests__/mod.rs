use super::{read_grammar, write_grammar, MAGIC};
use crate::error::FormatError;
use crate::rex::Rex;
use crate::symbols::{Group, NonTerminal, Production, Terminal};
use crate::{fuser, transformer, GrammarBuilder, PackedGrammar, Parser, SemanticTables};
use std::rc::Rc;

fn sample_grammar() -> (PackedGrammar, SemanticTables<String>) {
    let x = Rc::new(Terminal::new(
        "x",
        Rex::chars(['a'..='z']).plus(),
        transformer(|_, lexeme| Ok(lexeme.to_string())),
    ));
    let comma = Rc::new(Terminal::literal(","));
    let block = Rc::new(
        Group::block("Braces", "{", "}")
            .with_transformer(transformer(|_, text| Ok(text.to_string()))),
    );
    block.allow_self_nesting();

    let list: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("List"));
    let item: Rc<NonTerminal<String>> = Rc::new(NonTerminal::init("Item"));
    list.set_productions(vec![
        Production::new(
            vec![(&item).into()],
            fuser(|_, mut values| Ok(values.pop().unwrap())),
        ),
        Production::new(
            vec![(&list).into(), (&comma).into(), (&item).into()],
            fuser(|_, values| Ok(format!("{},{}", values[0], values[2]))),
        ),
    ]);
    item.set_productions(vec![
        Production::new(
            vec![(&x).into()],
            fuser(|_, mut values| Ok(values.pop().unwrap())),
        ),
        Production::new(
            vec![(&block).into()],
            fuser(|_, mut values| Ok(values.pop().unwrap())),
        ),
    ]);

    let mut builder = GrammarBuilder::new("Sample", &list);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t']).plus());
    builder.add_line_comment("//");
    builder.build().unwrap()
}

#[test]
fn the_stream_round_trips_byte_for_byte() {
    let (grammar, _) = sample_grammar();
    let written = write_grammar(&grammar);
    let reloaded = read_grammar(&written).unwrap();
    assert_eq!(reloaded, grammar);

    let rewritten = write_grammar(&reloaded);
    assert_eq!(written, rewritten);
}

#[test]
fn logically_equal_grammars_write_identical_streams() {
    let (first, _) = sample_grammar();
    let (second, _) = sample_grammar();
    assert_eq!(write_grammar(&first), write_grammar(&second));
}

#[test]
fn a_loaded_grammar_parses_like_the_built_one() {
    let (grammar, tables) = sample_grammar();
    let stream = write_grammar(&grammar);
    let reloaded = read_grammar(&stream).unwrap();

    let parser = Parser::from_packed(Rc::new(reloaded), tables);
    assert_eq!(
        parser.parse("a, { b, c }, d // trailing").unwrap(),
        "a,{ b, c },d"
    );
}

#[test]
fn foreign_streams_are_rejected() {
    assert_eq!(read_grammar(b"not a grammar"), Err(FormatError::InvalidMagic));
    assert_eq!(read_grammar(b""), Err(FormatError::InvalidMagic));
}

#[test]
fn unknown_versions_are_rejected() {
    let (grammar, _) = sample_grammar();
    let mut stream = write_grammar(&grammar);
    stream[MAGIC.len()] = 0xFF;
    stream[MAGIC.len() + 1] = 0xFF;
    assert_eq!(
        read_grammar(&stream),
        Err(FormatError::UnsupportedVersion(0xFFFF))
    );
}

#[test]
fn truncated_streams_are_rejected() {
    let (grammar, _) = sample_grammar();
    let stream = write_grammar(&grammar);
    assert_eq!(
        read_grammar(&stream[..stream.len() - 1]),
        Err(FormatError::TruncatedRecord)
    );
    assert_eq!(
        read_grammar(&stream[..MAGIC.len() + 3]),
        Err(FormatError::TruncatedRecord)
    );
    // A cut anywhere in the body never passes for a whole grammar.
    assert!(read_grammar(&stream[..stream.len() / 2]).is_err());
}

#[test]
fn unknown_entry_tags_are_rejected() {
    let (grammar, _) = sample_grammar();
    let mut stream = write_grammar(&grammar);
    // The first record's first entry tag sits right after the stream
    // header, the record length and the record tag.
    let first_entry = MAGIC.len() + 2 + 4 + 1;
    stream[first_entry] = 0x77;
    assert_eq!(read_grammar(&stream), Err(FormatError::UnknownEntryTag(0x77)));
}
