use crate::examples::json::{json_parser, Json};
use crate::rex::Rex;
use crate::symbols::{Group, NonTerminal, Production};
use crate::{fuser, transformer, ChunkSource, GrammarBuilder, ParseStatus, Parser};
use std::rc::Rc;

fn parse_chunked(parser: &Parser<Json>, chunks: &[&str]) -> Result<Json, String> {
    let mut source = ChunkSource::new();
    let mut session = parser.session();
    for (index, chunk) in chunks.iter().enumerate() {
        source.push_chunk(chunk);
        if index + 1 == chunks.len() {
            source.finish();
        }
        match session.advance(&mut source) {
            Ok(ParseStatus::Complete(value)) => {
                assert_eq!(index + 1, chunks.len(), "completed before the final block");
                return Ok(value);
            }
            Ok(ParseStatus::Pending) => continue,
            Err(diagnostic) => return Err(format!("{}", diagnostic)),
        }
    }
    panic!("the final block did not complete the session");
}

#[test]
fn chunked_input_equals_one_shot() {
    let parser = json_parser();
    let one_shot = parser.parse(r#"{"key":42}"#).unwrap();
    let chunked = parse_chunked(&parser, &[r#"{""#, r#"key":"#, "42}"]).unwrap();
    assert_eq!(one_shot, chunked);
}

#[test]
fn every_two_way_partition_agrees_with_one_shot() {
    let parser = json_parser();
    let text = r#"{"a":[1,true,null]}"#;
    let one_shot = parser.parse(text).unwrap();

    for split in 1..text.len() {
        if !text.is_char_boundary(split) {
            continue;
        }
        let chunked = parse_chunked(&parser, &[&text[..split], &text[split..]])
            .unwrap_or_else(|e| panic!("split at {} failed: {}", split, e));
        assert_eq!(one_shot, chunked, "split at {}", split);
    }
}

#[test]
fn chunk_boundaries_inside_tokens_do_not_split_them() {
    let parser = json_parser();
    let value = parse_chunked(&parser, &[r#"{"ab"#, r#"c":tr"#, "ue}"]).unwrap();
    assert_eq!(
        value,
        Json::Object(vec![("abc".to_string(), Json::Bool(true))])
    );
}

#[test]
fn tokens_at_a_block_boundary_wait_for_more_input() {
    // `12` then `34` must come out as the single number 1234.
    let parser = json_parser();
    let value = parse_chunked(&parser, &["12", "34"]).unwrap();
    assert_eq!(value, Json::Number(1234.0));
}

#[test]
fn failures_match_one_shot_positions() {
    let parser = json_parser();
    let text = r#"{"a":}"#;
    let one_shot = parser.parse(text).unwrap_err();

    let mut source = ChunkSource::new();
    let mut session = parser.session();
    source.push_chunk(r#"{"a""#);
    assert!(matches!(
        session.advance(&mut source).unwrap(),
        ParseStatus::Pending
    ));
    source.push_chunk(":}");
    source.finish();
    let chunked = session.advance(&mut source).unwrap_err();

    assert_eq!(one_shot.position, chunked.position);
}

#[test]
fn groups_suspend_and_resume_across_chunks() {
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
    builder.add_noise("Whitespace", Rex::chars([' ']).plus());
    let parser = Parser::new(builder).unwrap();

    let mut source = ChunkSource::new();
    let mut session = parser.session();
    source.push_chunk("{ { in");
    assert!(matches!(
        session.advance(&mut source).unwrap(),
        ParseStatus::Pending
    ));
    source.push_chunk("ner } }");
    source.finish();
    match session.advance(&mut source).unwrap() {
        ParseStatus::Complete(text) => assert_eq!(text, "{ { inner } }"),
        ParseStatus::Pending => panic!("the final block must complete the session"),
    }
}
