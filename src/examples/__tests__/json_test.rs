use crate::examples::json::{json_parser, Json};
use crate::ParseErrorKind;

fn from_serde(value: &serde_json::Value) -> Json {
    match value {
        serde_json::Value::Null => Json::Null,
        serde_json::Value::Bool(b) => Json::Bool(*b),
        serde_json::Value::Number(n) => Json::Number(n.as_f64().unwrap()),
        serde_json::Value::String(s) => Json::String(s.clone()),
        serde_json::Value::Array(items) => Json::Array(items.iter().map(from_serde).collect()),
        serde_json::Value::Object(members) => Json::Object(
            members
                .iter()
                .map(|(key, value)| (key.clone(), from_serde(value)))
                .collect(),
        ),
    }
}

/// serde_json's default map sorts keys; order object members the same way
/// before comparing.
fn key_sorted(value: Json) -> Json {
    match value {
        Json::Array(items) => Json::Array(items.into_iter().map(key_sorted).collect()),
        Json::Object(members) => {
            let mut members: Vec<(String, Json)> = members
                .into_iter()
                .map(|(key, value)| (key, key_sorted(value)))
                .collect();
            members.sort_by(|a, b| a.0.cmp(&b.0));
            Json::Object(members)
        }
        other => other,
    }
}

#[test]
fn token_sequence_of_a_small_document() {
    let parser = json_parser();
    let tokens = parser.tokenize(r#"{"a":[1,true,null]}"#).unwrap();

    let names: Vec<String> = tokens
        .iter()
        .map(|token| parser.grammar().symbol_name(token.symbol))
        .collect();
    assert_eq!(
        names,
        vec!["'{'", "String", "':'", "'['", "Number", "','", "true", "','", "null", "']'", "'}'"]
    );

    assert_eq!(tokens[1].value, Json::String("a".to_string()));
    assert_eq!(tokens[4].value, Json::Number(1.0));
    assert_eq!(tokens[6].value, Json::Bool(true));
    assert_eq!(tokens[8].value, Json::Null);
}

#[test]
fn parses_into_the_structured_value() {
    let parser = json_parser();
    let value = parser.parse(r#"{"a":[1,true,null]}"#).unwrap();

    let reference: serde_json::Value = serde_json::from_str(r#"{"a":[1,true,null]}"#).unwrap();
    assert_eq!(key_sorted(value), from_serde(&reference));
}

#[test]
fn parses_nested_documents() {
    let parser = json_parser();
    let text = r#"
    {
        "name": "lang-lr",
        "versions": [1, 2.5, -3e2],
        "meta": { "draft": false, "tags": ["a", "b"] },
        "empty_list": [],
        "empty_object": {}
    }
    "#;
    let value = parser.parse(text).unwrap();
    let reference: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(key_sorted(value), from_serde(&reference));
}

#[test]
fn string_escapes_are_decoded() {
    let parser = json_parser();
    let value = parser.parse(r#""a\n\t\"A""#).unwrap();
    assert_eq!(value, Json::String("a\n\t\"A".to_string()));
}

#[test]
fn missing_member_value_is_a_syntax_error_at_the_brace() {
    let parser = json_parser();
    let error = parser.parse(r#"{"a":}"#).unwrap_err();

    assert_eq!(error.position.line, 1);
    assert_eq!(error.position.column, 6);
    match &error.kind {
        ParseErrorKind::SyntaxError {
            actual, expected, ..
        } => {
            assert_eq!(actual.as_deref(), Some("'}'"));
            for name in ["String", "Number", "'{'", "'['", "true", "false", "null"] {
                assert!(
                    expected.iter().any(|e| e == name),
                    "expected token list {:?} should include {}",
                    expected,
                    name
                );
            }
        }
        other => panic!("expected a syntax error, found {:?}", other),
    }
}

#[test]
fn empty_input_fails_with_eof() {
    let parser = json_parser();
    let error = parser.parse("").unwrap_err();
    match &error.kind {
        ParseErrorKind::SyntaxError { actual, .. } => assert!(actual.is_none()),
        other => panic!("expected a syntax error, found {:?}", other),
    }
}

#[test]
fn syntax_check_agrees_with_parse() {
    let parser = json_parser();
    for text in [
        r#"{"a":[1,true,null]}"#,
        r#"[[],[{}],""]"#,
        r#"{"a":}"#,
        r#"{"a" 1}"#,
        "",
        "12 34",
    ] {
        let parsed = parser.parse(text);
        let checked = parser.syntax_check(text);
        match (&parsed, &checked) {
            (Ok(_), Ok(())) => {}
            (Err(left), Err(right)) => {
                assert_eq!(left.position, right.position, "positions differ for {:?}", text)
            }
            other => panic!("parse and syntax_check disagree for {:?}: {:?}", text, other),
        }
    }
}

#[test]
fn lexical_error_carries_the_offending_text() {
    let parser = json_parser();
    let error = parser.parse(r#"{"a": @}"#).unwrap_err();
    match &error.kind {
        ParseErrorKind::LexicalError {
            token_text,
            expected_tokens,
            ..
        } => {
            assert_eq!(token_text, "@}");
            assert!(expected_tokens.iter().any(|e| e == "Number"));
        }
        other => panic!("expected a lexical error, found {:?}", other),
    }
    assert_eq!(error.position.column, 7);
}
