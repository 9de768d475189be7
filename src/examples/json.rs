//! A JSON parser: the standard token set, whitespace noise, and fusers
//! building a [Json] value.

use crate::rex::Rex;
use crate::symbols::{NonTerminal, Production, Terminal};
use crate::{fuser, transformer, GrammarBuilder, Parser, SemanticError, ValueImpl};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
/// The semantic value of the JSON grammar. `Pair` and `Nothing` only occur
/// on the parse stack, never in a finished result.
pub enum Json {
    Nothing,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Json>),
    Object(Vec<(String, Json)>),
    Pair(String, Box<Json>),
}

impl ValueImpl for Json {
    fn empty() -> Self {
        Json::Nothing
    }
}

fn unescape(lexeme: &str) -> Result<String, SemanticError> {
    // The lexeme arrives with its quotes.
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&digits, 16)
                    .map_err(|_| format!("invalid unicode escape \\u{}", digits))?;
                out.push(
                    char::from_u32(code)
                        .ok_or_else(|| format!("\\u{} is not a scalar value", digits))?,
                );
            }
            other => return Err(format!("invalid escape {:?}", other).into()),
        }
    }
    Ok(out)
}

fn nth(values: Vec<Json>, index: usize) -> Json {
    values.into_iter().nth(index).unwrap()
}

/// Build the JSON parser.
pub fn json_parser() -> Parser<Json> {
    let string = Rc::new(Terminal::new(
        "String",
        Rex::concat(vec![
            Rex::char('"'),
            Rex::choice(vec![
                Rex::not_chars(['"', '\\']),
                Rex::concat(vec![Rex::char('\\'), Rex::any_char()]),
            ])
            .star(),
            Rex::char('"'),
        ]),
        transformer(|_, lexeme| Ok(Json::String(unescape(lexeme)?))),
    ));

    let digits = Rex::chars(['0'..='9']).plus();
    let number = Rc::new(Terminal::new(
        "Number",
        Rex::concat(vec![
            Rex::char('-').optional(),
            digits.clone(),
            Rex::concat(vec![Rex::char('.'), digits.clone()]).optional(),
            Rex::concat(vec![
                Rex::chars(['e', 'E']),
                Rex::chars(['+', '-']).optional(),
                digits,
            ])
            .optional(),
        ]),
        transformer(|_, lexeme| Ok(Json::Number(lexeme.parse()?))),
    ));

    let kw_true = Rc::new(Terminal::new(
        "true",
        Rex::string("true"),
        transformer(|_, _| Ok(Json::Bool(true))),
    ));
    let kw_false = Rc::new(Terminal::new(
        "false",
        Rex::string("false"),
        transformer(|_, _| Ok(Json::Bool(false))),
    ));
    let kw_null = Rc::new(Terminal::new(
        "null",
        Rex::string("null"),
        transformer(|_, _| Ok(Json::Null)),
    ));

    let open_brace = Rc::new(Terminal::literal("{"));
    let close_brace = Rc::new(Terminal::literal("}"));
    let open_bracket = Rc::new(Terminal::literal("["));
    let close_bracket = Rc::new(Terminal::literal("]"));
    let comma = Rc::new(Terminal::literal(","));
    let colon = Rc::new(Terminal::literal(":"));

    let value: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Value"));
    let object: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Object"));
    let array: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Array"));
    let members: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Members"));
    let member_list: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("MemberList"));
    let member: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Member"));
    let items: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("Items"));
    let item_list: Rc<NonTerminal<Json>> = Rc::new(NonTerminal::init("ItemList"));

    let first = fuser(|_, values: Vec<Json>| Ok(nth(values, 0)));
    value.set_productions(vec![
        Production::new(vec![(&string).into()], first.clone()),
        Production::new(vec![(&number).into()], first.clone()),
        Production::new(vec![(&kw_true).into()], first.clone()),
        Production::new(vec![(&kw_false).into()], first.clone()),
        Production::new(vec![(&kw_null).into()], first.clone()),
        Production::new(vec![(&object).into()], first.clone()),
        Production::new(vec![(&array).into()], first.clone()),
    ]);

    object.set_productions(vec![Production::new(
        vec![(&open_brace).into(), (&members).into(), (&close_brace).into()],
        fuser(|_, values| Ok(nth(values, 1))),
    )]);

    members.set_productions(vec![
        Production::new(vec![], fuser(|_, _| Ok(Json::Object(Vec::new())))),
        Production::new(vec![(&member_list).into()], first.clone()),
    ]);

    member_list.set_productions(vec![
        Production::new(
            vec![(&member).into()],
            fuser(|_, values| match nth(values, 0) {
                Json::Pair(key, value) => Ok(Json::Object(vec![(key, *value)])),
                other => Err(format!("expected a member, found {:?}", other).into()),
            }),
        ),
        Production::new(
            vec![(&member_list).into(), (&comma).into(), (&member).into()],
            fuser(|_, values| {
                let mut values = values.into_iter();
                match (values.next(), values.nth(1)) {
                    (Some(Json::Object(mut pairs)), Some(Json::Pair(key, value))) => {
                        pairs.push((key, *value));
                        Ok(Json::Object(pairs))
                    }
                    other => Err(format!("malformed member list: {:?}", other).into()),
                }
            }),
        ),
    ]);

    member.set_productions(vec![Production::new(
        vec![(&string).into(), (&colon).into(), (&value).into()],
        fuser(|_, values| {
            let mut values = values.into_iter();
            match (values.next(), values.nth(1)) {
                (Some(Json::String(key)), Some(value)) => Ok(Json::Pair(key, Box::new(value))),
                other => Err(format!("malformed member: {:?}", other).into()),
            }
        }),
    )]);

    array.set_productions(vec![Production::new(
        vec![
            (&open_bracket).into(),
            (&items).into(),
            (&close_bracket).into(),
        ],
        fuser(|_, values| Ok(nth(values, 1))),
    )]);

    items.set_productions(vec![
        Production::new(vec![], fuser(|_, _| Ok(Json::Array(Vec::new())))),
        Production::new(vec![(&item_list).into()], first.clone()),
    ]);

    item_list.set_productions(vec![
        Production::new(
            vec![(&value).into()],
            fuser(|_, values| Ok(Json::Array(vec![nth(values, 0)]))),
        ),
        Production::new(
            vec![(&item_list).into(), (&comma).into(), (&value).into()],
            fuser(|_, values| {
                let mut values = values.into_iter();
                match (values.next(), values.nth(1)) {
                    (Some(Json::Array(mut list)), Some(value)) => {
                        list.push(value);
                        Ok(Json::Array(list))
                    }
                    other => Err(format!("malformed item list: {:?}", other).into()),
                }
            }),
        ),
    ]);

    let mut builder = GrammarBuilder::new("JSON", &value);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t', '\r', '\n']).plus());
    Parser::new(builder).unwrap()
}
