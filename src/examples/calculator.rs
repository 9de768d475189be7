//! An integer calculator whose ambiguous expression grammar is resolved
//! entirely through an operator scope: `+ -` bind loosest, `* /` tighter,
//! unary minus tightest via a precedence-only tag.

use crate::rex::Rex;
use crate::symbols::{
    Associativity, NonTerminal, OperatorLevel, OperatorScope, Production, Terminal,
};
use crate::{fuser, transformer, GrammarBuilder, Parser};
use std::rc::Rc;

/// Build the calculator parser.
pub fn calculator_parser() -> Parser<i64> {
    let number = Rc::new(Terminal::new(
        "Number",
        Rex::chars(['0'..='9']).plus(),
        transformer(|_, lexeme| Ok(lexeme.parse::<i64>()?)),
    ));
    let plus = Rc::new(Terminal::literal("+"));
    let minus = Rc::new(Terminal::literal("-"));
    let star = Rc::new(Terminal::literal("*"));
    let slash = Rc::new(Terminal::literal("/"));
    let open = Rc::new(Terminal::literal("("));
    let close = Rc::new(Terminal::literal(")"));

    let expr: Rc<NonTerminal<i64>> = Rc::new(NonTerminal::init("Expr"));
    expr.set_productions(vec![
        Production::new(
            vec![(&expr).into(), (&plus).into(), (&expr).into()],
            fuser(|_, values| Ok(values[0] + values[2])),
        ),
        Production::new(
            vec![(&expr).into(), (&minus).into(), (&expr).into()],
            fuser(|_, values| Ok(values[0] - values[2])),
        ),
        Production::new(
            vec![(&expr).into(), (&star).into(), (&expr).into()],
            fuser(|_, values| Ok(values[0] * values[2])),
        ),
        Production::new(
            vec![(&expr).into(), (&slash).into(), (&expr).into()],
            fuser(|_, values| {
                if values[2] == 0 {
                    Err("division by zero".into())
                } else {
                    Ok(values[0] / values[2])
                }
            }),
        ),
        Production::new(
            vec![(&minus).into(), (&expr).into()],
            fuser(|_, values: Vec<i64>| Ok(-values[1])),
        )
        .with_precedence("negate"),
        Production::new(
            vec![(&open).into(), (&expr).into(), (&close).into()],
            fuser(|_, values| Ok(values[1])),
        ),
        Production::new(
            vec![(&number).into()],
            fuser(|_, values| Ok(values[0])),
        ),
    ]);

    let mut builder = GrammarBuilder::new("Calculator", &expr);
    builder.add_noise("Whitespace", Rex::chars([' ', '\t', '\r', '\n']).plus());
    builder.operator_scope(OperatorScope::new(vec![
        OperatorLevel::literals(Associativity::Left, &["+", "-"]),
        OperatorLevel::literals(Associativity::Left, &["*", "/"]),
        OperatorLevel::tags(Associativity::PrecedenceOnly, &["negate"]),
    ]));
    Parser::new(builder).unwrap()
}
