//! Indentation-sensitive tokenization through a custom tokenizer.
//!
//! The grammar itself only knows the virtual terminals `BlockStart` and
//! `BlockEnd`; [IndentTokenizer] sits ahead of the DFA tokenizer in the
//! chain, tracks an indentation stack across lines and emits the virtual
//! tokens the parser expects. The semantic value is a plain [SyntaxTree].

use crate::rex::Rex;
use crate::runtime::{ISource, ITokenize, SemanticMode, Token, TokenizerOutcome};
use crate::symbols::{NonTerminal, Production, Terminal, VirtualTerminal};
use crate::syntax_tree::SyntaxTree;
use crate::error::{ParseErrorKind, ParserDiagnostic};
use crate::grammar::{PackedGrammar, SymbolKind, SymbolRef};
use crate::{fuser, GrammarBuilder, Parser};
use std::rc::Rc;

/// Indent bookkeeping parked in the source's state store.
struct IndentState {
    levels: Vec<usize>,
    pending_ends: usize,
    line_start: bool,
}

/// A tokenizer emitting `BlockStart`/`BlockEnd` virtual terminals from
/// leading spaces, Python style.
pub struct IndentTokenizer {
    block_start: SymbolRef,
    block_end: SymbolRef,
}

impl IndentTokenizer {
    /// Resolve the virtual terminals in the packed grammar.
    pub fn new(grammar: &PackedGrammar) -> Result<Self, String> {
        let find = |name: &str| -> Result<SymbolRef, String> {
            grammar
                .virtuals
                .iter()
                .position(|v| v == name)
                .map(|index| SymbolRef::new(SymbolKind::Virtual, index as u32))
                .ok_or_else(|| format!("The grammar has no virtual terminal {}.", name))
        };
        Ok(Self {
            block_start: find("BlockStart")?,
            block_end: find("BlockEnd")?,
        })
    }

    fn virtual_token(&self, symbol: SymbolRef, source: &dyn ISource) -> TokenizerOutcome<SyntaxTree> {
        let position = source.position();
        TokenizerOutcome::Token(Token {
            symbol,
            value: SyntaxTree::Empty,
            start: position,
            end: position,
        })
    }
}

impl ITokenize<SyntaxTree> for IndentTokenizer {
    fn next_token(
        &self,
        source: &mut dyn ISource,
        _mode: SemanticMode,
    ) -> TokenizerOutcome<SyntaxTree> {
        let key = self.identity();
        if source.state().get::<IndentState>(key).is_none() {
            source.state().set(
                key,
                IndentState {
                    levels: vec![0],
                    pending_ends: 0,
                    line_start: true,
                },
            );
        }

        loop {
            let (emit_end, line_start) = {
                let state = source
                    .state()
                    .get_mut::<IndentState>(key)
                    .expect("initialized above");
                if state.pending_ends > 0 {
                    state.pending_ends -= 1;
                    (true, state.line_start)
                } else {
                    (false, state.line_start)
                }
            };
            if emit_end {
                return self.virtual_token(self.block_end, source);
            }

            let is_final = source.is_final_block();
            let window_empty = source.remaining().is_empty();
            if window_empty {
                if !is_final {
                    return TokenizerOutcome::Suspend;
                }
                let state = source
                    .state()
                    .get_mut::<IndentState>(key)
                    .expect("initialized above");
                if state.levels.len() > 1 {
                    state.levels.pop();
                    return self.virtual_token(self.block_end, source);
                }
                return TokenizerOutcome::Pass;
            }

            if !line_start {
                let first = source.remaining().chars().next();
                match first {
                    Some('\n') | Some('\r') => {
                        source.consume(1);
                        source
                            .state()
                            .get_mut::<IndentState>(key)
                            .expect("initialized above")
                            .line_start = true;
                        continue;
                    }
                    _ => return TokenizerOutcome::Pass,
                }
            }

            // At a line start: the whole indent has to be visible before the
            // width can be compared.
            let width = source.remaining().chars().take_while(|c| *c == ' ').count();
            let after_indent = source.remaining().chars().nth(width);
            match after_indent {
                None if !is_final => return TokenizerOutcome::Suspend,
                None => {
                    // Trailing spaces before end of input.
                    source.consume(width);
                    continue;
                }
                Some('\n') | Some('\r') => {
                    // A blank line changes nothing.
                    source.consume(width + 1);
                    continue;
                }
                Some(_) => {
                    source.consume(width);
                    let position = source.position();
                    let state = source
                        .state()
                        .get_mut::<IndentState>(key)
                        .expect("initialized above");
                    state.line_start = false;
                    let current = *state.levels.last().expect("the base level remains");
                    if width > current {
                        state.levels.push(width);
                        return self.virtual_token(self.block_start, source);
                    }
                    if width < current {
                        let mut ends = 0usize;
                        while *state.levels.last().expect("the base level remains") > width {
                            state.levels.pop();
                            ends += 1;
                        }
                        if *state.levels.last().expect("the base level remains") != width {
                            return TokenizerOutcome::Fail(ParserDiagnostic::new(
                                position,
                                ParseErrorKind::UserDiagnostic(
                                    "unindent does not match any outer indentation level"
                                        .to_string()
                                        .into(),
                                ),
                            ));
                        }
                        state.pending_ends = ends;
                        continue;
                    }
                    // Same level: hand over to the DFA tokenizer.
                }
            }
        }
    }
}

/// Build the indentation parser and its tokenizer chain.
pub fn indentation_parser() -> Parser<SyntaxTree> {
    let name = Rc::new(Terminal::new(
        "Name",
        Rex::concat(vec![
            Rex::chars([('A', 'Z'), ('a', 'z')]),
            Rex::chars([('A', 'Z'), ('a', 'z'), ('0', '9')]).star(),
        ]),
        SyntaxTree::leaf_transformer("Name"),
    ));
    let block_start = Rc::new(VirtualTerminal::new("BlockStart"));
    let block_end = Rc::new(VirtualTerminal::new("BlockEnd"));

    let items: Rc<NonTerminal<SyntaxTree>> = Rc::new(NonTerminal::init("Items"));
    let item: Rc<NonTerminal<SyntaxTree>> = Rc::new(NonTerminal::init("Item"));
    let block: Rc<NonTerminal<SyntaxTree>> = Rc::new(NonTerminal::init("Block"));

    items.set_productions(vec![
        Production::new(vec![(&item).into()], SyntaxTree::branch_fuser("Items")),
        Production::new(
            vec![(&items).into(), (&item).into()],
            fuser(|_, values| {
                let mut values = values.into_iter();
                match (values.next(), values.next()) {
                    (Some(SyntaxTree::Branch { name, mut children }), Some(next)) => {
                        children.push(next);
                        Ok(SyntaxTree::Branch { name, children })
                    }
                    other => Err(format!("malformed item list: {:?}", other).into()),
                }
            }),
        ),
    ]);

    item.set_productions(vec![
        Production::new(vec![(&name).into()], SyntaxTree::passthrough_fuser()),
        Production::new(
            vec![(&name).into(), (&block).into()],
            SyntaxTree::branch_fuser("Item"),
        ),
    ]);

    block.set_productions(vec![Production::new(
        vec![
            (&block_start).into(),
            (&items).into(),
            (&block_end).into(),
        ],
        SyntaxTree::branch_fuser("Block"),
    )]);

    let mut builder = GrammarBuilder::new("Indentation", &items);
    builder.add_noise("Spaces", Rex::chars([' ', '\t']).plus());
    let mut parser = Parser::new(builder).unwrap();
    let indent = IndentTokenizer::new(parser.grammar()).unwrap();
    parser.add_tokenizer(Rc::new(indent));
    parser
}
