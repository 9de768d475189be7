use super::{ISource, ITokenize, SemanticMode, Token, TokenizerOutcome};
use crate::dfa::{Dfa, DfaState};
use crate::error::{ParseErrorKind, ParserDiagnostic};
use crate::grammar::{PackedGrammar, SemanticTables, SymbolKind, SymbolRef};
use crate::util::Position;
use crate::{SemanticContext, ValueImpl};
use std::rc::Rc;

/// The default tokenizer: drives the grammar's DFA over the source window,
/// skips noise, runs lexical groups and applies per-terminal transformers.
pub struct DfaTokenizer<T> {
    grammar: Rc<PackedGrammar>,
    tables: Rc<SemanticTables<T>>,
}

/// The group-mode snapshot parked in the source's state store across a
/// suspension: the open group stack, the buffered container text and where
/// the container started.
struct GroupResume {
    outer: usize,
    stack: Vec<usize>,
    container: String,
    start: Position,
}

/// What one DFA run over the remaining window produced.
enum Scan {
    /// The window is empty.
    Empty,
    /// The window ended mid-match in a non-final block.
    NeedMore,
    /// Longest match: the accepted symbol and its length in characters.
    Accept { symbol: SymbolRef, chars: usize },
    /// No accept is reachable; `state` is where the automaton stalled.
    Stall { state: usize },
}

impl<T> DfaTokenizer<T> {
    pub fn new(grammar: Rc<PackedGrammar>, tables: Rc<SemanticTables<T>>) -> Self {
        Self { grammar, tables }
    }
}

impl<T: ValueImpl> ITokenize<T> for DfaTokenizer<T> {
    fn next_token(&self, source: &mut dyn ISource, mode: SemanticMode) -> TokenizerOutcome<T> {
        let key = self.identity();
        if let Some(resume) = source.state().take::<GroupResume>(key) {
            match self.run_group(source, mode, resume) {
                Some(outcome) => return outcome,
                None => {} // a noise container finished; resume tokenizing
            }
        }

        loop {
            let outcome = scan(&self.grammar.dfa, source.remaining(), source.is_final_block());
            match outcome {
                Scan::Empty => {
                    return if source.is_final_block() {
                        TokenizerOutcome::Eof
                    } else {
                        TokenizerOutcome::Suspend
                    };
                }
                Scan::NeedMore => return TokenizerOutcome::Suspend,
                Scan::Stall { state } => {
                    return TokenizerOutcome::Fail(ParserDiagnostic::new(
                        source.position(),
                        ParseErrorKind::LexicalError {
                            token_text: abbreviate(source.remaining()),
                            tokenizer_state: state,
                            expected_tokens: Vec::new(),
                        },
                    ));
                }
                Scan::Accept { symbol, chars } => match symbol.kind {
                    SymbolKind::Noise => {
                        source.consume(chars);
                    }
                    SymbolKind::Terminal => {
                        let start = source.position();
                        let lexeme = prefix(source.remaining(), chars).to_string();
                        source.consume(chars);
                        return self.emit(symbol, lexeme, start, source.position(), mode);
                    }
                    SymbolKind::GroupStart => {
                        let (group_index, _) = match self.grammar.group_of_start(symbol) {
                            Some(found) => found,
                            None => {
                                return TokenizerOutcome::Fail(malformed_accept(
                                    source, symbol,
                                ))
                            }
                        };
                        let start = source.position();
                        let lexeme = prefix(source.remaining(), chars).to_string();
                        source.consume(chars);
                        let resume = GroupResume {
                            outer: group_index,
                            stack: vec![group_index],
                            container: lexeme,
                            start,
                        };
                        match self.run_group(source, mode, resume) {
                            Some(outcome) => return outcome,
                            None => {} // noise container; keep tokenizing
                        }
                    }
                    SymbolKind::GroupEnd => {
                        // A group end with no group open cannot start a
                        // token.
                        return TokenizerOutcome::Fail(ParserDiagnostic::new(
                            source.position(),
                            ParseErrorKind::LexicalError {
                                token_text: abbreviate(prefix(source.remaining(), chars)),
                                tokenizer_state: Dfa::INITIAL,
                                expected_tokens: Vec::new(),
                            },
                        ));
                    }
                    SymbolKind::NonTerminal | SymbolKind::Virtual => {
                        return TokenizerOutcome::Fail(malformed_accept(source, symbol))
                    }
                },
            }
        }
    }
}

impl<T: ValueImpl> DfaTokenizer<T> {
    /// Run group mode until the outermost group closes, input runs out or
    /// the session has to suspend. Returns [None] when a noise container
    /// finished and tokenizing should continue.
    fn run_group(
        &self,
        source: &mut dyn ISource,
        mode: SemanticMode,
        mut resume: GroupResume,
    ) -> Option<TokenizerOutcome<T>> {
        let key = self.identity();
        loop {
            if source.remaining().is_empty() {
                if !source.is_final_block() {
                    source.state().set(key, resume);
                    return Some(TokenizerOutcome::Suspend);
                }
                while let Some(top) = resume.stack.last() {
                    if self.grammar.groups[*top].attributes.ends_on_eof {
                        resume.stack.pop();
                    } else {
                        break;
                    }
                }
                return match resume.stack.last() {
                    Some(top) => Some(TokenizerOutcome::Fail(ParserDiagnostic::new(
                        source.position(),
                        ParseErrorKind::UnexpectedEndOfInputInGroup {
                            group_name: self.grammar.groups[*top].name.clone(),
                        },
                    ))),
                    None => self.finish_group(source, mode, resume),
                };
            }

            let outcome = scan(&self.grammar.dfa, source.remaining(), source.is_final_block());
            match outcome {
                Scan::Empty => unreachable!("the window was checked above"),
                Scan::NeedMore => {
                    source.state().set(key, resume);
                    return Some(TokenizerOutcome::Suspend);
                }
                Scan::Stall { .. } => {
                    // Unrecognized content inside a group is container text.
                    self.advance_into(&mut resume.container, source, 1);
                }
                Scan::Accept { symbol, chars } => {
                    let top = *resume.stack.last().expect("group mode keeps an open group");
                    if self.grammar.closes_group(top, symbol) {
                        if self.grammar.groups[top].attributes.keep_end_token {
                            self.advance_into(&mut resume.container, source, chars);
                        }
                        // An end token that is not kept stays unconsumed;
                        // line groups leave their newline for the noise
                        // pass.
                        resume.stack.pop();
                        if resume.stack.is_empty() {
                            return self.finish_group(source, mode, resume);
                        }
                    } else if symbol.kind == SymbolKind::GroupStart {
                        match self.grammar.group_of_start(symbol) {
                            Some((inner, _))
                                if self.grammar.groups[top]
                                    .nesting
                                    .contains(&(inner as u32)) =>
                            {
                                self.advance_into(&mut resume.container, source, chars);
                                resume.stack.push(inner);
                            }
                            _ => self.advance_by_attribute(&mut resume, source, top, chars),
                        }
                    } else {
                        self.advance_by_attribute(&mut resume, source, top, chars);
                    }
                }
            }
        }
    }

    fn advance_by_attribute(
        &self,
        resume: &mut GroupResume,
        source: &mut dyn ISource,
        group: usize,
        matched: usize,
    ) {
        let step = if self.grammar.groups[group].attributes.advance_by_char {
            1
        } else {
            matched
        };
        self.advance_into(&mut resume.container, source, step);
    }

    fn advance_into(&self, container: &mut String, source: &mut dyn ISource, chars: usize) {
        container.push_str(prefix(source.remaining(), chars));
        source.consume(chars);
    }

    /// The outermost group closed: discard a noise container, or deliver a
    /// terminal container through its transformer.
    fn finish_group(
        &self,
        source: &mut dyn ISource,
        mode: SemanticMode,
        resume: GroupResume,
    ) -> Option<TokenizerOutcome<T>> {
        let group = &self.grammar.groups[resume.outer];
        match group.container.kind {
            SymbolKind::Noise => None,
            _ => Some(self.emit(
                group.container,
                resume.container,
                resume.start,
                source.position(),
                mode,
            )),
        }
    }

    fn emit(
        &self,
        symbol: SymbolRef,
        lexeme: String,
        start: Position,
        end: Position,
        mode: SemanticMode,
    ) -> TokenizerOutcome<T> {
        let value = match mode {
            SemanticMode::Skip => T::empty(),
            SemanticMode::Apply => {
                let ctx = SemanticContext { start, end };
                match (self.tables.transformers[symbol.index as usize])(&ctx, &lexeme) {
                    Ok(value) => value,
                    Err(error) => {
                        return TokenizerOutcome::Fail(ParserDiagnostic::new(
                            start,
                            ParseErrorKind::UserDiagnostic(error),
                        ))
                    }
                }
            }
        };
        TokenizerOutcome::Token(Token {
            symbol,
            value,
            start,
            end,
        })
    }
}

/// Drive the DFA over the window and report the longest accept.
fn scan(dfa: &Dfa, window: &str, is_final: bool) -> Scan {
    if window.is_empty() {
        return Scan::Empty;
    }
    let mut state = Dfa::INITIAL;
    let mut best: Option<(SymbolRef, usize)> = None;
    let mut count = 0usize;
    for c in window.chars() {
        match dfa.state(state).next(c) {
            Some(next) => {
                state = next;
                count += 1;
                if let Some(symbol) = dfa.state(state).accept() {
                    best = Some((symbol, count));
                }
            }
            None => {
                return match best {
                    Some((symbol, chars)) => Scan::Accept { symbol, chars },
                    None => Scan::Stall { state },
                };
            }
        }
    }
    // The window is exhausted without a stall. A token at the very end of a
    // non-final block is only committed once the automaton cannot advance.
    if !is_final && can_advance(dfa.state(state)) {
        return Scan::NeedMore;
    }
    match best {
        Some((symbol, chars)) => Scan::Accept { symbol, chars },
        None => Scan::Stall { state },
    }
}

fn can_advance(state: &DfaState) -> bool {
    state.default_target.is_some() || state.transitions.iter().any(|t| t.target.is_some())
}

/// The first `chars` characters of `text`.
fn prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Abbreviate an offending lexeme: at most 20 characters, cut at the first
/// line break.
fn abbreviate(text: &str) -> String {
    text.chars()
        .take_while(|c| *c != '\n' && *c != '\r')
        .take(20)
        .collect()
}

fn malformed_accept(source: &mut dyn ISource, symbol: SymbolRef) -> ParserDiagnostic {
    // Only a malformed packed grammar can put these kinds in an accept set.
    ParserDiagnostic::new(
        source.position(),
        ParseErrorKind::LexicalError {
            token_text: format!("<{:?}>", symbol),
            tokenizer_state: Dfa::INITIAL,
            expected_tokens: Vec::new(),
        },
    )
}
