use super::{ISource, Parser, SemanticMode, Token, TokenizerOutcome};
use crate::error::{ParseErrorKind, ParserDiagnostic};
use crate::grammar::SymbolKind;
use crate::lalr::LrAction;
use crate::util::Position;
use crate::{SemanticContext, ValueImpl};

/// What a session step left behind: a finished value or a request for more
/// input.
#[derive(Debug)]
pub enum ParseStatus<T> {
    Complete(T),
    Pending,
}

/// One parse run against a [Parser].
///
/// The session owns the LR stacks and the tokenizer resumption marker; the
/// parser itself stays immutable, so independent sessions never interfere.
pub struct ParseSession<'p, T: ValueImpl> {
    parser: &'p Parser<T>,
    state_stack: Vec<usize>,
    value_stack: Vec<StackEntry<T>>,
    resume_tokenizer: Option<usize>,
    mode: SemanticMode,
    last_position: Position,
    finished: bool,
}

struct StackEntry<T> {
    value: T,
    start: Position,
    end: Position,
}

impl<'p, T: ValueImpl + 'static> ParseSession<'p, T> {
    pub(super) fn with_mode(parser: &'p Parser<T>, mode: SemanticMode) -> Self {
        Self {
            parser,
            state_stack: vec![crate::lalr::LalrTable::INITIAL],
            value_stack: Vec::new(),
            resume_tokenizer: None,
            mode,
            last_position: Position::start(),
            finished: false,
        }
    }

    /// Consume as much of the source as possible.
    ///
    /// Returns [ParseStatus::Pending] when a non-final source ran dry;
    /// feeding the source and calling `advance` again resumes seamlessly. A
    /// session yields exactly one terminal error and must not be advanced
    /// after completing.
    pub fn advance(&mut self, source: &mut dyn ISource) -> Result<ParseStatus<T>, ParserDiagnostic> {
        if self.finished {
            panic!("the parse session has already completed");
        }
        loop {
            let token = match self.fetch_token(source) {
                Fetched::Token(token) => Some(token),
                Fetched::Eof => None,
                Fetched::Pending => return Ok(ParseStatus::Pending),
                Fetched::Failed(diagnostic) => {
                    self.finished = true;
                    return Err(self.enrich(diagnostic));
                }
            };
            match token {
                Some(token) => {
                    self.last_position = token.end;
                    if let Err(diagnostic) = self.shift_token(token) {
                        self.finished = true;
                        return Err(diagnostic);
                    }
                }
                None => {
                    let position = source.position();
                    let result = self.finish_at(position);
                    self.finished = true;
                    return result.map(ParseStatus::Complete);
                }
            }
        }
    }

    /// Run the tokenizer chain to end of input without driving the parser.
    pub(super) fn tokenize_all(
        &mut self,
        source: &mut dyn ISource,
    ) -> Result<Vec<Token<T>>, ParserDiagnostic> {
        let mut tokens = Vec::new();
        loop {
            match self.fetch_token(source) {
                Fetched::Token(token) => tokens.push(token),
                Fetched::Eof | Fetched::Pending => return Ok(tokens),
                Fetched::Failed(diagnostic) => return Err(self.enrich(diagnostic)),
            }
        }
    }

    /// Ask the tokenizer chain for the next token, honoring a suspended
    /// tokenizer first.
    fn fetch_token(&mut self, source: &mut dyn ISource) -> Fetched<T> {
        let chain = self.parser.tokenizers();
        let first = self.resume_tokenizer.take().unwrap_or(0);
        for (index, tokenizer) in chain.iter().enumerate().skip(first) {
            match tokenizer.next_token(source, self.mode) {
                TokenizerOutcome::Pass => continue,
                TokenizerOutcome::Token(token) => return Fetched::Token(token),
                TokenizerOutcome::Eof => return Fetched::Eof,
                TokenizerOutcome::Suspend => {
                    self.resume_tokenizer = Some(index);
                    return Fetched::Pending;
                }
                TokenizerOutcome::Fail(diagnostic) => return Fetched::Failed(diagnostic),
            }
        }
        // The default tokenizer never passes; reaching here means the chain
        // was emptied by hand.
        Fetched::Eof
    }

    /// Reduce until the token can shift, then shift it.
    fn shift_token(&mut self, token: Token<T>) -> Result<(), ParserDiagnostic> {
        loop {
            let state = *self.state_stack.last().expect("the state stack never drains");
            match self.parser.grammar().lalr.state(state).action(token.symbol) {
                Some(LrAction::Shift(target)) => {
                    self.value_stack.push(StackEntry {
                        value: token.value,
                        start: token.start,
                        end: token.end,
                    });
                    self.state_stack.push(target);
                    return Ok(());
                }
                Some(LrAction::Reduce(production)) => {
                    self.reduce(production, token.start)?;
                }
                Some(LrAction::Accept) | Some(LrAction::Error) | None => {
                    return Err(self.syntax_error(Some(&token), token.start));
                }
            }
        }
    }

    /// Run the end-of-input actions down to Accept.
    fn finish_at(&mut self, position: Position) -> Result<T, ParserDiagnostic> {
        loop {
            let state = *self.state_stack.last().expect("the state stack never drains");
            match self.parser.grammar().lalr.state(state).eof_action {
                Some(LrAction::Reduce(production)) => {
                    self.reduce(production, position)?;
                }
                Some(LrAction::Accept) => {
                    debug_assert_eq!(self.value_stack.len(), 1);
                    debug_assert_eq!(self.state_stack.len(), 2);
                    let entry = self
                        .value_stack
                        .pop()
                        .expect("accept requires the start value");
                    return Ok(entry.value);
                }
                _ => return Err(self.syntax_error(None, position)),
            }
        }
    }

    fn reduce(&mut self, production: usize, at: Position) -> Result<(), ParserDiagnostic> {
        let grammar = self.parser.grammar();
        let members = grammar.productions[production].handle.len();
        debug_assert!(self.value_stack.len() >= members);
        debug_assert_eq!(self.value_stack.len() + 1, self.state_stack.len());

        let keep = self.value_stack.len() - members;
        let drained: Vec<StackEntry<T>> = self.value_stack.drain(keep..).collect();
        self.state_stack.truncate(self.state_stack.len() - members);

        let start = drained.first().map_or(at, |entry| entry.start);
        let end = drained.last().map_or(at, |entry| entry.end);

        let value = match self.mode {
            SemanticMode::Skip => T::empty(),
            SemanticMode::Apply => {
                let ctx = SemanticContext { start, end };
                let values: Vec<T> = drained.into_iter().map(|entry| entry.value).collect();
                match (self.parser.tables().fusers[production])(&ctx, values) {
                    Ok(value) => value,
                    Err(error) => {
                        return Err(ParserDiagnostic::new(
                            start,
                            ParseErrorKind::UserDiagnostic(error),
                        ))
                    }
                }
            }
        };

        let state = *self.state_stack.last().expect("the state stack never drains");
        let target = grammar
            .lalr
            .state(state)
            .goto(grammar.productions[production].head)
            .expect("a malformed grammar: reduce without a goto");
        self.value_stack.push(StackEntry { value, start, end });
        self.state_stack.push(target);
        Ok(())
    }

    fn syntax_error(&self, actual: Option<&Token<T>>, position: Position) -> ParserDiagnostic {
        let grammar = self.parser.grammar();
        let state = *self.state_stack.last().expect("the state stack never drains");
        let expected = self.expected_tokens(state);
        ParserDiagnostic::new(
            position,
            ParseErrorKind::SyntaxError {
                actual: actual.map(|token| grammar.symbol_name(token.symbol)),
                expected,
                parser_state: state,
            },
        )
    }

    /// The tokens the current state can make progress on, hidden terminals
    /// excluded.
    fn expected_tokens(&self, state: usize) -> Vec<String> {
        let grammar = self.parser.grammar();
        grammar
            .lalr
            .state(state)
            .expected_symbols()
            .filter(|symbol| match symbol.kind {
                SymbolKind::Terminal => !grammar.terminals[symbol.index as usize].hidden,
                _ => true,
            })
            .map(|symbol| grammar.symbol_name(symbol))
            .collect()
    }

    /// Attach the expected-token list of the current state to a tokenizer
    /// failure.
    fn enrich(&self, mut diagnostic: ParserDiagnostic) -> ParserDiagnostic {
        if let ParseErrorKind::LexicalError {
            expected_tokens, ..
        } = &mut diagnostic.kind
        {
            let state = *self.state_stack.last().expect("the state stack never drains");
            *expected_tokens = self.expected_tokens(state);
        }
        diagnostic
    }
}

enum Fetched<T> {
    Token(Token<T>),
    Eof,
    Pending,
    Failed(ParserDiagnostic),
}
