//! The parser runtime: a resumable tokenizer and an LR driver working as two
//! cooperating state machines.
//!
//! A [Parser] is an immutable value built from a
//! [GrammarBuilder](crate::GrammarBuilder); any number of independent parse
//! sessions can run against it. Input arrives through an [ISource]: either
//! a [StringSource] holding the whole input, or a [ChunkSource] fed
//! incrementally. When a non-final buffer runs dry mid-token, the tokenizer
//! suspends by parking its state in the source's [StateStore] and the
//! session reports [ParseStatus::Pending]; feeding more input resumes it
//! exactly where it stopped.

mod driver;
mod source;
mod tokenizer;

pub use driver::{ParseSession, ParseStatus};
pub use source::{ChunkSource, ISource, StateStore, StringSource};
pub use tokenizer::DfaTokenizer;

#[cfg(test)]
mod __tests__;

use crate::error::{BuildDiagnostic, ParserDiagnostic};
use crate::grammar::{GrammarBuilder, PackedGrammar, SemanticTables, SymbolRef};
use crate::util::Position;
use crate::ValueImpl;
use std::rc::Rc;

#[derive(Debug)]
/// One token delivered to the LR driver.
pub struct Token<T> {
    /// A terminal or virtual terminal reference.
    pub symbol: SymbolRef,
    pub value: T,
    pub start: Position,
    pub end: Position,
}

/// Whether semantic callbacks run for this session. A syntax check drives
/// the same automata with all callbacks skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticMode {
    Apply,
    Skip,
}

/// What one tokenizer of the chain produced.
pub enum TokenizerOutcome<T> {
    /// A token for the parser.
    Token(Token<T>),
    /// End of input reached cleanly.
    Eof,
    /// More input is needed; the session resumes this tokenizer next.
    Suspend,
    /// Nothing recognized here; the next tokenizer of the chain is asked.
    Pass,
    Fail(ParserDiagnostic),
}

/// A tokenizer of the parser's chain. Each is consulted in turn until one
/// returns a token, a failure or a suspension; the grammar's DFA tokenizer
/// is always last.
pub trait ITokenize<T> {
    fn next_token(&self, source: &mut dyn ISource, mode: SemanticMode) -> TokenizerOutcome<T>;

    /// The identity under which this tokenizer keeps state in a source's
    /// [StateStore].
    fn identity(&self) -> usize {
        self as *const Self as *const u8 as usize
    }
}

/// A built parser: the packed grammar, the semantic tables and the
/// tokenizer chain. Immutable once constructed; sessions carry all mutable
/// parse state.
pub struct Parser<T: ValueImpl> {
    grammar: Rc<PackedGrammar>,
    tables: Rc<SemanticTables<T>>,
    tokenizers: Vec<Rc<dyn ITokenize<T>>>,
}

impl<T: ValueImpl + 'static> Parser<T> {
    /// Build the grammar and assemble the runtime around it.
    pub fn new(builder: GrammarBuilder<T>) -> Result<Self, Vec<BuildDiagnostic>> {
        let (grammar, tables) = builder.build()?;
        Ok(Self::from_packed(Rc::new(grammar), tables))
    }

    /// Assemble a parser around an already packed grammar, for grammars
    /// loaded from the binary format.
    pub fn from_packed(grammar: Rc<PackedGrammar>, tables: SemanticTables<T>) -> Self {
        let tables = Rc::new(tables);
        let default_tokenizer = Rc::new(DfaTokenizer::new(grammar.clone(), tables.clone()));
        Self {
            grammar,
            tables,
            tokenizers: vec![default_tokenizer],
        }
    }

    /// Insert a tokenizer ahead of the ones already configured; the default
    /// DFA tokenizer stays last.
    pub fn add_tokenizer(&mut self, tokenizer: Rc<dyn ITokenize<T>>) -> &mut Self {
        let last = self.tokenizers.len() - 1;
        self.tokenizers.insert(last, tokenizer);
        self
    }

    pub fn grammar(&self) -> &Rc<PackedGrammar> {
        &self.grammar
    }

    pub(crate) fn tables(&self) -> &Rc<SemanticTables<T>> {
        &self.tables
    }

    pub(crate) fn tokenizers(&self) -> &[Rc<dyn ITokenize<T>>] {
        &self.tokenizers
    }

    /// Parse a complete input in one shot.
    pub fn parse(&self, text: &str) -> Result<T, ParserDiagnostic> {
        let mut source = StringSource::new(text);
        let mut session = self.session();
        match session.advance(&mut source)? {
            ParseStatus::Complete(value) => Ok(value),
            ParseStatus::Pending => unreachable!("a final block cannot leave a session pending"),
        }
    }

    /// Run the parse without invoking any semantic callback.
    ///
    /// Succeeds and fails on exactly the inputs [parse](Parser::parse) does,
    /// with equal error positions.
    pub fn syntax_check(&self, text: &str) -> Result<(), ParserDiagnostic> {
        let mut source = StringSource::new(text);
        let mut session = ParseSession::with_mode(self, SemanticMode::Skip);
        match session.advance(&mut source)? {
            ParseStatus::Complete(_) => Ok(()),
            ParseStatus::Pending => unreachable!("a final block cannot leave a session pending"),
        }
    }

    /// Start an incremental parse session.
    pub fn session(&self) -> ParseSession<'_, T> {
        ParseSession::with_mode(self, SemanticMode::Apply)
    }

    /// Run the tokenizer chain over a complete input without parsing.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token<T>>, ParserDiagnostic> {
        let mut source = StringSource::new(text);
        let mut session = self.session();
        session.tokenize_all(&mut source)
    }
}
