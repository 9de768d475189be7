//! Language parsing tool (lang_lr) is a library to build a tokenizing DFA and LALR(1)
//! bottom-up parser pair from a grammar declared directly in Rust.
//!
//! # Overview
//! Parser generator tools usually compile a grammar written in a separate definition
//! language into parser source code. This library skips the code generation step:
//! grammars are declared with ordinary Rust values, regexes for terminals and production
//! lists for nonterminals, and a build step turns them into a pair of table-driven
//! automata that tokenize and parse immediately, inside the same program.
//!
//! # Design
//!
//! A grammar starts as a graph of symbol utilities: [Terminal](symbols::Terminal)
//! declares a token by a [Rex](rex::Rex) regular expression and a transformer callback,
//! [NonTerminal](symbols::NonTerminal) owns productions whose fuser callbacks fold the
//! semantic values of their members, and [Group](symbols::Group) declares lexical
//! regions such as comments or nestable blocks. [GrammarBuilder] walks this graph,
//! numbers every reachable symbol, lowers the regexes and builds a tokenizing DFA
//! (followpos construction) and an LALR(1) parse table (merged LR(1) item sets).
//! Shift-reduce conflicts can be resolved declaratively with an
//! [OperatorScope](symbols::OperatorScope) of precedence levels.
//!
//! The result is a [PackedGrammar], immutable thread-shareable tables that can also
//! be persisted to a compact binary stream with [write_grammar] and reloaded with
//! [read_grammar], plus the [SemanticTables] of callbacks riding alongside it. A
//! [Parser] combines both with a chain of tokenizers and runs any number of
//! independent sessions: one-shot over a string, or incrementally over input that
//! arrives in chunks, suspending mid-token when a buffer runs dry.
//!
//! # Example
//!
//! A calculator with operator precedence:
//! ```
//! use lang_lr::rex::Rex;
//! use lang_lr::symbols::{
//!     Associativity, NonTerminal, OperatorLevel, OperatorScope, Production, Terminal,
//! };
//! use lang_lr::{fuser, transformer, GrammarBuilder, Parser};
//! use std::rc::Rc;
//!
//! let number = Rc::new(Terminal::new(
//!     "Number",
//!     Rex::chars(['0'..='9']).plus(),
//!     transformer(|_, lexeme| Ok(lexeme.parse::<i64>()?)),
//! ));
//! let plus = Rc::new(Terminal::literal("+"));
//! let star = Rc::new(Terminal::literal("*"));
//!
//! let expr: Rc<NonTerminal<i64>> = Rc::new(NonTerminal::init("Expr"));
//! expr.set_productions(vec![
//!     Production::new(
//!         vec![(&expr).into(), (&plus).into(), (&expr).into()],
//!         fuser(|_, values| Ok(values[0] + values[2])),
//!     ),
//!     Production::new(
//!         vec![(&expr).into(), (&star).into(), (&expr).into()],
//!         fuser(|_, values| Ok(values[0] * values[2])),
//!     ),
//!     Production::new(
//!         vec![(&number).into()],
//!         fuser(|_, mut values| Ok(values.pop().unwrap())),
//!     ),
//! ]);
//!
//! let mut builder = GrammarBuilder::new("Calc", &expr);
//! builder.add_noise("Whitespace", Rex::chars([' ', '\t']).plus());
//! builder.operator_scope(OperatorScope::new(vec![
//!     OperatorLevel::literals(Associativity::Left, &["+"]),
//!     OperatorLevel::literals(Associativity::Left, &["*"]),
//! ]));
//!
//! let parser = Parser::new(builder).unwrap();
//! assert_eq!(parser.parse("1 + 2 * 3").unwrap(), 7);
//! assert_eq!(parser.parse("2 * 3 + 4").unwrap(), 10);
//! ```

mod binary;
pub mod chars;
mod dfa;
mod error;
pub mod examples;
mod grammar;
mod lalr;
pub mod rex;
mod runtime;
pub mod symbols;
mod syntax_tree;
mod util;

pub use binary::{read_grammar, write_grammar, MAGIC, VERSION};
pub use dfa::{Dfa, DfaState, DfaTransition};
pub use error::{
    BuildDiagnostic, BuildMessage, FormatError, LrConflictKind, ParseErrorKind, ParserDiagnostic,
    Severity,
};
pub use grammar::{
    BuildOptions, GrammarBuilder, GrammarProperties, GrammarSource, PackedGrammar,
    SemanticTables, SymbolKind, SymbolRef,
};
pub use lalr::{LalrState, LalrTable, LrAction};
pub use runtime::{
    ChunkSource, DfaTokenizer, ISource, ITokenize, ParseSession, ParseStatus, Parser,
    SemanticMode, StateStore, StringSource, Token, TokenizerOutcome,
};
pub use syntax_tree::SyntaxTree;
pub use util::{CancellationToken, Log, Position};

use std::fmt::Debug;
use std::rc::Rc;

/// A trait implemented by the semantic value type flowing through a parse.
///
/// The engine itself never inspects values beyond creating the placeholder
/// for symbols nobody reads: literal terminals, or every value of a
/// session running as a syntax check.
pub trait ValueImpl: Debug {
    /// The placeholder value of symbols without a meaningful payload.
    fn empty() -> Self;
}

impl ValueImpl for () {
    fn empty() -> Self {}
}

impl ValueImpl for String {
    fn empty() -> Self {
        String::new()
    }
}

impl ValueImpl for i64 {
    fn empty() -> Self {
        0
    }
}

impl ValueImpl for f64 {
    fn empty() -> Self {
        0.0
    }
}

/// The span information handed to semantic callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticContext {
    pub start: Position,
    pub end: Position,
}

/// The error type semantic callbacks may raise; surfaced as a
/// [ParseErrorKind::UserDiagnostic] with the current position.
pub type SemanticError = Box<dyn std::error::Error>;

/// A per-terminal callback turning a matched lexeme into a semantic value.
pub type TransformerFn<T> = Rc<dyn Fn(&SemanticContext, &str) -> Result<T, SemanticError>>;

/// A per-production callback folding member values into the head's value.
pub type FuserFn<T> = Rc<dyn Fn(&SemanticContext, Vec<T>) -> Result<T, SemanticError>>;

/// Wrap a closure as a [TransformerFn].
pub fn transformer<T, F>(f: F) -> TransformerFn<T>
where
    F: Fn(&SemanticContext, &str) -> Result<T, SemanticError> + 'static,
{
    Rc::new(f)
}

/// Wrap a closure as a [FuserFn].
pub fn fuser<T, F>(f: F) -> FuserFn<T>
where
    F: Fn(&SemanticContext, Vec<T>) -> Result<T, SemanticError> + 'static,
{
    Rc::new(f)
}
