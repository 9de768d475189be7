//! A module consisting of the symbol utilities used to declare a grammar.
//!
//! A grammar is written by composing symbol values: [Terminal] for tokens
//! matched by a regex, [VirtualTerminal] for tokens only a user tokenizer can
//! emit, [NonTerminal] for production heads, and [Group] for lexical regions
//! such as comments or block literals. The symbols form an `Rc` graph; the
//! [GrammarBuilder](crate::GrammarBuilder) walks the graph from the start
//! symbol, numbers what it reaches and lowers the result into the packed
//! tables.
//!
//! Late binding works the way recursive grammars need it to: a
//! [NonTerminal] is created with [init](NonTerminal::init) and receives its
//! productions afterwards through
//! [set_productions](NonTerminal::set_productions), so mutually recursive
//! rules can reference each other freely.

mod groups;
mod non_terminals;
mod operators;
mod terminals;

#[cfg(test)]
mod __tests__;

use crate::rex::Rex;
use crate::{FuserFn, TransformerFn, ValueImpl};
use once_cell::unsync::OnceCell;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Options attached to a [Terminal].
pub struct TerminalOptions {
    /// Hidden terminals are left out of expected-token lists in syntax
    /// errors.
    pub hidden: bool,
}

/// A tokenizer symbol declared by a regex and a per-symbol transformer.
pub struct Terminal<T> {
    name: String,
    rex: Rex,
    transformer: TransformerFn<T>,
    options: TerminalOptions,
    /// Literal terminals resolve by text: two literals with equal text
    /// denote the same grammar symbol.
    literal_text: Option<String>,
}

/// A terminal with no regex; only user-supplied tokenizers emit it.
pub struct VirtualTerminal {
    name: String,
}

/// A production head. Productions are assigned once; later assignments are
/// ignored with a build warning.
pub struct NonTerminal<T> {
    name: String,
    productions: OnceCell<Vec<Production<T>>>,
    ignored_assignments: Cell<usize>,
}

/// One production: an ordered handle of member symbols and the fuser that
/// folds the members' semantic values into the head's value.
pub struct Production<T> {
    members: Vec<GrammarSymbol<T>>,
    fuser: FuserFn<T>,
    precedence_tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Behavioral attributes of a lexical [Group].
pub struct GroupAttributes {
    /// The group may be closed by the end of input instead of its end
    /// symbol.
    pub ends_on_eof: bool,
    /// The end lexeme is kept as part of the container text.
    pub keep_end_token: bool,
    /// Inside the group the tokenizer advances one character at a time
    /// instead of by whole DFA matches.
    pub advance_by_char: bool,
    /// The finished container is discarded instead of delivered.
    pub is_noise: bool,
}

/// How a group is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEnd {
    /// An explicit end regex, usually a literal.
    Rex(Rex),
    /// The shared special `NewLine` symbol used by line groups.
    NewLine,
}

/// A lexical region delimited by start and end symbols, producing one
/// container token.
pub struct Group<T> {
    name: String,
    start: Rex,
    end: GroupEnd,
    attributes: GroupAttributes,
    /// Names of the groups allowed to open inside this one.
    nesting: RefCell<Vec<String>>,
    transformer: TransformerFn<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Associativity of one precedence level.
pub enum Associativity {
    Left,
    Right,
    NonAssoc,
    /// Takes part in precedence comparison but never breaks an equal-level
    /// tie.
    PrecedenceOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An operator inside a precedence level: either the text of a literal
/// terminal or an opaque tag attached to productions.
pub enum OperatorEntry {
    Literal(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One precedence level of an [OperatorScope]. Earlier levels bind loosely,
/// later levels bind tightly.
pub struct OperatorLevel {
    pub associativity: Associativity,
    pub operators: Vec<OperatorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// An ordered list of precedence levels used to resolve shift-reduce
/// conflicts.
pub struct OperatorScope {
    pub levels: Vec<OperatorLevel>,
}

/// Any symbol usable inside a production handle.
pub enum GrammarSymbol<T> {
    Terminal(Rc<Terminal<T>>),
    Virtual(Rc<VirtualTerminal>),
    NonTerminal(Rc<NonTerminal<T>>),
    Group(Rc<Group<T>>),
}

impl<T> Clone for GrammarSymbol<T> {
    fn clone(&self) -> Self {
        match self {
            GrammarSymbol::Terminal(t) => GrammarSymbol::Terminal(t.clone()),
            GrammarSymbol::Virtual(v) => GrammarSymbol::Virtual(v.clone()),
            GrammarSymbol::NonTerminal(n) => GrammarSymbol::NonTerminal(n.clone()),
            GrammarSymbol::Group(g) => GrammarSymbol::Group(g.clone()),
        }
    }
}

impl<T> GrammarSymbol<T> {
    pub fn name(&self) -> &str {
        match self {
            GrammarSymbol::Terminal(t) => t.name(),
            GrammarSymbol::Virtual(v) => v.name(),
            GrammarSymbol::NonTerminal(n) => n.name(),
            GrammarSymbol::Group(g) => g.name(),
        }
    }

    /// A stable identity for graph walks, independent of the wrapper.
    pub(crate) fn identity(&self) -> usize {
        match self {
            GrammarSymbol::Terminal(t) => Rc::as_ptr(t) as usize,
            GrammarSymbol::Virtual(v) => Rc::as_ptr(v) as usize,
            GrammarSymbol::NonTerminal(n) => Rc::as_ptr(n) as usize,
            GrammarSymbol::Group(g) => Rc::as_ptr(g) as usize,
        }
    }
}

impl<T> From<&Rc<Terminal<T>>> for GrammarSymbol<T> {
    fn from(t: &Rc<Terminal<T>>) -> Self {
        GrammarSymbol::Terminal(t.clone())
    }
}

impl<T> From<&Rc<VirtualTerminal>> for GrammarSymbol<T> {
    fn from(v: &Rc<VirtualTerminal>) -> Self {
        GrammarSymbol::Virtual(v.clone())
    }
}

impl<T> From<&Rc<NonTerminal<T>>> for GrammarSymbol<T> {
    fn from(n: &Rc<NonTerminal<T>>) -> Self {
        GrammarSymbol::NonTerminal(n.clone())
    }
}

impl<T> From<&Rc<Group<T>>> for GrammarSymbol<T> {
    fn from(g: &Rc<Group<T>>) -> Self {
        GrammarSymbol::Group(g.clone())
    }
}

/// The transformer used by literal terminals and containers nobody reads.
pub(crate) fn empty_transformer<T: ValueImpl>() -> TransformerFn<T> {
    Rc::new(|_, _| Ok(T::empty()))
}
