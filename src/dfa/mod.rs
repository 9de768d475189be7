//! Construction of the deterministic tokenizing automaton.
//!
//! Every tokenizer symbol contributes its lowered regex to one shared
//! followpos construction; each regex is terminated by a distinct end leaf
//! tagged with the symbol and a priority. A DFA state is the set of regex
//! positions that are still alive, represented as a bit set and deduplicated
//! through a hash map, the same worklist shape the LALR builder uses for its
//! item sets.

mod build;

pub use build::build_dfa;

#[cfg(test)]
mod __tests__;

use crate::grammar::SymbolRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One transition of a DFA state over an inclusive character range.
///
/// A [None] target is an explicit failure: the range is claimed so that the
/// state's default transition cannot apply to it.
pub struct DfaTransition {
    pub start: char,
    pub end: char,
    pub target: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaState {
    /// Sorted, non-overlapping transitions.
    pub transitions: Vec<DfaTransition>,
    /// Where characters outside every explicit transition go, if anywhere.
    pub default_target: Option<usize>,
    /// Accepted symbols in `(priority, symbol)` order; more than one entry
    /// is a tokenizer conflict surfaced at build time.
    pub accepts: Vec<SymbolRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The finished tokenizing automaton. State 0 is the initial state.
pub struct Dfa {
    pub states: Vec<DfaState>,
}

impl DfaState {
    /// The successor for `c`, if any.
    pub fn next(&self, c: char) -> Option<usize> {
        let index = match self
            .transitions
            .binary_search_by_key(&c, |t| t.end)
        {
            Ok(index) | Err(index) => index,
        };
        if let Some(t) = self.transitions.get(index) {
            if t.start <= c && c <= t.end {
                return t.target;
            }
        }
        self.default_target
    }

    pub fn accept(&self) -> Option<SymbolRef> {
        self.accepts.first().copied()
    }
}

impl Dfa {
    pub const INITIAL: usize = 0;

    pub fn state(&self, index: usize) -> &DfaState {
        &self.states[index]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether the automaton accepts `input` and which symbol it yields.
    ///
    /// A whole-string probe used by tests and diagnostics; the runtime
    /// drives the automaton incrementally instead.
    pub fn accepts(&self, input: &str) -> Option<SymbolRef> {
        let mut state = Dfa::INITIAL;
        for c in input.chars() {
            state = self.states[state].next(c)?;
        }
        self.states[state].accept()
    }
}
