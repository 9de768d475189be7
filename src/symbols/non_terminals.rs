use super::{GrammarSymbol, NonTerminal, Production};
use crate::FuserFn;
use once_cell::unsync::OnceCell;
use std::cell::Cell;
use std::fmt::{Display, Formatter};

impl<T> NonTerminal<T> {
    /// Create a production head without productions, so mutually recursive
    /// rules can reference each other before their bodies exist.
    pub fn init<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            productions: OnceCell::new(),
            ignored_assignments: Cell::new(0),
        }
    }

    /// Create a nonterminal with its productions in one step.
    pub fn new<S: Into<String>>(name: S, productions: Vec<Production<T>>) -> Self {
        let nt = Self::init(name);
        nt.productions
            .set(productions)
            .unwrap_or_else(|_| unreachable!());
        nt
    }

    /// Assign the productions. The first assignment wins; every further call
    /// is ignored and surfaces as a build warning.
    pub fn set_productions(&self, productions: Vec<Production<T>>) -> &Self {
        if self.productions.set(productions).is_err() {
            self.ignored_assignments
                .set(self.ignored_assignments.get() + 1);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn productions(&self) -> Option<&Vec<Production<T>>> {
        self.productions.get()
    }

    pub(crate) fn ignored_assignments(&self) -> usize {
        self.ignored_assignments.get()
    }
}

impl<T> Display for NonTerminal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl<T> Production<T> {
    /// A production handle plus the fuser folding the members' values into
    /// the head's value. The handle may be empty.
    pub fn new(members: Vec<GrammarSymbol<T>>, fuser: FuserFn<T>) -> Self {
        Self {
            members,
            fuser,
            precedence_tag: None,
        }
    }

    /// Attach an explicit precedence tag, overriding the default rule that
    /// the last terminal of the handle decides the production's precedence.
    pub fn with_precedence<S: Into<String>>(mut self, tag: S) -> Self {
        self.precedence_tag = Some(tag.into());
        self
    }

    pub fn members(&self) -> &[GrammarSymbol<T>] {
        &self.members
    }

    pub(crate) fn fuser(&self) -> &FuserFn<T> {
        &self.fuser
    }

    pub(crate) fn precedence_tag(&self) -> Option<&str> {
        self.precedence_tag.as_deref()
    }
}
