use super::{empty_transformer, Group, GroupAttributes, GroupEnd};
use crate::rex::Rex;
use crate::{TransformerFn, ValueImpl};
use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

impl<T: ValueImpl> Group<T> {
    /// A group running from its start symbol to the end of the line.
    ///
    /// Line groups end on the shared `NewLine` symbol, survive an input that
    /// ends without one, and advance character by character so that nothing
    /// inside is tokenized.
    pub fn line<S: Into<String>>(name: S, start: &str) -> Self {
        Self {
            name: name.into(),
            start: Rex::string(start),
            end: GroupEnd::NewLine,
            attributes: GroupAttributes {
                ends_on_eof: true,
                keep_end_token: false,
                advance_by_char: true,
                is_noise: false,
            },
            nesting: RefCell::new(Vec::new()),
            transformer: empty_transformer(),
        }
    }

    /// A group delimited by explicit start and end literals.
    pub fn block<S: Into<String>>(name: S, start: &str, end: &str) -> Self {
        Self {
            name: name.into(),
            start: Rex::string(start),
            end: GroupEnd::Rex(Rex::string(end)),
            attributes: GroupAttributes {
                ends_on_eof: false,
                keep_end_token: true,
                advance_by_char: true,
                is_noise: false,
            },
            nesting: RefCell::new(Vec::new()),
            transformer: empty_transformer(),
        }
    }
}

impl<T> Group<T> {
    pub fn with_attributes(mut self, attributes: GroupAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Deliver the container through this transformer instead of dropping
    /// its value.
    pub fn with_transformer(mut self, transformer: TransformerFn<T>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Discard the finished container instead of delivering it.
    pub fn noise(mut self) -> Self {
        self.attributes.is_noise = true;
        self
    }

    /// Allow `other` to open inside this group.
    pub fn allow_nested(&self, other: &Rc<Group<T>>) -> &Self {
        self.nesting.borrow_mut().push(other.name.clone());
        self
    }

    /// Allow this group to nest inside itself.
    pub fn allow_self_nesting(&self) -> &Self {
        self.nesting.borrow_mut().push(self.name.clone());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> GroupAttributes {
        self.attributes
    }

    pub(crate) fn start_rex(&self) -> &Rex {
        &self.start
    }

    pub(crate) fn end(&self) -> &GroupEnd {
        &self.end
    }

    pub(crate) fn nested_names(&self) -> Vec<String> {
        self.nesting.borrow().clone()
    }

    pub(crate) fn transformer(&self) -> &TransformerFn<T> {
        &self.transformer
    }
}

impl<T> Display for Group<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.end {
            GroupEnd::Rex(end) => write!(f, "{} : /{}/ .. /{}/", self.name, self.start, end),
            GroupEnd::NewLine => write!(f, "{} : /{}/ .. NewLine", self.name, self.start),
        }
    }
}
