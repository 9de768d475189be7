use super::{empty_transformer, Terminal, TerminalOptions, VirtualTerminal};
use crate::rex::Rex;
use crate::{TransformerFn, ValueImpl};
use std::fmt::{Display, Formatter};

impl<T> Terminal<T> {
    /// Create a terminal from a name, a regex and the transformer invoked on
    /// every matched lexeme.
    pub fn new<S: Into<String>>(name: S, rex: Rex, transformer: TransformerFn<T>) -> Self {
        Self {
            name: name.into(),
            rex,
            transformer,
            options: TerminalOptions::default(),
            literal_text: None,
        }
    }

    pub fn with_options(mut self, options: TerminalOptions) -> Self {
        self.options = options;
        self
    }

    /// Exclude this terminal from expected-token lists in syntax errors.
    pub fn hidden(mut self) -> Self {
        self.options.hidden = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rex(&self) -> &Rex {
        &self.rex
    }

    pub fn options(&self) -> TerminalOptions {
        self.options
    }

    pub(crate) fn transformer(&self) -> &TransformerFn<T> {
        &self.transformer
    }

    pub(crate) fn literal_text(&self) -> Option<&str> {
        self.literal_text.as_deref()
    }
}

impl<T: ValueImpl> Terminal<T> {
    /// A literal terminal. Two literals with equal text denote the same
    /// grammar symbol; the builder resolves them during the build.
    pub fn literal<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        Self {
            name: format!("'{}'", text),
            rex: Rex::Literal(text.clone()),
            transformer: empty_transformer(),
            options: TerminalOptions { hidden: false },
            literal_text: Some(text),
        }
    }
}

impl<T> Display for Terminal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : /{}/", self.name, self.rex)
    }
}

impl VirtualTerminal {
    /// A terminal without a regex; tokens for it come only from user
    /// tokenizers.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for VirtualTerminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (virtual)", self.name)
    }
}
