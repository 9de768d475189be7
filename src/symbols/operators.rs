use super::{Associativity, OperatorEntry, OperatorLevel, OperatorScope};

impl OperatorLevel {
    pub fn new(associativity: Associativity, operators: Vec<OperatorEntry>) -> Self {
        Self {
            associativity,
            operators,
        }
    }

    /// A level whose operators are literal terminal texts.
    pub fn literals(associativity: Associativity, texts: &[&str]) -> Self {
        Self {
            associativity,
            operators: texts
                .iter()
                .map(|t| OperatorEntry::Literal(t.to_string()))
                .collect(),
        }
    }

    /// A level matched through production precedence tags.
    pub fn tags(associativity: Associativity, tags: &[&str]) -> Self {
        Self {
            associativity,
            operators: tags
                .iter()
                .map(|t| OperatorEntry::Tag(t.to_string()))
                .collect(),
        }
    }
}

impl OperatorScope {
    /// Precedence levels ordered from loose to tight binding.
    pub fn new(levels: Vec<OperatorLevel>) -> Self {
        Self { levels }
    }

    /// The precedence level and associativity of a literal operator.
    pub(crate) fn find_literal(&self, text: &str) -> Option<(usize, Associativity)> {
        self.levels.iter().enumerate().find_map(|(level, l)| {
            l.operators
                .iter()
                .any(|op| matches!(op, OperatorEntry::Literal(t) if t == text))
                .then(|| (level, l.associativity))
        })
    }

    /// The precedence level and associativity of a production tag.
    pub(crate) fn find_tag(&self, tag: &str) -> Option<(usize, Associativity)> {
        self.levels.iter().enumerate().find_map(|(level, l)| {
            l.operators
                .iter()
                .any(|op| matches!(op, OperatorEntry::Tag(t) if t == tag))
                .then(|| (level, l.associativity))
        })
    }
}
