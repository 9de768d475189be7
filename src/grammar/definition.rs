use crate::rex::LoweredRex;
use crate::symbols::{Associativity, GroupAttributes};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// The kind of a numbered grammar symbol.
pub enum SymbolKind {
    Terminal,
    Noise,
    GroupStart,
    GroupEnd,
    NonTerminal,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A resolved reference to a numbered symbol: `(kind, index)`.
pub struct SymbolRef {
    pub kind: SymbolKind,
    pub index: u32,
}

impl SymbolRef {
    pub fn new(kind: SymbolKind, index: u32) -> Self {
        Self { kind, index }
    }

    pub fn terminal(index: u32) -> Self {
        Self::new(SymbolKind::Terminal, index)
    }

    pub fn nonterminal(index: u32) -> Self {
        Self::new(SymbolKind::NonTerminal, index)
    }

    /// Whether a token of this symbol is delivered to the parser.
    pub fn is_parser_input(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal | SymbolKind::Virtual)
    }
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Terminal => write!(f, "terminal"),
            SymbolKind::Noise => write!(f, "noise"),
            SymbolKind::GroupStart => write!(f, "group start"),
            SymbolKind::GroupEnd => write!(f, "group end"),
            SymbolKind::NonTerminal => write!(f, "nonterminal"),
            SymbolKind::Virtual => write!(f, "virtual terminal"),
        }
    }
}

/// A numbered terminal of the lowered grammar.
///
/// Container terminals of lexical groups carry no regex; the group machinery
/// produces their tokens.
#[derive(Debug, Clone)]
pub struct TerminalDef {
    pub name: String,
    pub rex: Option<Rc<LoweredRex>>,
    pub hidden: bool,
    /// Precedence of the terminal when it occurs as an operator literal.
    pub precedence: Option<(usize, Associativity)>,
}

/// A numbered noise symbol. Noise containers of lexical groups carry no
/// regex.
#[derive(Debug, Clone)]
pub struct NoiseDef {
    pub name: String,
    pub rex: Option<Rc<LoweredRex>>,
}

/// A numbered group start or end symbol.
#[derive(Debug, Clone)]
pub struct GroupSymbolDef {
    pub name: String,
    pub rex: Rc<LoweredRex>,
}

#[derive(Debug, Clone)]
pub struct ProductionDef {
    pub head: u32,
    pub handle: Vec<SymbolRef>,
    pub precedence: Option<(usize, Associativity)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDef {
    pub name: String,
    pub container: SymbolRef,
    pub start: SymbolRef,
    pub end: SymbolRef,
    pub attributes: GroupAttributes,
    /// Indices of the groups allowed to open inside this one.
    pub nesting: Vec<u32>,
}

/// The resolved, numbered form of a grammar: the input of the DFA and LALR
/// builders.
#[derive(Debug, Clone)]
pub struct GrammarDefinition {
    pub name: String,
    pub case_sensitive: bool,
    pub terminals: Vec<TerminalDef>,
    pub noise: Vec<NoiseDef>,
    pub group_starts: Vec<GroupSymbolDef>,
    pub group_ends: Vec<GroupSymbolDef>,
    pub virtuals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub productions: Vec<ProductionDef>,
    pub groups: Vec<GroupDef>,
    /// Index of the start nonterminal.
    pub start_symbol: u32,
}

impl GrammarDefinition {
    /// The display name of a numbered symbol, with kind disambiguation for
    /// the kinds that share name spaces in diagnostics.
    pub fn symbol_name(&self, sym: SymbolRef) -> String {
        let index = sym.index as usize;
        match sym.kind {
            SymbolKind::Terminal => self.terminals[index].name.clone(),
            SymbolKind::Noise => format!("{} ({})", self.noise[index].name, sym.kind),
            SymbolKind::GroupStart => {
                format!("{} ({})", self.group_starts[index].name, sym.kind)
            }
            SymbolKind::GroupEnd => format!("{} ({})", self.group_ends[index].name, sym.kind),
            SymbolKind::NonTerminal => format!("<{}>", self.nonterminals[index]),
            SymbolKind::Virtual => self.virtuals[index].clone(),
        }
    }

    /// Every symbol the tokenizer matches through the DFA, with its lowered
    /// regex.
    pub fn tokenizer_symbols(&self) -> Vec<(SymbolRef, Rc<LoweredRex>)> {
        let mut symbols = Vec::new();
        for (index, t) in self.terminals.iter().enumerate() {
            if let Some(rex) = &t.rex {
                symbols.push((SymbolRef::terminal(index as u32), rex.clone()));
            }
        }
        for (index, n) in self.noise.iter().enumerate() {
            if let Some(rex) = &n.rex {
                symbols.push((
                    SymbolRef::new(SymbolKind::Noise, index as u32),
                    rex.clone(),
                ));
            }
        }
        for (index, g) in self.group_starts.iter().enumerate() {
            symbols.push((
                SymbolRef::new(SymbolKind::GroupStart, index as u32),
                g.rex.clone(),
            ));
        }
        for (index, g) in self.group_ends.iter().enumerate() {
            symbols.push((
                SymbolRef::new(SymbolKind::GroupEnd, index as u32),
                g.rex.clone(),
            ));
        }
        symbols
    }

    /// Production indices grouped by head nonterminal.
    pub fn productions_of(&self) -> Vec<Vec<usize>> {
        let mut by_head: Vec<Vec<usize>> = vec![Vec::new(); self.nonterminals.len()];
        for (index, p) in self.productions.iter().enumerate() {
            by_head[p.head as usize].push(index);
        }
        by_head
    }
}
