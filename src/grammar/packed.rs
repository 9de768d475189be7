use super::definition::{GrammarDefinition, GroupDef, SymbolKind, SymbolRef};
use crate::dfa::Dfa;
use crate::lalr::LalrTable;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Where a packed grammar came from.
pub enum GrammarSource {
    Built,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The small properties map persisted with every grammar.
pub struct GrammarProperties {
    pub name: String,
    pub case_sensitive: bool,
    pub source: GrammarSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedTerminal {
    pub name: String,
    /// Hidden terminals are excluded from expected-token lists.
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedProduction {
    pub head: u32,
    pub handle: Vec<SymbolRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The immutable post-build form of a grammar: symbol tables by kind,
/// productions, groups and the two automata.
///
/// A packed grammar is pure data. It is freely shareable across threads and
/// serializes to the binary grammar format; the semantic callbacks live
/// separately in [SemanticTables](super::SemanticTables).
pub struct PackedGrammar {
    pub properties: GrammarProperties,
    pub terminals: Vec<PackedTerminal>,
    pub noise: Vec<String>,
    pub group_starts: Vec<String>,
    pub group_ends: Vec<String>,
    pub virtuals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub productions: Vec<PackedProduction>,
    pub groups: Vec<GroupDef>,
    pub dfa: Dfa,
    pub lalr: LalrTable,
    pub start_symbol: u32,
}

pub(super) fn pack(definition: GrammarDefinition, dfa: Dfa, lalr: LalrTable) -> PackedGrammar {
    PackedGrammar {
        properties: GrammarProperties {
            name: definition.name,
            case_sensitive: definition.case_sensitive,
            source: GrammarSource::Built,
        },
        terminals: definition
            .terminals
            .into_iter()
            .map(|t| PackedTerminal {
                name: t.name,
                hidden: t.hidden,
            })
            .collect(),
        noise: definition.noise.into_iter().map(|n| n.name).collect(),
        group_starts: definition
            .group_starts
            .into_iter()
            .map(|g| g.name)
            .collect(),
        group_ends: definition.group_ends.into_iter().map(|g| g.name).collect(),
        virtuals: definition.virtuals,
        nonterminals: definition.nonterminals,
        productions: definition
            .productions
            .into_iter()
            .map(|p| PackedProduction {
                head: p.head,
                handle: p.handle,
            })
            .collect(),
        groups: definition.groups,
        dfa,
        lalr,
        start_symbol: definition.start_symbol,
    }
}

impl PackedGrammar {
    /// The display name of a symbol reference, with kind disambiguation for
    /// the tokenizer-side kinds.
    pub fn symbol_name(&self, symbol: SymbolRef) -> String {
        let index = symbol.index as usize;
        match symbol.kind {
            SymbolKind::Terminal => self.terminals[index].name.clone(),
            SymbolKind::Noise => format!("{} ({})", self.noise[index], symbol.kind),
            SymbolKind::GroupStart => format!("{} ({})", self.group_starts[index], symbol.kind),
            SymbolKind::GroupEnd => format!("{} ({})", self.group_ends[index], symbol.kind),
            SymbolKind::NonTerminal => format!("<{}>", self.nonterminals[index]),
            SymbolKind::Virtual => self.virtuals[index].clone(),
        }
    }

    /// The group whose start symbol is `symbol`, if any.
    pub fn group_of_start(&self, symbol: SymbolRef) -> Option<(usize, &GroupDef)> {
        self.groups
            .iter()
            .enumerate()
            .find(|(_, group)| group.start == symbol)
    }

    /// Whether `symbol` closes the group at `group_index`.
    pub fn closes_group(&self, group_index: usize, symbol: SymbolRef) -> bool {
        self.groups[group_index].end == symbol
    }

    /// Render the productions as a grammar listing.
    pub fn listing(&self) -> Result<String, std::fmt::Error> {
        let mut writer = String::new();
        for production in &self.productions {
            write!(
                writer,
                "<{}> ::=",
                self.nonterminals[production.head as usize]
            )?;
            for member in &production.handle {
                write!(writer, " {}", self.symbol_name(*member))?;
            }
            writeln!(writer)?;
        }
        Ok(writer)
    }
}
