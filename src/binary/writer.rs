use super::{action_kind, entry, record, symbol_kind_byte, MAGIC, NO_TARGET, VERSION};
use crate::grammar::{GrammarSource, PackedGrammar, SymbolRef};
use crate::lalr::LrAction;
use std::collections::HashMap;

/// Serialize a packed grammar into the binary container.
///
/// The writer is deterministic: logically equal grammars produce identical
/// streams.
pub fn write_grammar(grammar: &PackedGrammar) -> Vec<u8> {
    let mut strings = StringTable::new();

    // Intern every string in a fixed order before any record is emitted, so
    // the string table never depends on record layout details.
    strings.intern(&grammar.properties.name);
    for terminal in &grammar.terminals {
        strings.intern(&terminal.name);
    }
    for name in &grammar.noise {
        strings.intern(name);
    }
    for name in &grammar.group_starts {
        strings.intern(name);
    }
    for name in &grammar.group_ends {
        strings.intern(name);
    }
    for name in &grammar.virtuals {
        strings.intern(name);
    }
    for name in &grammar.nonterminals {
        strings.intern(name);
    }
    for group in &grammar.groups {
        strings.intern(&group.name);
    }

    let mut stream: Vec<u8> = Vec::new();
    stream.extend_from_slice(MAGIC);
    stream.extend_from_slice(&VERSION.to_le_bytes());

    // Properties.
    let mut rec = Record::new(record::PROPERTIES);
    rec.int32(strings.index_of(&grammar.properties.name));
    rec.boolean(grammar.properties.case_sensitive);
    rec.byte(match grammar.properties.source {
        GrammarSource::Built => 0,
        GrammarSource::Loaded => 1,
    });
    rec.finish(&mut stream);

    // String table.
    let mut rec = Record::new(record::STRING_TABLE);
    rec.int32(strings.table.len() as u32);
    for text in &strings.table {
        rec.string(text);
    }
    rec.finish(&mut stream);

    // Symbol tables, one record per kind.
    let mut rec = Record::new(record::TERMINALS);
    rec.int32(grammar.terminals.len() as u32);
    for terminal in &grammar.terminals {
        rec.int32(strings.index_of(&terminal.name));
        rec.boolean(terminal.hidden);
    }
    rec.finish(&mut stream);

    for (tag, names) in [
        (record::NOISE, &grammar.noise),
        (record::GROUP_STARTS, &grammar.group_starts),
        (record::GROUP_ENDS, &grammar.group_ends),
        (record::VIRTUALS, &grammar.virtuals),
        (record::NONTERMINALS, &grammar.nonterminals),
    ] {
        let mut rec = Record::new(tag);
        rec.int32(names.len() as u32);
        for name in names {
            rec.int32(strings.index_of(name));
        }
        rec.finish(&mut stream);
    }

    // Groups.
    let mut rec = Record::new(record::GROUPS);
    rec.int32(grammar.groups.len() as u32);
    for group in &grammar.groups {
        rec.int32(strings.index_of(&group.name));
        rec.symbol(group.container);
        rec.symbol(group.start);
        rec.symbol(group.end);
        rec.boolean(group.attributes.ends_on_eof);
        rec.boolean(group.attributes.keep_end_token);
        rec.boolean(group.attributes.advance_by_char);
        rec.boolean(group.attributes.is_noise);
        rec.int32(group.nesting.len() as u32);
        for nested in &group.nesting {
            rec.int32(*nested);
        }
    }
    rec.finish(&mut stream);

    // Productions.
    let mut rec = Record::new(record::PRODUCTIONS);
    rec.int32(grammar.productions.len() as u32);
    for production in &grammar.productions {
        rec.int32(production.head);
        rec.int32(production.handle.len() as u32);
        for member in &production.handle {
            rec.symbol(*member);
        }
    }
    rec.finish(&mut stream);

    // DFA states.
    let mut rec = Record::new(record::DFA_STATES);
    rec.int32(grammar.dfa.states.len() as u32);
    for state in &grammar.dfa.states {
        rec.int32(state.transitions.len() as u32);
        for transition in &state.transitions {
            rec.int32(transition.start as u32);
            rec.int32(transition.end as u32);
            rec.int32(transition.target.map_or(NO_TARGET, |t| t as u32));
        }
        rec.int32(state.default_target.map_or(NO_TARGET, |t| t as u32));
        rec.int32(state.accepts.len() as u32);
        for accept in &state.accepts {
            rec.symbol(*accept);
        }
    }
    rec.finish(&mut stream);

    // LALR states.
    let mut rec = Record::new(record::LALR_STATES);
    rec.int32(grammar.lalr.states.len() as u32);
    for state in &grammar.lalr.states {
        rec.int32(state.actions.len() as u32);
        for (token, action) in &state.actions {
            rec.symbol(*token);
            rec.action(Some(*action));
        }
        rec.action(state.eof_action);
        rec.int32(state.gotos.len() as u32);
        for (nonterminal, target) in &state.gotos {
            rec.int32(*nonterminal);
            rec.int32(*target as u32);
        }
    }
    rec.finish(&mut stream);

    // Start symbol.
    let mut rec = Record::new(record::START_SYMBOL);
    rec.int32(grammar.start_symbol);
    rec.finish(&mut stream);

    stream
}

struct StringTable {
    table: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            table: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, text: &str) {
        if !self.index.contains_key(text) {
            self.index.insert(text.to_string(), self.table.len() as u32);
            self.table.push(text.to_string());
        }
    }

    fn index_of(&self, text: &str) -> u32 {
        self.index[text]
    }
}

/// An in-progress record; bytes are buffered so the length prefix can be
/// written first.
struct Record {
    tag: u8,
    body: Vec<u8>,
}

impl Record {
    fn new(tag: u8) -> Self {
        Self {
            tag,
            body: Vec::new(),
        }
    }

    fn byte(&mut self, value: u8) {
        self.body.push(entry::BYTE);
        self.body.push(value);
    }

    fn boolean(&mut self, value: bool) {
        self.body.push(entry::BOOL);
        self.body.push(value as u8);
    }

    fn int32(&mut self, value: u32) {
        self.body.push(entry::INT32);
        self.body.extend_from_slice(&value.to_le_bytes());
    }

    fn string(&mut self, text: &str) {
        self.body.push(entry::STRING);
        let bytes = text.as_bytes();
        self.body.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        self.body.extend_from_slice(bytes);
    }

    fn symbol(&mut self, symbol: SymbolRef) {
        self.byte(symbol_kind_byte(symbol.kind));
        self.int32(symbol.index);
    }

    fn action(&mut self, action: Option<LrAction>) {
        match action {
            Some(LrAction::Shift(target)) => {
                self.byte(action_kind::SHIFT);
                self.int32(target as u32);
            }
            Some(LrAction::Reduce(production)) => {
                self.byte(action_kind::REDUCE);
                self.int32(production as u32);
            }
            Some(LrAction::Accept) => {
                self.byte(action_kind::ACCEPT);
                self.int32(0);
            }
            Some(LrAction::Error) => {
                self.byte(action_kind::ERROR);
                self.int32(0);
            }
            None => {
                self.byte(action_kind::NONE);
                self.int32(0);
            }
        }
    }

    fn finish(self, stream: &mut Vec<u8>) {
        let length = self.body.len() as u32 + 1;
        stream.extend_from_slice(&length.to_le_bytes());
        stream.push(self.tag);
        stream.extend_from_slice(&self.body);
    }
}
