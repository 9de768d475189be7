use super::{action_kind, entry, record, symbol_kind_of, MAGIC, NO_TARGET, VERSION};
use crate::dfa::{Dfa, DfaState, DfaTransition};
use crate::error::FormatError;
use crate::grammar::{
    GrammarProperties, GrammarSource, GroupDef, PackedGrammar, PackedProduction, PackedTerminal,
    SymbolRef,
};
use crate::lalr::{LalrState, LalrTable, LrAction};
use crate::symbols::GroupAttributes;

/// Deserialize a packed grammar from the binary container.
///
/// Records are accepted in any order the writer can produce; a stream with
/// an unknown version, an unknown entry tag or a truncated record is
/// rejected.
pub fn read_grammar(stream: &[u8]) -> Result<PackedGrammar, FormatError> {
    if stream.len() < MAGIC.len() + 2 || &stream[..MAGIC.len()] != MAGIC {
        return Err(FormatError::InvalidMagic);
    }
    let version = u16::from_le_bytes([stream[MAGIC.len()], stream[MAGIC.len() + 1]]);
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let mut properties: Option<GrammarProperties> = None;
    let mut strings: Vec<String> = Vec::new();
    let mut terminals: Vec<(u32, bool)> = Vec::new();
    let mut noise: Vec<u32> = Vec::new();
    let mut group_starts: Vec<u32> = Vec::new();
    let mut group_ends: Vec<u32> = Vec::new();
    let mut virtuals: Vec<u32> = Vec::new();
    let mut nonterminals: Vec<u32> = Vec::new();
    let mut groups: Vec<(u32, GroupDef)> = Vec::new();
    let mut productions: Vec<PackedProduction> = Vec::new();
    let mut dfa: Option<Dfa> = None;
    let mut lalr: Option<LalrTable> = None;
    let mut start_symbol: Option<u32> = None;
    let mut properties_raw: Option<(u32, bool, u8)> = None;

    let mut cursor = MAGIC.len() + 2;
    while cursor < stream.len() {
        if stream.len() - cursor < 4 {
            return Err(FormatError::TruncatedRecord);
        }
        let length = u32::from_le_bytes([
            stream[cursor],
            stream[cursor + 1],
            stream[cursor + 2],
            stream[cursor + 3],
        ]) as usize;
        cursor += 4;
        if length == 0 || stream.len() - cursor < length {
            return Err(FormatError::TruncatedRecord);
        }
        let tag = stream[cursor];
        let mut entries = Entries {
            bytes: &stream[cursor + 1..cursor + length],
            cursor: 0,
        };
        cursor += length;

        match tag {
            record::PROPERTIES => {
                let name = entries.int32()?;
                let case_sensitive = entries.boolean()?;
                let source = entries.byte()?;
                properties_raw = Some((name, case_sensitive, source));
            }
            record::STRING_TABLE => {
                let count = entries.int32()?;
                for _ in 0..count {
                    strings.push(entries.string()?);
                }
            }
            record::TERMINALS => {
                let count = entries.int32()?;
                for _ in 0..count {
                    let name = entries.int32()?;
                    let hidden = entries.boolean()?;
                    terminals.push((name, hidden));
                }
            }
            record::NOISE => read_name_refs(&mut entries, &mut noise)?,
            record::GROUP_STARTS => read_name_refs(&mut entries, &mut group_starts)?,
            record::GROUP_ENDS => read_name_refs(&mut entries, &mut group_ends)?,
            record::VIRTUALS => read_name_refs(&mut entries, &mut virtuals)?,
            record::NONTERMINALS => read_name_refs(&mut entries, &mut nonterminals)?,
            record::GROUPS => {
                let count = entries.int32()?;
                for _ in 0..count {
                    let name = entries.int32()?;
                    let container = entries.symbol()?;
                    let start = entries.symbol()?;
                    let end = entries.symbol()?;
                    let attributes = GroupAttributes {
                        ends_on_eof: entries.boolean()?,
                        keep_end_token: entries.boolean()?,
                        advance_by_char: entries.boolean()?,
                        is_noise: entries.boolean()?,
                    };
                    let nested = entries.int32()?;
                    let mut nesting = Vec::with_capacity(nested as usize);
                    for _ in 0..nested {
                        nesting.push(entries.int32()?);
                    }
                    groups.push((
                        name,
                        GroupDef {
                            name: String::new(), // resolved against the string table below
                            container,
                            start,
                            end,
                            attributes,
                            nesting,
                        },
                    ));
                }
            }
            record::PRODUCTIONS => {
                let count = entries.int32()?;
                for _ in 0..count {
                    let head = entries.int32()?;
                    let length = entries.int32()?;
                    let mut handle = Vec::with_capacity(length as usize);
                    for _ in 0..length {
                        handle.push(entries.symbol()?);
                    }
                    productions.push(PackedProduction { head, handle });
                }
            }
            record::DFA_STATES => {
                let count = entries.int32()?;
                let mut states = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let transition_count = entries.int32()?;
                    let mut transitions = Vec::with_capacity(transition_count as usize);
                    for _ in 0..transition_count {
                        let start = entries.char()?;
                        let end = entries.char()?;
                        let target = entries.int32()?;
                        transitions.push(DfaTransition {
                            start,
                            end,
                            target: (target != NO_TARGET).then(|| target as usize),
                        });
                    }
                    let default = entries.int32()?;
                    let accept_count = entries.int32()?;
                    let mut accepts = Vec::with_capacity(accept_count as usize);
                    for _ in 0..accept_count {
                        accepts.push(entries.symbol()?);
                    }
                    states.push(DfaState {
                        transitions,
                        default_target: (default != NO_TARGET).then(|| default as usize),
                        accepts,
                    });
                }
                dfa = Some(Dfa { states });
            }
            record::LALR_STATES => {
                let count = entries.int32()?;
                let mut states = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let action_count = entries.int32()?;
                    let mut actions = Vec::with_capacity(action_count as usize);
                    for _ in 0..action_count {
                        let token = entries.symbol()?;
                        let action = entries.action()?.ok_or_else(|| {
                            FormatError::MalformedGrammar(
                                "a token action cell cannot be empty".to_string(),
                            )
                        })?;
                        actions.push((token, action));
                    }
                    let eof_action = entries.action()?;
                    let goto_count = entries.int32()?;
                    let mut gotos = Vec::with_capacity(goto_count as usize);
                    for _ in 0..goto_count {
                        let nonterminal = entries.int32()?;
                        let target = entries.int32()?;
                        gotos.push((nonterminal, target as usize));
                    }
                    states.push(LalrState {
                        actions,
                        eof_action,
                        gotos,
                    });
                }
                lalr = Some(LalrTable { states });
            }
            record::START_SYMBOL => {
                start_symbol = Some(entries.int32()?);
            }
            _ => {
                return Err(FormatError::MalformedGrammar(format!(
                    "unknown record tag {:#04x}",
                    tag
                )))
            }
        }
    }

    let resolve = |index: u32| -> Result<String, FormatError> {
        strings.get(index as usize).cloned().ok_or_else(|| {
            FormatError::MalformedGrammar(format!("string reference {} is out of range", index))
        })
    };

    if let Some((name, case_sensitive, source)) = properties_raw {
        properties = Some(GrammarProperties {
            name: resolve(name)?,
            case_sensitive,
            source: if source == 0 {
                GrammarSource::Built
            } else {
                GrammarSource::Loaded
            },
        });
    }

    let properties =
        properties.ok_or_else(|| FormatError::MalformedGrammar("missing properties".to_string()))?;
    let dfa = dfa.ok_or_else(|| FormatError::MalformedGrammar("missing DFA table".to_string()))?;
    let lalr =
        lalr.ok_or_else(|| FormatError::MalformedGrammar("missing LALR table".to_string()))?;
    let start_symbol = start_symbol
        .ok_or_else(|| FormatError::MalformedGrammar("missing start symbol".to_string()))?;

    let grammar = PackedGrammar {
        properties,
        terminals: terminals
            .into_iter()
            .map(|(name, hidden)| {
                Ok(PackedTerminal {
                    name: resolve(name)?,
                    hidden,
                })
            })
            .collect::<Result<_, FormatError>>()?,
        noise: noise.into_iter().map(resolve).collect::<Result<_, _>>()?,
        group_starts: group_starts
            .into_iter()
            .map(resolve)
            .collect::<Result<_, _>>()?,
        group_ends: group_ends
            .into_iter()
            .map(resolve)
            .collect::<Result<_, _>>()?,
        virtuals: virtuals
            .into_iter()
            .map(resolve)
            .collect::<Result<_, _>>()?,
        nonterminals: nonterminals
            .into_iter()
            .map(resolve)
            .collect::<Result<_, _>>()?,
        productions,
        groups: groups
            .into_iter()
            .map(|(name, mut group)| {
                group.name = resolve(name)?;
                Ok(group)
            })
            .collect::<Result<_, FormatError>>()?,
        dfa,
        lalr,
        start_symbol,
    };

    validate(&grammar)?;
    Ok(grammar)
}

fn read_name_refs(entries: &mut Entries, into: &mut Vec<u32>) -> Result<(), FormatError> {
    let count = entries.int32()?;
    for _ in 0..count {
        into.push(entries.int32()?);
    }
    Ok(())
}

/// Reject streams whose tables reference symbols that do not exist.
fn validate(grammar: &PackedGrammar) -> Result<(), FormatError> {
    let in_range = |symbol: SymbolRef| -> bool {
        let index = symbol.index as usize;
        use crate::grammar::SymbolKind::*;
        match symbol.kind {
            Terminal => index < grammar.terminals.len(),
            Noise => index < grammar.noise.len(),
            GroupStart => index < grammar.group_starts.len(),
            GroupEnd => index < grammar.group_ends.len(),
            NonTerminal => index < grammar.nonterminals.len(),
            Virtual => index < grammar.virtuals.len(),
        }
    };

    if grammar.start_symbol as usize >= grammar.nonterminals.len() {
        return Err(FormatError::MalformedGrammar(
            "start symbol is not a nonterminal".to_string(),
        ));
    }
    for production in &grammar.productions {
        if production.head as usize >= grammar.nonterminals.len()
            || !production.handle.iter().all(|member| in_range(*member))
        {
            return Err(FormatError::MalformedGrammar(
                "production references an unknown symbol".to_string(),
            ));
        }
    }
    for group in &grammar.groups {
        if !in_range(group.container) || !in_range(group.start) || !in_range(group.end) {
            return Err(FormatError::MalformedGrammar(
                "group references an unknown symbol".to_string(),
            ));
        }
    }
    for state in &grammar.dfa.states {
        let targets = state
            .transitions
            .iter()
            .filter_map(|t| t.target)
            .chain(state.default_target);
        for target in targets {
            if target >= grammar.dfa.states.len() {
                return Err(FormatError::MalformedGrammar(
                    "DFA transition leaves the state table".to_string(),
                ));
            }
        }
        if !state.accepts.iter().all(|accept| in_range(*accept)) {
            return Err(FormatError::MalformedGrammar(
                "DFA accept references an unknown symbol".to_string(),
            ));
        }
    }
    for state in &grammar.lalr.states {
        for (token, action) in &state.actions {
            if !in_range(*token) {
                return Err(FormatError::MalformedGrammar(
                    "LALR action references an unknown token".to_string(),
                ));
            }
            if let LrAction::Shift(target) = action {
                if *target >= grammar.lalr.states.len() {
                    return Err(FormatError::MalformedGrammar(
                        "LALR shift leaves the state table".to_string(),
                    ));
                }
            }
            if let LrAction::Reduce(production) = action {
                if *production >= grammar.productions.len() {
                    return Err(FormatError::MalformedGrammar(
                        "LALR reduce references an unknown production".to_string(),
                    ));
                }
            }
        }
        for (nonterminal, target) in &state.gotos {
            if *nonterminal as usize >= grammar.nonterminals.len()
                || *target >= grammar.lalr.states.len()
            {
                return Err(FormatError::MalformedGrammar(
                    "LALR goto references an unknown symbol or state".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// A cursor over one record's entry bytes with typed accessors.
struct Entries<'s> {
    bytes: &'s [u8],
    cursor: usize,
}

impl<'s> Entries<'s> {
    fn tagged(&mut self, expected: u8) -> Result<(), FormatError> {
        let tag = *self
            .bytes
            .get(self.cursor)
            .ok_or(FormatError::TruncatedRecord)?;
        if !matches!(
            tag,
            entry::EMPTY | entry::BYTE | entry::BOOL | entry::INT16 | entry::INT32 | entry::STRING
        ) {
            return Err(FormatError::UnknownEntryTag(tag));
        }
        if tag != expected {
            return Err(FormatError::MalformedGrammar(format!(
                "expected entry tag {} but found {}",
                expected, tag
            )));
        }
        self.cursor += 1;
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'s [u8], FormatError> {
        if self.bytes.len() - self.cursor < count {
            return Err(FormatError::TruncatedRecord);
        }
        let slice = &self.bytes[self.cursor..self.cursor + count];
        self.cursor += count;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, FormatError> {
        self.tagged(entry::BYTE)?;
        Ok(self.take(1)?[0])
    }

    fn boolean(&mut self) -> Result<bool, FormatError> {
        self.tagged(entry::BOOL)?;
        Ok(self.take(1)?[0] != 0)
    }

    fn int32(&mut self) -> Result<u32, FormatError> {
        self.tagged(entry::INT32)?;
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self) -> Result<String, FormatError> {
        self.tagged(entry::STRING)?;
        let length = {
            let bytes = self.take(2)?;
            u16::from_le_bytes([bytes[0], bytes[1]]) as usize
        };
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| FormatError::MalformedGrammar("string is not UTF-8".to_string()))
    }

    fn symbol(&mut self) -> Result<SymbolRef, FormatError> {
        let kind_byte = self.byte()?;
        let index = self.int32()?;
        let kind = symbol_kind_of(kind_byte).ok_or_else(|| {
            FormatError::MalformedGrammar(format!("unknown symbol kind {}", kind_byte))
        })?;
        Ok(SymbolRef::new(kind, index))
    }

    fn char(&mut self) -> Result<char, FormatError> {
        let value = self.int32()?;
        char::from_u32(value).ok_or_else(|| {
            FormatError::MalformedGrammar(format!("{:#x} is not a scalar value", value))
        })
    }

    fn action(&mut self) -> Result<Option<LrAction>, FormatError> {
        let kind = self.byte()?;
        let payload = self.int32()?;
        match kind {
            action_kind::SHIFT => Ok(Some(LrAction::Shift(payload as usize))),
            action_kind::REDUCE => Ok(Some(LrAction::Reduce(payload as usize))),
            action_kind::ACCEPT => Ok(Some(LrAction::Accept)),
            action_kind::ERROR => Ok(Some(LrAction::Error)),
            action_kind::NONE => Ok(None),
            _ => Err(FormatError::MalformedGrammar(format!(
                "unknown action kind {}",
                kind
            ))),
        }
    }
}
