use super::{LalrState, LalrTable, LrAction};
use crate::error::{BuildDiagnostic, BuildMessage, LrConflictKind};
use crate::grammar::{GrammarDefinition, SymbolKind, SymbolRef};
use crate::symbols::Associativity;
use crate::util::CancellationToken;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// The production index of the augmented rule `S' -> S`.
const AUGMENTED: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Lookahead {
    Token(SymbolRef),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// An LR(1) item: a production, a dot offset and one lookahead.
struct Item {
    production: usize,
    dot: usize,
    lookahead: Lookahead,
}

/// Build the LALR(1) table for the definition.
///
/// Cancellation yields `Err` with no diagnostics; residual conflicts yield
/// one diagnostic each.
pub fn build_lalr(
    definition: &GrammarDefinition,
    cancellation: &CancellationToken,
) -> Result<LalrTable, Vec<BuildDiagnostic>> {
    let context = Context::new(definition);

    // Canonical LR(1) automaton.
    let initial = context.closure(vec![Item {
        production: AUGMENTED,
        dot: 0,
        lookahead: Lookahead::Eof,
    }]);

    let mut states: Vec<BTreeSet<Item>> = vec![initial.clone()];
    let mut known_states: HashMap<BTreeSet<Item>, usize> = HashMap::new();
    known_states.insert(initial, 0);
    let mut transitions: Vec<BTreeMap<SymbolRef, usize>> = vec![BTreeMap::new()];
    let mut state_queue: VecDeque<usize> = VecDeque::new();
    state_queue.push_back(0);

    while let Some(source) = state_queue.pop_front() {
        if cancellation.is_cancelled() {
            return Err(Vec::new());
        }
        let items = states[source].clone();
        let mut next_symbols: BTreeSet<SymbolRef> = BTreeSet::new();
        for item in &items {
            if let Some(symbol) = context.next_symbol(item) {
                next_symbols.insert(symbol);
            }
        }
        for symbol in next_symbols {
            let advanced: Vec<Item> = items
                .iter()
                .filter(|item| context.next_symbol(item) == Some(symbol))
                .map(|item| Item {
                    production: item.production,
                    dot: item.dot + 1,
                    lookahead: item.lookahead,
                })
                .collect();
            let target_items = context.closure(advanced);
            let target = match known_states.get(&target_items) {
                Some(existing) => *existing,
                None => {
                    let index = states.len();
                    states.push(target_items.clone());
                    known_states.insert(target_items, index);
                    transitions.push(BTreeMap::new());
                    state_queue.push_back(index);
                    index
                }
            };
            transitions[source].insert(symbol, target);
        }
    }

    // Merge item sets with equal cores into LALR(1) sets.
    let mut core_index: HashMap<BTreeSet<(usize, usize)>, usize> = HashMap::new();
    let mut merged_of: Vec<usize> = Vec::with_capacity(states.len());
    let mut merged_items: Vec<BTreeSet<Item>> = Vec::new();
    for items in &states {
        let core: BTreeSet<(usize, usize)> = items
            .iter()
            .map(|item| (item.production, item.dot))
            .collect();
        let merged = match core_index.get(&core) {
            Some(existing) => {
                merged_items[*existing].extend(items.iter().copied());
                *existing
            }
            None => {
                let index = merged_items.len();
                core_index.insert(core, index);
                merged_items.push(items.clone());
                index
            }
        };
        merged_of.push(merged);
    }

    let mut merged_transitions: Vec<BTreeMap<SymbolRef, usize>> =
        vec![BTreeMap::new(); merged_items.len()];
    for (source, map) in transitions.iter().enumerate() {
        for (symbol, target) in map {
            merged_transitions[merged_of[source]].insert(*symbol, merged_of[*target]);
        }
    }

    // Emit ACTION and GOTO tables.
    let mut diagnostics: Vec<BuildDiagnostic> = Vec::new();
    let mut table: Vec<LalrState> = Vec::with_capacity(merged_items.len());
    for (index, items) in merged_items.iter().enumerate() {
        if cancellation.is_cancelled() {
            return Err(Vec::new());
        }
        let mut actions: BTreeMap<SymbolRef, LrAction> = BTreeMap::new();
        let mut eof_action: Option<LrAction> = None;
        let mut gotos: Vec<(u32, usize)> = Vec::new();

        for (symbol, target) in &merged_transitions[index] {
            match symbol.kind {
                SymbolKind::NonTerminal => gotos.push((symbol.index, *target)),
                _ => {
                    actions.insert(*symbol, LrAction::Shift(*target));
                }
            }
        }

        for item in items {
            if context.next_symbol(item).is_some() {
                continue;
            }
            let resolution = match item.lookahead {
                Lookahead::Eof => {
                    let proposed = if item.production == AUGMENTED {
                        LrAction::Accept
                    } else {
                        LrAction::Reduce(item.production)
                    };
                    resolve(&context, eof_action, proposed, None, index, items)
                }
                Lookahead::Token(token) => {
                    let current = actions.get(&token).copied();
                    resolve(
                        &context,
                        current,
                        LrAction::Reduce(item.production),
                        Some(token),
                        index,
                        items,
                    )
                }
            };
            match resolution {
                Ok(action) => match item.lookahead {
                    Lookahead::Eof => eof_action = Some(action),
                    Lookahead::Token(token) => {
                        actions.insert(token, action);
                    }
                },
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        table.push(LalrState {
            actions: actions.into_iter().collect(),
            eof_action,
            gotos,
        });
    }

    if diagnostics.is_empty() {
        Ok(LalrTable { states: table })
    } else {
        diagnostics.sort_by_key(|d| format!("{}", d));
        diagnostics.dedup();
        Err(diagnostics)
    }
}

/// Resolve a proposed reduce/accept action against the action already in
/// the cell, applying operator precedence where it is allowed to decide.
fn resolve(
    context: &Context,
    current: Option<LrAction>,
    proposed: LrAction,
    token: Option<SymbolRef>,
    state: usize,
    items: &BTreeSet<Item>,
) -> Result<LrAction, BuildDiagnostic> {
    let current_action = match current {
        None => return Ok(proposed),
        Some(action) => action,
    };

    let conflict = |kind: LrConflictKind| {
        BuildDiagnostic::error(BuildMessage::LrConflict {
            kind,
            state,
            terminal: token.map(|t| context.definition.symbol_name(t)),
            items: items
                .iter()
                .filter(|item| {
                    let next = context.next_symbol(item);
                    next.is_none() || next == token
                })
                .take(6)
                .map(|item| context.render_item(item))
                .collect(),
        })
    };

    match (current_action, proposed) {
        (LrAction::Shift(target), LrAction::Reduce(production)) => {
            let token = token.expect("a shift conflict always involves a token");
            let shift_prec = context.token_precedence(token);
            let reduce_prec = context.production_precedence(production);
            match (shift_prec, reduce_prec) {
                (Some((shift_level, _)), Some((reduce_level, associativity))) => {
                    if reduce_level > shift_level {
                        Ok(LrAction::Reduce(production))
                    } else if shift_level > reduce_level {
                        Ok(LrAction::Shift(target))
                    } else {
                        match associativity {
                            Associativity::Left => Ok(LrAction::Reduce(production)),
                            Associativity::Right => Ok(LrAction::Shift(target)),
                            Associativity::NonAssoc => Ok(LrAction::Error),
                            Associativity::PrecedenceOnly => {
                                Err(conflict(LrConflictKind::ShiftReduce))
                            }
                        }
                    }
                }
                _ => Err(conflict(LrConflictKind::ShiftReduce)),
            }
        }
        (LrAction::Reduce(_), LrAction::Reduce(_)) => Err(conflict(LrConflictKind::ReduceReduce)),
        (LrAction::Accept, LrAction::Reduce(_)) | (LrAction::Reduce(_), LrAction::Accept) => {
            Err(conflict(LrConflictKind::AcceptReduce))
        }
        (left, right) if left == right => Ok(left),
        _ => Err(conflict(LrConflictKind::ReduceReduce)),
    }
}

struct Context<'d> {
    definition: &'d GrammarDefinition,
    productions_of: Vec<Vec<usize>>,
    first_sets: Vec<HashSet<SymbolRef>>,
    nullable: Vec<bool>,
}

impl<'d> Context<'d> {
    fn new(definition: &'d GrammarDefinition) -> Self {
        let productions_of = definition.productions_of();
        let nonterminal_count = definition.nonterminals.len();
        let mut first_sets: Vec<HashSet<SymbolRef>> = vec![HashSet::new(); nonterminal_count];
        let mut nullable = vec![false; nonterminal_count];

        // Fixpoint over FIRST and nullability.
        loop {
            let mut changed = false;
            for production in &definition.productions {
                let head = production.head as usize;
                let mut all_nullable = true;
                for member in &production.handle {
                    match member.kind {
                        SymbolKind::NonTerminal => {
                            let member_index = member.index as usize;
                            let additions: Vec<SymbolRef> =
                                first_sets[member_index].iter().copied().collect();
                            for token in additions {
                                changed |= first_sets[head].insert(token);
                            }
                            if !nullable[member_index] {
                                all_nullable = false;
                                break;
                            }
                        }
                        _ => {
                            changed |= first_sets[head].insert(*member);
                            all_nullable = false;
                            break;
                        }
                    }
                }
                if all_nullable && !nullable[head] {
                    nullable[head] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Self {
            definition,
            productions_of,
            first_sets,
            nullable,
        }
    }

    fn next_symbol(&self, item: &Item) -> Option<SymbolRef> {
        if item.production == AUGMENTED {
            if item.dot == 0 {
                Some(SymbolRef::nonterminal(self.definition.start_symbol))
            } else {
                None
            }
        } else {
            self.definition.productions[item.production]
                .handle
                .get(item.dot)
                .copied()
        }
    }

    /// FIRST of the handle tail after the dot, followed by the lookahead.
    fn first_after(&self, item: &Item) -> Vec<Lookahead> {
        let mut result: BTreeSet<Lookahead> = BTreeSet::new();
        let handle: &[SymbolRef] = if item.production == AUGMENTED {
            &[]
        } else {
            &self.definition.productions[item.production].handle
        };
        let mut tail_nullable = true;
        for member in handle.iter().skip(item.dot + 1) {
            match member.kind {
                SymbolKind::NonTerminal => {
                    let index = member.index as usize;
                    for token in &self.first_sets[index] {
                        result.insert(Lookahead::Token(*token));
                    }
                    if !self.nullable[index] {
                        tail_nullable = false;
                        break;
                    }
                }
                _ => {
                    result.insert(Lookahead::Token(*member));
                    tail_nullable = false;
                    break;
                }
            }
        }
        if tail_nullable {
            result.insert(item.lookahead);
        }
        result.into_iter().collect()
    }

    fn closure(&self, seed: Vec<Item>) -> BTreeSet<Item> {
        let mut items: BTreeSet<Item> = BTreeSet::new();
        let mut queue: VecDeque<Item> = seed.into_iter().collect();
        while let Some(item) = queue.pop_front() {
            if !items.insert(item) {
                continue;
            }
            let next = match self.next_symbol(&item) {
                Some(symbol) if symbol.kind == SymbolKind::NonTerminal => symbol,
                _ => continue,
            };
            let lookaheads = self.first_after(&item);
            for production in &self.productions_of[next.index as usize] {
                for lookahead in &lookaheads {
                    queue.push_back(Item {
                        production: *production,
                        dot: 0,
                        lookahead: *lookahead,
                    });
                }
            }
        }
        items
    }

    fn token_precedence(&self, token: SymbolRef) -> Option<(usize, Associativity)> {
        match token.kind {
            SymbolKind::Terminal => self.definition.terminals[token.index as usize].precedence,
            _ => None,
        }
    }

    fn production_precedence(&self, production: usize) -> Option<(usize, Associativity)> {
        self.definition.productions[production].precedence
    }

    fn render_item(&self, item: &Item) -> String {
        use std::fmt::Write;
        let mut rendered = String::new();
        if item.production == AUGMENTED {
            let start = SymbolRef::nonterminal(self.definition.start_symbol);
            if item.dot == 0 {
                let _ = write!(rendered, "S' ::= . {}", self.definition.symbol_name(start));
            } else {
                let _ = write!(rendered, "S' ::= {} .", self.definition.symbol_name(start));
            }
            return rendered;
        }
        let production = &self.definition.productions[item.production];
        let _ = write!(
            rendered,
            "{} ::=",
            self.definition.nonterminals[production.head as usize]
        );
        for (position, member) in production.handle.iter().enumerate() {
            if position == item.dot {
                let _ = write!(rendered, " .");
            }
            let _ = write!(rendered, " {}", self.definition.symbol_name(*member));
        }
        if item.dot == production.handle.len() {
            let _ = write!(rendered, " .");
        }
        rendered
    }
}
