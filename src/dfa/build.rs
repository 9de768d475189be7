use super::{Dfa, DfaState, DfaTransition};
use crate::chars::CharRange;
use crate::error::{BuildDiagnostic, BuildMessage};
use crate::grammar::{BuildOptions, GrammarDefinition, SymbolRef};
use crate::rex::LoweredRex;
use crate::util::CancellationToken;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

/// Build the tokenizing DFA for every tokenizer symbol of the definition.
///
/// Cancellation yields `Err` with no diagnostics; every other failure
/// carries at least one.
pub fn build_dfa(
    definition: &GrammarDefinition,
    options: &BuildOptions,
    cancellation: &CancellationToken,
) -> Result<Dfa, Vec<BuildDiagnostic>> {
    let symbols = definition.tokenizer_symbols();
    let forest = Forest::plant(&symbols);

    let mut builder = StateBuilder {
        forest: &forest,
        options,
        states: Vec::new(),
        known_states: HashMap::new(),
        state_queue: VecDeque::new(),
        output: Vec::new(),
    };

    let initial = builder.state_index(forest.initial.clone()).map_err(|d| vec![d])?;
    debug_assert_eq!(initial, Dfa::INITIAL);

    while let Some(index) = builder.state_queue.pop_front() {
        if cancellation.is_cancelled() {
            return Err(Vec::new());
        }
        builder.expand(index).map_err(|d| vec![d])?;
    }

    let dfa = Dfa {
        states: builder.output,
    };

    let mut conflicts: Vec<BuildDiagnostic> = dfa
        .states
        .iter()
        .filter(|state| state.accepts.len() > 1)
        .map(|state| {
            BuildDiagnostic::error(BuildMessage::IndistinguishableSymbols(
                state
                    .accepts
                    .iter()
                    .map(|sym| definition.symbol_name(*sym))
                    .collect(),
            ))
        })
        .collect();
    conflicts.sort_by_key(|diagnostic| format!("{}", diagnostic));
    conflicts.dedup();

    if conflicts.is_empty() {
        Ok(dfa)
    } else {
        Err(conflicts)
    }
}

/// One position of the regex forest.
struct Leaf {
    ranges: Vec<CharRange>,
    inverted: bool,
    /// Set for end leaves: `(priority, symbol)`.
    accept: Option<(u8, SymbolRef)>,
}

impl Leaf {
    fn covers(&self, point: u32) -> bool {
        self.ranges
            .iter()
            .any(|r| r.start as u32 <= point && point <= r.end as u32)
    }
}

/// The regex forest after the followpos computation: the leaf table, the
/// follow set of every leaf and the initial position set.
struct Forest {
    leaves: Vec<Leaf>,
    follow: Vec<BitSet>,
    initial: BitSet,
}

impl Forest {
    fn plant(symbols: &[(SymbolRef, Rc<LoweredRex>)]) -> Self {
        let total = symbols
            .iter()
            .map(|(_, rex)| count_leaves(rex) + 1)
            .sum::<usize>();

        let mut walker = Walker {
            leaves: Vec::with_capacity(total),
            follow: vec![BitSet::empty(total); total],
            size: total,
        };

        let mut initial = BitSet::empty(total);
        for (symbol, rex) in symbols {
            let priority = if rex.has_loop() { 1 } else { 0 };
            let facts = walker.walk(rex);
            let end = walker.alloc(Leaf {
                ranges: Vec::new(),
                inverted: false,
                accept: Some((priority, *symbol)),
            });
            for leaf in facts.last.ones() {
                walker.follow[leaf].insert(end);
            }
            initial.union_with(&facts.first);
            if facts.nullable {
                // A nullable tokenizer symbol is rejected before the DFA is
                // built; accept the empty match anyway so the automaton
                // stays faithful to its inputs.
                initial.insert(end);
            }
        }

        Forest {
            leaves: walker.leaves,
            follow: walker.follow,
            initial,
        }
    }
}

struct Walker {
    leaves: Vec<Leaf>,
    follow: Vec<BitSet>,
    size: usize,
}

struct Facts {
    nullable: bool,
    first: BitSet,
    last: BitSet,
}

impl Walker {
    fn alloc(&mut self, leaf: Leaf) -> usize {
        self.leaves.push(leaf);
        self.leaves.len() - 1
    }

    fn walk(&mut self, rex: &LoweredRex) -> Facts {
        match rex {
            LoweredRex::Chars { ranges, inverted } => {
                let index = self.alloc(Leaf {
                    ranges: ranges.clone(),
                    inverted: *inverted,
                    accept: None,
                });
                let mut set = BitSet::empty(self.size);
                set.insert(index);
                Facts {
                    nullable: false,
                    first: set.clone(),
                    last: set,
                }
            }
            LoweredRex::Empty => Facts {
                nullable: true,
                first: BitSet::empty(self.size),
                last: BitSet::empty(self.size),
            },
            LoweredRex::Void => Facts {
                nullable: false,
                first: BitSet::empty(self.size),
                last: BitSet::empty(self.size),
            },
            LoweredRex::Concat(terms) => {
                let mut nullable = true;
                let mut first = BitSet::empty(self.size);
                let mut last = BitSet::empty(self.size);
                for term in terms {
                    let facts = self.walk(term);
                    for leaf in last.ones() {
                        self.follow[leaf].union_with(&facts.first);
                    }
                    if nullable {
                        first.union_with(&facts.first);
                    }
                    if facts.nullable {
                        last.union_with(&facts.last);
                    } else {
                        last = facts.last;
                    }
                    nullable = nullable && facts.nullable;
                }
                Facts {
                    nullable,
                    first,
                    last,
                }
            }
            LoweredRex::Alt(terms) => {
                let mut nullable = false;
                let mut first = BitSet::empty(self.size);
                let mut last = BitSet::empty(self.size);
                for term in terms {
                    let facts = self.walk(term);
                    nullable = nullable || facts.nullable;
                    first.union_with(&facts.first);
                    last.union_with(&facts.last);
                }
                Facts {
                    nullable,
                    first,
                    last,
                }
            }
            LoweredRex::Star(inner) => {
                let facts = self.walk(inner);
                for leaf in facts.last.ones() {
                    self.follow[leaf].union_with(&facts.first);
                }
                Facts {
                    nullable: true,
                    first: facts.first,
                    last: facts.last,
                }
            }
        }
    }
}

fn count_leaves(rex: &LoweredRex) -> usize {
    match rex {
        LoweredRex::Chars { .. } => 1,
        LoweredRex::Empty | LoweredRex::Void => 0,
        LoweredRex::Concat(terms) | LoweredRex::Alt(terms) => {
            terms.iter().map(count_leaves).sum()
        }
        LoweredRex::Star(inner) => count_leaves(inner),
    }
}

struct StateBuilder<'f> {
    forest: &'f Forest,
    options: &'f BuildOptions,
    states: Vec<BitSet>,
    known_states: HashMap<BitSet, usize>,
    state_queue: VecDeque<usize>,
    output: Vec<DfaState>,
}

impl<'f> StateBuilder<'f> {
    /// The index of the state identified by `positions`, creating it if the
    /// position set has not been seen.
    fn state_index(&mut self, positions: BitSet) -> Result<usize, BuildDiagnostic> {
        if let Some(existing) = self.known_states.get(&positions) {
            return Ok(*existing);
        }
        if self.states.len() >= self.options.max_tokenizer_states {
            return Err(BuildDiagnostic::error(BuildMessage::DfaStateLimitExceeded(
                self.options.max_tokenizer_states,
            )));
        }
        let index = self.states.len();
        self.states.push(positions.clone());
        self.known_states.insert(positions, index);
        self.state_queue.push_back(index);
        self.output.push(DfaState {
            transitions: Vec::new(),
            default_target: None,
            accepts: Vec::new(),
        });
        Ok(index)
    }

    fn expand(&mut self, index: usize) -> Result<(), BuildDiagnostic> {
        let positions = self.states[index].clone();

        let mut accepts: Vec<(u8, SymbolRef)> = positions
            .ones()
            .filter_map(|leaf| self.forest.leaves[leaf].accept)
            .collect();
        accepts.sort();
        accepts.dedup();
        if self.options.prioritize_fixed_length_symbols && accepts.len() > 1 {
            let best = accepts[0].0;
            if accepts.iter().filter(|(priority, _)| *priority == best).count() == 1 {
                accepts.truncate(1);
            }
        }

        let char_leaves: Vec<usize> = positions
            .ones()
            .filter(|leaf| self.forest.leaves[*leaf].accept.is_none())
            .collect();
        let inverted_leaves: Vec<usize> = char_leaves
            .iter()
            .copied()
            .filter(|leaf| self.forest.leaves[*leaf].inverted)
            .collect();

        // Boundary sweep over half-open edit points; between two adjacent
        // points the covering leaf set is constant.
        let mut points: BTreeSet<u32> = BTreeSet::new();
        for leaf in &char_leaves {
            for range in &self.forest.leaves[*leaf].ranges {
                points.insert(range.start as u32);
                points.insert(range.end as u32 + 1);
            }
        }

        let has_default = !inverted_leaves.is_empty();

        let mut transitions: Vec<DfaTransition> = Vec::new();
        let boundary: Vec<u32> = points.into_iter().collect();
        for window in boundary.windows(2) {
            let (from, until) = (window[0], window[1]);
            let mut matching = BitSet::empty(self.forest.leaves.len());
            let mut suppressed = 0usize;
            for leaf in &char_leaves {
                let covers = self.forest.leaves[*leaf].covers(from);
                if self.forest.leaves[*leaf].inverted {
                    if covers {
                        suppressed += 1;
                    } else {
                        matching.union_with(&self.forest.follow[*leaf]);
                    }
                } else if covers {
                    matching.union_with(&self.forest.follow[*leaf]);
                }
            }

            let inside_events = char_leaves.iter().any(|leaf| {
                let l = &self.forest.leaves[*leaf];
                !l.inverted && l.covers(from)
            }) || suppressed > 0;
            if !inside_events {
                // Outside every explicit range; the default transition owns
                // this stretch.
                continue;
            }

            let target = if !matching.is_clear() {
                Some(self.state_index(matching)?)
            } else if has_default {
                // Mask the default: every leaf here is a suppressed inverted
                // one, so the character must fail outright.
                None
            } else {
                continue;
            };

            if let Some((start, end)) = segment_chars(from, until - 1) {
                match transitions.last_mut() {
                    Some(last)
                        if last.target == target
                            && crate::chars::char_next(last.end) == Some(start) =>
                    {
                        last.end = end;
                    }
                    _ => transitions.push(DfaTransition { start, end, target }),
                }
            }
        }

        let full_cover = transitions.first().map_or(false, |first| first.start == '\0')
            && transitions.last().map_or(false, |last| last.end == char::MAX)
            && transitions
                .windows(2)
                .all(|w| crate::chars::char_next(w[0].end) == Some(w[1].start));

        let default_target = if has_default && !full_cover {
            let mut union = BitSet::empty(self.forest.leaves.len());
            for leaf in &inverted_leaves {
                union.union_with(&self.forest.follow[*leaf]);
            }
            Some(self.state_index(union)?)
        } else {
            None
        };

        let state = &mut self.output[index];
        state.transitions = transitions;
        state.default_target = default_target;
        state.accepts = accepts.into_iter().map(|(_, symbol)| symbol).collect();
        Ok(())
    }
}

/// Clamp a `u32` segment to valid scalar values, stepping around the
/// surrogate gap. Returns [None] for segments that vanish after clamping.
fn segment_chars(from: u32, to: u32) -> Option<(char, char)> {
    let from = if (0xD800..=0xDFFF).contains(&from) {
        0xE000
    } else {
        from
    };
    let to = if (0xD800..=0xDFFF).contains(&to) {
        0xD7FF
    } else {
        to
    };
    if from > to {
        return None;
    }
    Some((char::from_u32(from)?, char::from_u32(to)?))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A fixed-width bit set identifying a DFA state by its positions.
struct BitSet {
    blocks: Vec<u64>,
}

impl BitSet {
    fn empty(bits: usize) -> Self {
        Self {
            blocks: vec![0; (bits + 63) / 64],
        }
    }

    fn insert(&mut self, bit: usize) {
        self.blocks[bit / 64] |= 1u64 << (bit % 64);
    }

    fn union_with(&mut self, other: &BitSet) {
        debug_assert_eq!(self.blocks.len(), other.blocks.len());
        for (block, addition) in self.blocks.iter_mut().zip(&other.blocks) {
            *block |= addition;
        }
    }

    fn is_clear(&self) -> bool {
        self.blocks.iter().all(|block| *block == 0)
    }

    fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().enumerate().flat_map(|(index, block)| {
            (0..64usize)
                .filter(move |bit| block & (1u64 << bit) != 0)
                .map(move |bit| index * 64 + bit)
        })
    }
}
