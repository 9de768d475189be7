use super::Rex;
use crate::chars::{canonicalize, CharRange};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The canonical regex form consumed by the DFA builder.
///
/// Literals are expanded to one-character classes, classes are canonical,
/// bounded loops are unrolled and case folding has been applied, so the
/// followpos construction only ever sees five node shapes.
pub enum LoweredRex {
    /// A canonical character class.
    Chars {
        ranges: Vec<CharRange>,
        inverted: bool,
    },
    Concat(Vec<LoweredRex>),
    Alt(Vec<LoweredRex>),
    Star(Box<LoweredRex>),
    /// Matches the empty string.
    Empty,
    /// Matches nothing.
    Void,
}

impl LoweredRex {
    /// Whether the term can match the empty string.
    pub fn is_nullable(&self) -> bool {
        match self {
            LoweredRex::Chars { .. } | LoweredRex::Void => false,
            LoweredRex::Empty | LoweredRex::Star(_) => true,
            LoweredRex::Concat(terms) => terms.iter().all(|t| t.is_nullable()),
            LoweredRex::Alt(terms) => terms.iter().any(|t| t.is_nullable()),
        }
    }

    /// Whether the term cannot match any string at all.
    pub fn is_void(&self) -> bool {
        match self {
            LoweredRex::Void => true,
            LoweredRex::Chars { ranges, inverted } => !inverted && ranges.is_empty(),
            LoweredRex::Empty => false,
            LoweredRex::Concat(terms) => terms.iter().any(|t| t.is_void()),
            LoweredRex::Alt(terms) => terms.iter().all(|t| t.is_void()),
            LoweredRex::Star(_) => false,
        }
    }

    /// Whether the term contains a loop; loop-free terms are fixed length
    /// and tokenize with higher priority.
    pub fn has_loop(&self) -> bool {
        match self {
            LoweredRex::Star(_) => true,
            LoweredRex::Concat(terms) | LoweredRex::Alt(terms) => {
                terms.iter().any(|t| t.has_loop())
            }
            _ => false,
        }
    }

    /// Whether the term matches `input` exactly.
    ///
    /// A direct set-of-offsets interpretation of the term, independent of
    /// the DFA construction. The test suite holds the two implementations
    /// against each other.
    pub fn matches(&self, input: &str) -> bool {
        let chars: Vec<char> = input.chars().collect();
        self.offsets(&chars, 0).contains(&chars.len())
    }

    /// Every offset reachable by matching the term starting at `from`.
    fn offsets(&self, chars: &[char], from: usize) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        match self {
            LoweredRex::Chars { ranges, inverted } => {
                if let Some(c) = chars.get(from) {
                    if ranges.iter().any(|r| r.contains(*c)) != *inverted {
                        result.insert(from + 1);
                    }
                }
            }
            LoweredRex::Empty => {
                result.insert(from);
            }
            LoweredRex::Void => {}
            LoweredRex::Concat(terms) => {
                result.insert(from);
                for term in terms {
                    let mut next = BTreeSet::new();
                    for offset in result {
                        next.extend(term.offsets(chars, offset));
                    }
                    result = next;
                }
            }
            LoweredRex::Alt(terms) => {
                for term in terms {
                    result.extend(term.offsets(chars, from));
                }
            }
            LoweredRex::Star(inner) => {
                result.insert(from);
                let mut frontier: Vec<usize> = vec![from];
                while let Some(offset) = frontier.pop() {
                    for reached in inner.offsets(chars, offset) {
                        if result.insert(reached) {
                            frontier.push(reached);
                        }
                    }
                }
            }
        }
        result
    }
}

/// A cache of lowered regexes keyed by `(term, case_sensitive)`.
///
/// The same subexpression is routinely shared between terminals (shared
/// digit classes, keyword literals), so the builder lowers each distinct
/// pair only once.
pub struct LowerContext {
    cache: HashMap<(Rex, bool), Rc<LoweredRex>>,
}

impl LowerContext {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Lower `term` under the given case-sensitivity flag.
    pub fn lower(&mut self, term: &Rex, case_sensitive: bool) -> Rc<LoweredRex> {
        if let Some(cached) = self.cache.get(&(term.clone(), case_sensitive)) {
            return cached.clone();
        }
        let lowered = Rc::new(self.lower_uncached(term, case_sensitive));
        self.cache
            .insert((term.clone(), case_sensitive), lowered.clone());
        lowered
    }

    /// Whether the original term contains a [Rex::Void] node anywhere.
    pub fn contains_void(term: &Rex) -> bool {
        match term {
            Rex::Void => true,
            Rex::Chars { .. } | Rex::Literal(_) => false,
            Rex::Concat(terms) | Rex::Alt(terms) => terms.iter().any(Self::contains_void),
            Rex::Loop { inner, .. } => Self::contains_void(inner),
            Rex::CaseOverride { inner, .. } => Self::contains_void(inner),
        }
    }

    fn lower_uncached(&mut self, term: &Rex, case_sensitive: bool) -> LoweredRex {
        match term {
            Rex::Chars { ranges, inverted } => LoweredRex::Chars {
                ranges: canonicalize(ranges, case_sensitive),
                inverted: *inverted,
            },
            Rex::Literal(s) => {
                let mut chars: Vec<LoweredRex> = s
                    .chars()
                    .map(|c| LoweredRex::Chars {
                        ranges: canonicalize(&[CharRange::single(c)], case_sensitive),
                        inverted: false,
                    })
                    .collect();
                match chars.len() {
                    0 => LoweredRex::Empty,
                    1 => chars.pop().unwrap(),
                    _ => LoweredRex::Concat(chars),
                }
            }
            Rex::Concat(terms) => {
                let lowered: Vec<LoweredRex> = terms
                    .iter()
                    .map(|t| self.lower(t, case_sensitive).as_ref().clone())
                    .collect();
                match lowered.len() {
                    0 => LoweredRex::Empty,
                    1 => lowered.into_iter().next().unwrap(),
                    _ => LoweredRex::Concat(lowered),
                }
            }
            Rex::Alt(terms) => {
                let lowered: Vec<LoweredRex> = terms
                    .iter()
                    .map(|t| self.lower(t, case_sensitive).as_ref().clone())
                    .collect();
                match lowered.len() {
                    0 => LoweredRex::Void,
                    1 => lowered.into_iter().next().unwrap(),
                    _ => LoweredRex::Alt(lowered),
                }
            }
            Rex::Loop { inner, min, max } => {
                let body = self.lower(inner, case_sensitive).as_ref().clone();
                lower_loop(body, *min, *max)
            }
            Rex::CaseOverride {
                inner,
                case_sensitive,
            } => self.lower(inner, *case_sensitive).as_ref().clone(),
            Rex::Void => LoweredRex::Void,
        }
    }
}

impl Default for LowerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unroll `body{min,max}` into concats, optionals and at most one star.
fn lower_loop(body: LoweredRex, min: u32, max: Option<u32>) -> LoweredRex {
    let mut terms: Vec<LoweredRex> = Vec::new();
    for _ in 0..min {
        terms.push(body.clone());
    }
    match max {
        None => terms.push(LoweredRex::Star(Box::new(body))),
        Some(max) => {
            // a{2,4} = a a (a (a)?)?; the tail nests so that a shorter
            // match never commits to a longer one.
            let mut tail: Option<LoweredRex> = None;
            for _ in min..max {
                let step = match tail.take() {
                    Some(t) => LoweredRex::Concat(vec![body.clone(), t]),
                    None => body.clone(),
                };
                tail = Some(LoweredRex::Alt(vec![LoweredRex::Empty, step]));
            }
            if let Some(t) = tail {
                terms.push(t);
            }
        }
    }
    match terms.len() {
        0 => LoweredRex::Empty,
        1 => terms.into_iter().next().unwrap(),
        _ => LoweredRex::Concat(terms),
    }
}
