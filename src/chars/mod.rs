//! Character set utilities shared by the regex surface and the DFA builder.
//!
//! A character class inside a regular expression is kept as a list of
//! [CharRange] values. Before the DFA builder can sweep transition intervals
//! the list has to be canonical: sorted, non-overlapping and with adjacent
//! ranges merged. [canonicalize] produces that form and
//! [is_canonical] checks it.

mod range_map;

pub use range_map::RangeMap;

#[cfg(test)]
mod __tests__;

use std::fmt::{Debug, Display, Formatter};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// An inclusive range of unicode scalar values.
pub struct CharRange {
    pub start: char,
    pub end: char,
}

impl CharRange {
    pub fn new(start: char, end: char) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn single(c: char) -> Self {
        Self { start: c, end: c }
    }

    pub fn contains(&self, c: char) -> bool {
        self.start <= c && c <= self.end
    }
}

impl From<char> for CharRange {
    fn from(c: char) -> Self {
        CharRange::single(c)
    }
}

impl From<std::ops::RangeInclusive<char>> for CharRange {
    fn from(r: std::ops::RangeInclusive<char>) -> Self {
        CharRange::new(*r.start(), *r.end())
    }
}

impl From<(char, char)> for CharRange {
    fn from((start, end): (char, char)) -> Self {
        CharRange::new(start, end)
    }
}

impl Debug for CharRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{:?}", self.start)
        } else {
            write!(f, "{:?}-{:?}", self.start, self.end)
        }
    }
}

impl Display for CharRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn write_char(f: &mut Formatter<'_>, c: char) -> std::fmt::Result {
            if c.is_ascii_graphic() || c == ' ' {
                write!(f, "{}", c)
            } else {
                write!(f, "\\u{{{:x}}}", c as u32)
            }
        }
        write_char(f, self.start)?;
        if self.start != self.end {
            write!(f, "-")?;
            write_char(f, self.end)?;
        }
        Ok(())
    }
}

/// The scalar value following `c`, stepping over the surrogate gap.
pub fn char_next(c: char) -> Option<char> {
    match c {
        char::MAX => None,
        '\u{D7FF}' => Some('\u{E000}'),
        _ => char::from_u32(c as u32 + 1),
    }
}

/// The scalar value preceding `c`, stepping over the surrogate gap.
pub fn char_prev(c: char) -> Option<char> {
    match c {
        '\0' => None,
        '\u{E000}' => Some('\u{D7FF}'),
        _ => char::from_u32(c as u32 - 1),
    }
}

/// Sort the ranges and merge every overlapping or adjacent pair.
///
/// With `case_sensitive` unset, each character of the input ranges is
/// expanded to its simple invariant upper and lower case counterparts before
/// merging. Only single-character case mappings take part; multi-character
/// foldings are outside the supported casing model.
pub fn canonicalize(ranges: &[CharRange], case_sensitive: bool) -> Vec<CharRange> {
    let mut expanded: Vec<CharRange> = Vec::with_capacity(ranges.len());

    if case_sensitive {
        expanded.extend_from_slice(ranges);
    } else {
        for range in ranges {
            expanded.push(*range);
            let mut c = range.start;
            loop {
                for folded in simple_case_pair(c) {
                    if !range.contains(folded) {
                        expanded.push(CharRange::single(folded));
                    }
                }
                if c >= range.end {
                    break;
                }
                match char_next(c) {
                    Some(n) => c = n,
                    None => break,
                }
            }
        }
    }

    expanded.sort();

    let mut canonical: Vec<CharRange> = Vec::with_capacity(expanded.len());
    for range in expanded {
        match canonical.last_mut() {
            Some(last) if range.start <= last.end || Some(range.start) == char_next(last.end) => {
                if range.end > last.end {
                    last.end = range.end;
                }
            }
            _ => canonical.push(range),
        }
    }
    canonical
}

/// Whether the ranges are sorted, non-overlapping and non-adjacent.
pub fn is_canonical(ranges: &[CharRange]) -> bool {
    ranges.windows(2).all(|pair| {
        pair[0].end < pair[1].start && char_next(pair[0].end) != Some(pair[1].start)
    }) && ranges.iter().all(|r| r.start <= r.end)
}

/// The complement of a canonical range list over the full scalar space.
pub fn complement(ranges: &[CharRange]) -> Vec<CharRange> {
    debug_assert!(is_canonical(ranges));
    let mut result = Vec::with_capacity(ranges.len() + 1);
    let mut cursor = Some('\0');
    for range in ranges {
        if let Some(c) = cursor {
            if c < range.start {
                if let Some(prev) = char_prev(range.start) {
                    result.push(CharRange::new(c, prev));
                }
            }
        }
        cursor = char_next(range.end);
    }
    if let Some(c) = cursor {
        result.push(CharRange::new(c, char::MAX));
    }
    result
}

/// Simple invariant casing: the single-character upper and lower counterparts.
fn simple_case_pair(c: char) -> impl Iterator<Item = char> {
    let upper = {
        let mut it = c.to_uppercase();
        let u = it.next();
        if it.next().is_none() {
            u.filter(|u| *u != c)
        } else {
            None
        }
    };
    let lower = {
        let mut it = c.to_lowercase();
        let l = it.next();
        if it.next().is_none() {
            l.filter(|l| *l != c)
        } else {
            None
        }
    };
    upper.into_iter().chain(lower)
}
