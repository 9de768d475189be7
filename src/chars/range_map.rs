use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A sorted-array associative structure mapping closed key intervals to values.
///
/// Lookup is a binary search on the upper bounds of the stored intervals, so
/// [try_find](RangeMap::try_find) runs in `O(log n)` without materializing
/// per-key entries. The intervals must not overlap; [RangeMap::from_entries]
/// rejects an entry list that violates this.
pub struct RangeMap<K, V> {
    entries: Vec<(K, K, V)>,
}

impl<K: Ord + Copy + Debug, V> RangeMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a map from `(start, end, value)` entries with inclusive bounds.
    pub fn from_entries(mut entries: Vec<(K, K, V)>) -> Result<Self, String> {
        entries.sort_by_key(|(start, ..)| *start);
        for (start, end, _) in &entries {
            if end < start {
                return Err(format!(
                    "Interval bounds {:?}-{:?} are inverted.",
                    start, end
                ));
            }
        }
        for pair in entries.windows(2) {
            if pair[1].0 <= pair[0].1 {
                return Err(format!(
                    "Intervals {:?}-{:?} and {:?}-{:?} overlap.",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Append an interval beyond the current upper end of the map.
    pub fn push(&mut self, start: K, end: K, value: V) -> Result<(), String> {
        if end < start {
            return Err(format!(
                "Interval bounds {:?}-{:?} are inverted.",
                start, end
            ));
        }
        if let Some((_, last_end, _)) = self.entries.last() {
            if start <= *last_end {
                return Err(format!(
                    "Interval {:?}-{:?} overlaps the mapped range ending at {:?}.",
                    start, end, last_end
                ));
            }
        }
        self.entries.push((start, end, value));
        Ok(())
    }

    /// Find the value mapped for the interval containing `key`.
    pub fn try_find(&self, key: K) -> Option<&V> {
        let index = match self.entries.binary_search_by_key(&key, |(_, end, _)| *end) {
            Ok(index) | Err(index) => index,
        };
        self.entries.get(index).and_then(|(start, end, value)| {
            if *start <= key && key <= *end {
                Some(value)
            } else {
                None
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, K, V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Ord + Copy + Debug, V> Default for RangeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
