use super::{canonicalize, char_next, char_prev, complement, is_canonical, CharRange, RangeMap};

fn ranges(pairs: &[(char, char)]) -> Vec<CharRange> {
    pairs.iter().map(|(s, e)| CharRange::new(*s, *e)).collect()
}

#[test]
fn merges_overlapping_and_adjacent_ranges() {
    let canonical = canonicalize(
        &ranges(&[('f', 'k'), ('a', 'c'), ('d', 'e'), ('i', 'z')]),
        true,
    );
    assert_eq!(canonical, ranges(&[('a', 'z')]));
    assert!(is_canonical(&canonical));
}

#[test]
fn keeps_disjoint_ranges_apart() {
    let canonical = canonicalize(&ranges(&[('0', '9'), ('a', 'f'), ('A', 'F')]), true);
    assert_eq!(canonical, ranges(&[('0', '9'), ('A', 'F'), ('a', 'f')]));
    assert!(is_canonical(&canonical));
}

#[test]
fn canonicalization_is_idempotent() {
    let first = canonicalize(&ranges(&[('b', 'q'), ('a', 'a'), ('r', 'r')]), true);
    let second = canonicalize(&first, true);
    assert_eq!(first, second);
    assert!(is_canonical(&second));
}

#[test]
fn case_insensitive_expansion_covers_both_cases() {
    let canonical = canonicalize(&ranges(&[('a', 'c')]), false);
    assert_eq!(canonical, ranges(&[('A', 'C'), ('a', 'c')]));

    let single = canonicalize(&[CharRange::single('ß')], false);
    // 'ß' upper-cases to "SS"; multi-char mappings are left out of the model.
    assert_eq!(single, vec![CharRange::single('ß')]);
}

#[test]
fn is_canonical_rejects_unsorted_and_adjacent() {
    assert!(!is_canonical(&ranges(&[('d', 'f'), ('a', 'b')])));
    assert!(!is_canonical(&ranges(&[('a', 'c'), ('d', 'f')])));
    assert!(is_canonical(&ranges(&[('a', 'c'), ('e', 'f')])));
}

#[test]
fn char_stepping_skips_the_surrogate_gap() {
    assert_eq!(char_next('\u{D7FF}'), Some('\u{E000}'));
    assert_eq!(char_prev('\u{E000}'), Some('\u{D7FF}'));
    assert_eq!(char_next(char::MAX), None);
    assert_eq!(char_prev('\0'), None);
    assert_eq!(char_next('a'), Some('b'));
}

#[test]
fn complement_wraps_the_full_scalar_space() {
    let inverted = complement(&ranges(&[('b', 'd')]));
    assert_eq!(
        inverted,
        vec![
            CharRange::new('\0', 'a'),
            CharRange::new('e', char::MAX)
        ]
    );
    assert!(is_canonical(&inverted));

    let everything = complement(&[]);
    assert_eq!(everything, vec![CharRange::new('\0', char::MAX)]);
}

#[test]
fn range_map_lookup_hits_interval_bounds() {
    let map =
        RangeMap::from_entries(vec![('a', 'f', 1usize), ('0', '9', 2), ('k', 'k', 3)]).unwrap();
    assert_eq!(map.try_find('a'), Some(&1));
    assert_eq!(map.try_find('f'), Some(&1));
    assert_eq!(map.try_find('5'), Some(&2));
    assert_eq!(map.try_find('k'), Some(&3));
    assert_eq!(map.try_find('g'), None);
    assert_eq!(map.try_find('z'), None);
}

#[test]
fn range_map_rejects_overlap() {
    assert!(RangeMap::from_entries(vec![('a', 'f', 1usize), ('e', 'k', 2)]).is_err());
    let mut map = RangeMap::new();
    map.push('a', 'c', 1usize).unwrap();
    assert!(map.push('c', 'e', 2).is_err());
    map.push('d', 'e', 2).unwrap();
}
