use super::{LowerContext, LoweredRex, Rex};
use crate::chars::CharRange;

#[test]
fn combinators_render_in_regex_notation() {
    let number = Rex::concat(vec![
        Rex::chars([('0', '9')]).plus(),
        Rex::concat(vec![Rex::string("."), Rex::chars([('0', '9')]).plus()]).optional(),
    ]);
    assert_eq!(format!("{}", number), "[0-9]+(\\.[0-9]+)?");

    let keyword = Rex::choice(vec![
        Rex::string("true"),
        Rex::string("false"),
        Rex::string("null"),
    ]);
    assert_eq!(format!("{}", keyword), "true|false|null");

    assert_eq!(format!("{}", Rex::not_chars([('a', 'z')])), "[^a-z]");
    assert_eq!(format!("{}", Rex::any_char()), ".");
    assert_eq!(format!("{}", Rex::char('k').between(2, 4)), "k{2,4}");
}

#[test]
fn literal_lowers_to_single_char_classes() {
    let mut ctx = LowerContext::new();
    let lowered = ctx.lower(&Rex::string("if"), true);
    match lowered.as_ref() {
        LoweredRex::Concat(terms) => {
            assert_eq!(terms.len(), 2);
            assert_eq!(
                terms[0],
                LoweredRex::Chars {
                    ranges: vec![CharRange::single('i')],
                    inverted: false
                }
            );
        }
        other => panic!("expected a concat of classes, got {:?}", other),
    }
}

#[test]
fn case_folding_follows_the_active_flag() {
    let mut ctx = LowerContext::new();
    let folded = ctx.lower(&Rex::string("a"), false);
    assert_eq!(
        folded.as_ref(),
        &LoweredRex::Chars {
            ranges: vec![CharRange::single('A'), CharRange::single('a')],
            inverted: false
        }
    );

    // An override pins its subtree regardless of the surrounding flag.
    let pinned = ctx.lower(&Rex::string("a").case_sensitive(), false);
    assert_eq!(
        pinned.as_ref(),
        &LoweredRex::Chars {
            ranges: vec![CharRange::single('a')],
            inverted: false
        }
    );
}

#[test]
fn lowering_is_cached_per_case_flag() {
    let mut ctx = LowerContext::new();
    let term = Rex::chars([('0', '9')]).plus();
    let first = ctx.lower(&term, true);
    let again = ctx.lower(&term, true);
    assert!(std::rc::Rc::ptr_eq(&first, &again));

    let insensitive = ctx.lower(&term, false);
    assert!(!std::rc::Rc::ptr_eq(&first, &insensitive));
}

#[test]
fn bounded_loops_unroll_without_stars() {
    let mut ctx = LowerContext::new();
    let lowered = ctx.lower(&Rex::char('a').between(1, 3), true);
    assert!(!lowered.has_loop());
    assert!(!lowered.is_nullable());

    let open = ctx.lower(&Rex::char('a').at_least(2), true);
    assert!(open.has_loop());

    let optional = ctx.lower(&Rex::char('a').optional(), true);
    assert!(optional.is_nullable());
}

#[test]
fn void_detection() {
    let mut ctx = LowerContext::new();
    assert!(ctx.lower(&Rex::Void, true).is_void());
    assert!(ctx
        .lower(&Rex::concat(vec![Rex::char('a'), Rex::Void]), true)
        .is_void());
    assert!(!ctx
        .lower(&Rex::choice(vec![Rex::char('a'), Rex::Void]), true)
        .is_void());
    assert!(LowerContext::contains_void(&Rex::choice(vec![
        Rex::char('a'),
        Rex::Void
    ])));
    assert!(!LowerContext::contains_void(&Rex::string("ab")));
}

#[test]
fn empty_literal_is_nullable() {
    let mut ctx = LowerContext::new();
    let lowered = ctx.lower(&Rex::string(""), true);
    assert!(lowered.is_nullable());
}
