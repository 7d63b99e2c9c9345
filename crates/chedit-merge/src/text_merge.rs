//! Line-based three-way merge of file contents.
//!
//! Each side is diffed against the base with `similar` (Myers), and the
//! resulting hunks are replayed over the base. Hunks from the two sides whose
//! base lines overlap or abut form a region; a region is clean if only one
//! side touched it or both sides produced the same text.

use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, DiffTag};

/// Outcome of [`merge_text`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextMerge {
    Clean(Vec<u8>),
    /// The sides could not be reconciled; the string describes why.
    Conflict(String),
}

impl TextMerge {
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }
}

/// A run of changed lines: `base` lines replaced by `side` lines.
#[derive(Debug)]
struct Hunk {
    base: Range<usize>,
    side: Range<usize>,
}

/// Merge `ours` and `theirs`, both derived from `base`.
///
/// Content that is not UTF-8 or contains NUL is treated as binary and only
/// merges when at most one side changed it.
pub fn merge_text(base: &[u8], ours: &[u8], theirs: &[u8]) -> TextMerge {
    if ours == theirs || base == theirs {
        return TextMerge::Clean(ours.to_vec());
    }
    if base == ours {
        return TextMerge::Clean(theirs.to_vec());
    }
    let (Some(base), Some(ours), Some(theirs)) = (as_text(base), as_text(ours), as_text(theirs))
    else {
        return TextMerge::Conflict("binary content changed on both sides".into());
    };

    let base: Vec<&str> = base.split_inclusive('\n').collect();
    let ours: Vec<&str> = ours.split_inclusive('\n').collect();
    let theirs: Vec<&str> = theirs.split_inclusive('\n').collect();
    let our_hunks = hunks(&base, &ours);
    let their_hunks = hunks(&base, &theirs);

    let mut out = String::new();
    let mut pos = 0;
    let (mut i, mut j) = (0, 0);
    let mut conflicts = 0usize;
    let mut first_conflict = None;

    while i < our_hunks.len() || j < their_hunks.len() {
        let (i0, j0) = (i, j);
        let seed_ours = match (our_hunks.get(i), their_hunks.get(j)) {
            (Some(a), Some(b)) => a.base.start <= b.base.start,
            (Some(_), None) => true,
            _ => false,
        };
        let mut region = if seed_ours {
            i += 1;
            our_hunks[i0].base.clone()
        } else {
            j += 1;
            their_hunks[j0].base.clone()
        };

        // Grow the region until no hunk from either side touches it.
        loop {
            if let Some(h) = our_hunks.get(i).filter(|h| overlaps(&region, &h.base)) {
                region = union(&region, &h.base);
                i += 1;
            } else if let Some(h) = their_hunks.get(j).filter(|h| overlaps(&region, &h.base)) {
                region = union(&region, &h.base);
                j += 1;
            } else {
                break;
            }
        }

        out.extend(base[pos..region.start].iter().copied());
        let ours_here = &our_hunks[i0..i];
        let theirs_here = &their_hunks[j0..j];
        if theirs_here.is_empty() {
            out.push_str(&replay(&base, &ours, &region, ours_here));
        } else if ours_here.is_empty() {
            out.push_str(&replay(&base, &theirs, &region, theirs_here));
        } else {
            let a = replay(&base, &ours, &region, ours_here);
            let b = replay(&base, &theirs, &region, theirs_here);
            if a == b {
                out.push_str(&a);
            } else {
                conflicts += 1;
                first_conflict.get_or_insert(region.start + 1);
            }
        }
        pos = region.end;
    }
    out.extend(base[pos..].iter().copied());

    match first_conflict {
        Some(line) => TextMerge::Conflict(format!(
            "{conflicts} conflicting region(s), first at line {line}"
        )),
        None => TextMerge::Clean(out.into_bytes()),
    }
}

fn as_text(data: &[u8]) -> Option<&str> {
    std::str::from_utf8(data).ok().filter(|s| !s.contains('\0'))
}

/// Non-equal diff ops, coalesced into maximal runs.
fn hunks(base: &[&str], side: &[&str]) -> Vec<Hunk> {
    let mut out: Vec<Hunk> = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, base, side) {
        if op.tag() == DiffTag::Equal {
            continue;
        }
        let (b, s) = (op.old_range(), op.new_range());
        match out.last_mut() {
            Some(last) if last.base.end == b.start && last.side.end == s.start => {
                last.base.end = b.end;
                last.side.end = s.end;
            }
            _ => out.push(Hunk { base: b, side: s }),
        }
    }
    out
}

/// Two base ranges belong to one region if they intersect, start at the
/// same line, or abut with no unchanged line between them.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    (a.start < b.end && b.start < a.end)
        || a.start == b.start
        || a.end == b.start
        || b.end == a.start
}

fn union(a: &Range<usize>, b: &Range<usize>) -> Range<usize> {
    a.start.min(b.start)..a.end.max(b.end)
}

/// The text of `region` after applying one side's hunks inside it.
fn replay(base: &[&str], side: &[&str], region: &Range<usize>, hunks: &[Hunk]) -> String {
    let mut out = String::new();
    let mut pos = region.start;
    for h in hunks {
        out.extend(base[pos..h.base.start].iter().copied());
        out.extend(side[h.side.clone()].iter().copied());
        pos = h.base.end;
    }
    out.extend(base[pos..region.end].iter().copied());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE: &str = "a\nb\nc\nd\ne\n";

    fn clean(m: TextMerge) -> String {
        match m {
            TextMerge::Clean(bytes) => String::from_utf8(bytes).unwrap(),
            TextMerge::Conflict(why) => panic!("unexpected conflict: {why}"),
        }
    }

    #[test]
    fn disjoint_edits_both_apply() {
        let merged = merge_text(BASE.as_bytes(), b"a\nB\nc\nd\ne\n", b"a\nb\nc\nD\ne\n");
        assert_eq!(clean(merged), "a\nB\nc\nD\ne\n");
    }

    #[test]
    fn adjacent_line_edits_conflict() {
        let merged = merge_text(BASE.as_bytes(), b"a\nB\nc\nd\ne\n", b"a\nb\nC\nd\ne\n");
        assert_eq!(
            merged,
            TextMerge::Conflict("1 conflicting region(s), first at line 2".into())
        );
    }

    #[test]
    fn insertion_next_to_edit_conflicts() {
        let merged = merge_text(BASE.as_bytes(), b"a\nb\nnew\nc\nd\ne\n", b"a\nb\nC\nd\ne\n");
        assert!(!merged.is_clean());
    }

    #[test]
    fn identical_edits_are_taken_once() {
        let merged = merge_text(BASE.as_bytes(), b"a\nB\nc\nd\ne\n", b"a\nB\nc\nD\ne\n");
        assert_eq!(clean(merged), "a\nB\nc\nD\ne\n");
    }

    #[test]
    fn insertion_and_deletion_elsewhere() {
        let merged = merge_text(BASE.as_bytes(), b"top\na\nb\nc\nd\ne\n", b"a\nb\nc\nd\n");
        assert_eq!(clean(merged), "top\na\nb\nc\nd\n");
    }

    #[test]
    fn competing_edits_conflict() {
        let merged = merge_text(BASE.as_bytes(), b"a\nX\nc\nd\ne\n", b"a\nY\nc\nd\ne\n");
        assert_eq!(
            merged,
            TextMerge::Conflict("1 conflicting region(s), first at line 2".into())
        );
    }

    #[test]
    fn competing_insertions_at_same_point_conflict() {
        assert!(!merge_text(b"", b"one\n", b"two\n").is_clean());
    }

    #[test]
    fn one_sided_change_wins() {
        assert_eq!(clean(merge_text(BASE.as_bytes(), BASE.as_bytes(), b"z\n")), "z\n");
        assert_eq!(clean(merge_text(BASE.as_bytes(), b"z\n", BASE.as_bytes())), "z\n");
    }

    #[test]
    fn binary_changed_on_both_sides_conflicts() {
        let merged = merge_text(b"\0base", b"\0ours", b"\0theirs");
        assert!(matches!(merged, TextMerge::Conflict(why) if why.contains("binary")));
    }

    #[test]
    fn binary_changed_on_one_side_merges() {
        assert_eq!(
            merge_text(b"\0base", b"\0ours", b"\0base"),
            TextMerge::Clean(b"\0ours".to_vec())
        );
    }

    #[test]
    fn missing_final_newline_is_preserved() {
        let merged = merge_text(b"a\nb\nc", b"A\nb\nc", b"a\nb\nc!");
        assert_eq!(clean(merged), "A\nb\nc!");
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}\n")).collect()
    }

    proptest! {
        #[test]
        fn distinct_line_edits_merge(n in 2usize..40, i in 0usize..40, j in 0usize..40) {
            let (i, j) = (i % n, j % n);
            prop_assume!(i.abs_diff(j) > 1);
            let base = numbered(n);
            let mut ours = base.clone();
            ours[i] = "ours\n".into();
            let mut theirs = base.clone();
            theirs[j] = "theirs\n".into();
            let mut expected = base.clone();
            expected[i] = "ours\n".into();
            expected[j] = "theirs\n".into();

            let merged = merge_text(base.concat().as_bytes(), ours.concat().as_bytes(), theirs.concat().as_bytes());
            prop_assert_eq!(merged, TextMerge::Clean(expected.concat().into_bytes()));
        }

        #[test]
        fn merge_is_symmetric(
            base in proptest::collection::vec("[abc]\n", 0..12),
            ours in proptest::collection::vec("[abc]\n", 0..12),
            theirs in proptest::collection::vec("[abc]\n", 0..12),
        ) {
            let (b, o, t) = (base.concat(), ours.concat(), theirs.concat());
            prop_assert_eq!(
                merge_text(b.as_bytes(), o.as_bytes(), t.as_bytes()),
                merge_text(b.as_bytes(), t.as_bytes(), o.as_bytes())
            );
        }
    }
}
