//! Within-slice mate-pair linking (§4.2).
//!
//! [`resolve_mates`] runs once per staged slice, before the slice is
//! serialized: it links each paired record to its in-slice mate so the
//! record encoder can later emit a compact intra-slice reference instead of
//! repeating the mate's reference/position/name. A record whose mate
//! cannot be resolved in-slice is left *detached* (§3 glossary): both the
//! record that found no mate and the record nobody ever claimed end up
//! detached, mirroring the teacher stack's `set_mates`/`set_detached`
//! convention of detaching everything by default and clearing the flag
//! only once a link is established.

use std::collections::HashMap;

use bstr::BString;

use crate::record::SliceRecord;

/// Resolves mate-pair relationships across `records` in place (§4.2
/// "Algorithm").
///
/// Mutates [`SliceRecord::mate_index`] and [`SliceRecord::detached`] on
/// each record. `records` is assumed to be in the order records will be
/// admitted to the slice; detachment decisions are final once this
/// function returns.
pub fn resolve_mates(records: &mut [SliceRecord], coordinate_sorted: bool) {
    if !coordinate_sorted {
        for record in records.iter_mut() {
            record.detached = true;
        }
        return;
    }

    // One table for primary candidates, one for secondary/supplementary
    // candidates. A secondary record searches the primary table and vice
    // versa (§4.2 step 2, "intentional cross-lookup"). A record that draws
    // a blank there also checks its own-classification table before
    // giving up, so that two primary (or two secondary) records sharing a
    // name can still find each other - the cross-lookup alone cannot link
    // them, which is the uncertain edge the source's TODO flags (§9 "Open
    // questions").
    let mut primary_candidates: HashMap<BString, usize> = HashMap::new();
    let mut secondary_candidates: HashMap<BString, usize> = HashMap::new();

    for i in 0..records.len() {
        if !records[i].flags.is_segmented() {
            records[i].detached = true;
            continue;
        }

        let Some(name) = records[i].name.clone() else {
            records[i].detached = true;
            continue;
        };

        let is_secondary = records[i].flags.is_secondary();

        let linked = try_claim(records, &name, !is_secondary, i, &mut primary_candidates, &mut secondary_candidates)
            || try_claim(records, &name, is_secondary, i, &mut primary_candidates, &mut secondary_candidates);

        if linked {
            continue;
        }

        let own_table = if is_secondary {
            &mut secondary_candidates
        } else {
            &mut primary_candidates
        };
        own_table.insert(name, i);
    }

    mark_unresolved_as_detached(records);
}

/// Looks for a candidate mate for `records[i]` in the table selected by
/// `search_secondary_table`, and links it if `acceptMate` accepts.
fn try_claim(
    records: &mut [SliceRecord],
    name: &BString,
    search_secondary_table: bool,
    i: usize,
    primary_candidates: &mut HashMap<BString, usize>,
    secondary_candidates: &mut HashMap<BString, usize>,
) -> bool {
    let table = if search_secondary_table {
        &mut *secondary_candidates
    } else {
        &mut *primary_candidates
    };

    let Some(&m) = table.get(name) else {
        return false;
    };

    if !accept_mate(&records[m], &records[i]) {
        return false;
    }

    table.remove(name);
    records[m].mate_index = Some(i);
    true
}

/// `acceptMate(first, candidate)` (§4.2): rejects a candidate mate whose
/// observable properties contradict what `first` declared about its mate.
fn accept_mate(first: &SliceRecord, candidate: &SliceRecord) -> bool {
    if first.flags.is_mate_reverse_complemented() && !candidate.flags.is_reverse_complemented() {
        return false;
    }

    if first.flags.is_mate_unmapped() && candidate.is_mapped() {
        return false;
    }

    if let Some(expected_start) = first.mate_alignment_start {
        if candidate.alignment_start != Some(expected_start) {
            return false;
        }
    }

    true
}

/// A record is resolved if it found a mate (`mate_index` is set) or if
/// some other record found it as a mate. Anything else - including a
/// record whose only table entry survived unclaimed to the end of the
/// pass - is detached (§4.2 step 4).
fn mark_unresolved_as_detached(records: &mut [SliceRecord]) {
    let targets: std::collections::HashSet<usize> =
        records.iter().filter_map(|r| r.mate_index).collect();

    for (i, record) in records.iter_mut().enumerate() {
        if record.mate_index.is_none() && !targets.contains(&i) && record.flags.is_segmented() {
            record.detached = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Flags;

    fn paired(name: &str, start: i32, mate_start: i32, flags: Flags) -> SliceRecord {
        SliceRecord::new(
            Some(0),
            Some(start),
            Some(start + 99),
            flags | Flags::SEGMENTED,
            Some(BString::from(name)),
            Some(0),
            Some(mate_start),
        )
    }

    #[test]
    fn test_non_coordinate_sorted_detaches_all() {
        let mut records = vec![paired("a", 100, 200, Flags::FIRST_SEGMENT)];
        resolve_mates(&mut records, false);
        assert!(records[0].detached);
    }

    #[test]
    fn test_simple_pair_links_and_neither_end_is_detached() {
        let mut records = vec![
            paired("a", 100, 200, Flags::FIRST_SEGMENT),
            paired("a", 200, 100, Flags::LAST_SEGMENT),
        ];

        resolve_mates(&mut records, true);

        assert_eq!(records[0].mate_index, Some(1));
        assert!(!records[0].detached);
        assert!(!records[1].detached);
    }

    #[test]
    fn test_unpaired_record_is_detached() {
        let mut records = vec![SliceRecord::new(
            Some(0),
            Some(100),
            Some(150),
            Flags::empty(),
            Some(BString::from("a")),
            None,
            None,
        )];

        resolve_mates(&mut records, true);
        assert!(records[0].detached);
    }

    #[test]
    fn test_mate_reverse_flag_rejects_candidate() {
        let mut first = paired("a", 100, 200, Flags::FIRST_SEGMENT | Flags::MATE_REVERSE_COMPLEMENTED);
        first.mate_alignment_start = Some(200);
        let candidate = paired("a", 200, 100, Flags::LAST_SEGMENT);

        let mut records = vec![first, candidate];
        resolve_mates(&mut records, true);

        // The candidate is not on the reverse strand, contradicting the
        // first record's declaration, so no link forms and both are
        // detached.
        assert_eq!(records[0].mate_index, None);
        assert!(records[0].detached);
        assert!(records[1].detached);
    }

    #[test]
    fn test_s6_mate_resolution_with_secondary() {
        // Three coordinate-sorted records sharing a read name: a primary
        // at 7000, a supplementary at 7172, and the primary's true mate at
        // 7173. Record 1 declares its mate's start as 7173 (§8 S6).
        let r1 = paired("x", 7000, 7173, Flags::FIRST_SEGMENT);
        // The supplementary alignment's mate hint is stale (points back at
        // its own originating primary's position, 7000), which is exactly
        // what `acceptMate` catches.
        let r2 = paired("x", 7172, 7000, Flags::SUPPLEMENTARY | Flags::SECONDARY);
        let r3 = paired("x", 7173, 7000, Flags::LAST_SEGMENT);

        let mut records = vec![r1, r2, r3];
        resolve_mates(&mut records, true);

        assert_eq!(records[0].mate_index, Some(2));
        assert!(records[1].detached);
    }
}
