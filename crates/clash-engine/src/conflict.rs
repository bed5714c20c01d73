//! The overlap rule: pure interval math, no resource policy.
//!
//! Two slots overlap when `a.start < b.end && b.start < a.end`. Adjacent slots
//! (one ends exactly when the other starts) are NOT conflicts. Whether two
//! slots on different resources should be compared at all is decided by
//! [`ResourceScope`](crate::checker::ResourceScope), not here.

use crate::slot::TimeSlot;

/// Half-open interval intersection test. Ignores resources.
pub fn overlaps(a: &TimeSlot, b: &TimeSlot) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

/// Minutes of shared time between two slots, or 0 when they don't overlap.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn overlap_minutes(a: &TimeSlot, b: &TimeSlot) -> i64 {
    if !overlaps(a, b) {
        return 0;
    }
    let overlap_start = a.start().max(b.start());
    let overlap_end = a.end().min(b.end());
    (overlap_end - overlap_start).num_minutes()
}

/// A pair of overlapping slots inside one list, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub first: usize,
    pub second: usize,
    pub overlap_minutes: i64,
}

/// Find every overlapping pair within `slots`, resource-agnostic.
///
/// Sweeps the slots in start order keeping only those still open, so the cost
/// is proportional to the number of slots plus the number of pairs found
/// rather than all pairs. Each pair is reported once with `first < second`,
/// sorted by `(first, second)`.
pub fn find_overlapping_pairs(slots: &[TimeSlot]) -> Vec<Conflict> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by_key(|&i| (slots[i].start(), slots[i].end(), i));

    let mut open: Vec<usize> = Vec::new();
    let mut conflicts = Vec::new();

    for &i in &order {
        let current = &slots[i];
        // Anything that ended at or before this start can never overlap again.
        open.retain(|&j| slots[j].end() > current.start());

        for &j in &open {
            let (first, second) = if j < i { (j, i) } else { (i, j) };
            conflicts.push(Conflict {
                first,
                second,
                overlap_minutes: overlap_minutes(&slots[first], &slots[second]),
            });
        }
        open.push(i);
    }

    conflicts.sort_by_key(|c| (c.first, c.second));
    conflicts
}
