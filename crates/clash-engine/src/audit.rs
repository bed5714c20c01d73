//! Double-booking audit over a set of committed events.

use serde::{Deserialize, Serialize};

use crate::checker::ResourceScope;
use crate::conflict::find_overlapping_pairs;
use crate::event::{CommittedEvent, EventId};
use crate::slot::TimeSlot;

/// Two scheduled events that should never have coexisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleBooking {
    pub first: EventId,
    pub second: EventId,
    pub resource: Option<String>,
    pub overlap_minutes: i64,
}

/// Every pair of scheduled events in `events` that conflicts under `scope`.
///
/// Pairs are ordered by the earlier event's `(start, id)`.
pub fn find_double_bookings(events: &[CommittedEvent], scope: ResourceScope) -> Vec<DoubleBooking> {
    let mut scheduled: Vec<&CommittedEvent> = events.iter().filter(|e| e.is_scheduled()).collect();
    scheduled.sort_by(|a, b| (a.start(), &a.id).cmp(&(b.start(), &b.id)));

    let slots: Vec<TimeSlot> = scheduled.iter().map(|e| e.slot.clone()).collect();

    find_overlapping_pairs(&slots)
        .into_iter()
        .filter(|c| scope.applies(slots[c.first].resource(), slots[c.second].resource()))
        .map(|c| {
            let (first, second) = (scheduled[c.first], scheduled[c.second]);
            DoubleBooking {
                first: first.id.clone(),
                second: second.id.clone(),
                resource: first
                    .resource()
                    .or_else(|| second.resource())
                    .map(str::to_string),
                overlap_minutes: c.overlap_minutes,
            }
        })
        .collect()
}
