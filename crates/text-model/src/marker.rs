//! Range marker handles and views.

use crate::translate::EndpointPolicy;
use std::fmt;
use std::ops::Range;

slotmap::new_key_type! {
    /// Handle of a marker inside one [`crate::Document`].
    ///
    /// The slot of a disposed marker is reused with a new version, so a stale handle never
    /// resolves to a later marker. A `MarkerId` is only meaningful for the document that created
    /// it.
    pub struct MarkerId;
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{:?}", self.0)
    }
}

/// Snapshot of a marker's state.
///
/// Once an edit invalidates the marker, `valid` is `false` and `start_offset` / `end_offset` hold
/// the last positions before the edit; they are kept for diagnostics only, until the marker is
/// disposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeMarker {
    /// Handle of the marker.
    pub id: MarkerId,
    /// Start offset (inclusive).
    pub start_offset: usize,
    /// End offset (exclusive).
    pub end_offset: usize,
    /// Insertions at `start_offset` are absorbed.
    pub greedy_to_left: bool,
    /// Insertions at `end_offset` are absorbed.
    pub greedy_to_right: bool,
    /// An empty marker moves behind insertions at its offset.
    pub sticking_to_right: bool,
    /// Whether the marker still tracks a position.
    pub valid: bool,
}

impl RangeMarker {
    /// The tracked range, or `None` once the marker is no longer valid.
    pub fn range(&self) -> Option<Range<usize>> {
        self.valid.then_some(self.start_offset..self.end_offset)
    }

    /// Length of the tracked range.
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Returns `true` for a zero-width marker.
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MarkerState {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) policy: EndpointPolicy,
    pub(crate) valid: bool,
    /// Creation sequence number, the tie-breaker between equal starts.
    pub(crate) seq: u64,
}

impl MarkerState {
    pub(crate) fn new(start: usize, end: usize, seq: u64) -> Self {
        Self {
            start,
            end,
            policy: EndpointPolicy::default(),
            valid: true,
            seq,
        }
    }

    pub(crate) fn order_key(&self) -> (usize, u64) {
        (self.start, self.seq)
    }

    pub(crate) fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub(crate) fn view(&self, id: MarkerId) -> RangeMarker {
        RangeMarker {
            id,
            start_offset: self.start,
            end_offset: self.end,
            greedy_to_left: self.policy.greedy_to_left,
            greedy_to_right: self.policy.greedy_to_right,
            sticking_to_right: self.policy.sticking_to_right,
            valid: self.valid,
        }
    }
}
