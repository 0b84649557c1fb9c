//! Marker offset adjustment.
//!
//! [`apply_change`] maps a marker range through one edit. It is a pure function of the edit
//! span, the pre-edit range and the marker's endpoint policy; returning `None` means the edit
//! destroyed the range and the marker must be invalidated.
//!
//! Rules for a non-empty marker `[s, e)` and an edit removing `[o, o + d)` and inserting `n`
//! characters:
//!
//! | condition                              | result                    |
//! |----------------------------------------|---------------------------|
//! | `e < o`                                | unchanged                 |
//! | `e == o`, not greedy to right          | unchanged                 |
//! | `s > o + d`                            | shifted by `n - d`        |
//! | `s == o + d`, not greedy to left       | shifted by `n - d`        |
//! | `s <= o` and `o + d <= e`              | `[s, e + n - d)`          |
//! | `o <= s <= o + d < e`                  | `[o + n, e + n - d)`      |
//! | `s < o <= e <= o + d`                  | `[s, o)`                  |
//! | otherwise                              | invalid                   |
//!
//! An insertion produced by trimming a larger replacement that started inside the marker is
//! absorbed by the marker even at a non-greedy boundary.

use crate::delta::EditSpan;
use std::ops::Range;

/// How a marker's endpoints react to text inserted exactly at them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointPolicy {
    /// An insertion at the start offset is absorbed into the marker.
    pub greedy_to_left: bool,
    /// An insertion at the end offset is absorbed into the marker.
    pub greedy_to_right: bool,
    /// A non-greedy empty marker moves behind text inserted at its offset.
    pub sticking_to_right: bool,
}

/// Compute the range of a marker after `edit`, or `None` if the marker is destroyed.
pub fn apply_change(
    edit: EditSpan,
    range: Range<usize>,
    policy: EndpointPolicy,
) -> Option<Range<usize>> {
    let (start, end) = (range.start, range.end);
    if start == end {
        return apply_to_point(edit, start, policy);
    }

    let offset = edit.offset;
    let old_end = edit.old_end();
    let new_length = edit.new_length;

    if end < offset {
        return Some(start..end);
    }
    if !policy.greedy_to_right && end == offset {
        if edit.old_length == 0 && edit.initial_offset < offset {
            return Some(start..end + new_length);
        }
        return Some(start..end);
    }
    if start > old_end {
        return Some(edit.shift(start)..edit.shift(end));
    }
    if !policy.greedy_to_left && start == old_end {
        if edit.old_length == 0 && edit.initial_offset + edit.initial_old_length > offset {
            return Some(start..end + new_length);
        }
        return Some(edit.shift(start)..edit.shift(end));
    }

    if start <= offset && end >= old_end {
        return Some(start..edit.shift(end));
    }
    if start >= offset && start <= old_end && end > old_end {
        return Some(offset + new_length..edit.shift(end));
    }
    if end >= offset && end <= old_end && start < offset {
        return Some(start..offset);
    }
    None
}

fn apply_to_point(edit: EditSpan, point: usize, policy: EndpointPolicy) -> Option<Range<usize>> {
    let offset = edit.offset;
    let old_end = edit.old_end();

    if offset < point && point < old_end {
        return None;
    }
    if offset == point && edit.old_length == 0 {
        if policy.greedy_to_left || policy.greedy_to_right {
            return Some(point..point + edit.new_length);
        }
        if policy.sticking_to_right {
            let moved = point + edit.new_length;
            return Some(moved..moved);
        }
        return Some(point..point);
    }
    if point > old_end || (point == old_end && edit.old_length > 0) {
        let moved = edit.shift(point);
        return Some(moved..moved);
    }
    Some(point..point)
}
