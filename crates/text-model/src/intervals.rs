//! Marker storage and interval queries.
//!
//! Live markers are kept in a vector sorted by start, then creation order, together with a
//! prefix maximum of their end offsets. Queries binary-search the start offsets and use the prefix maxima to stop
//! scanning early, giving O(log n + k). Edits use the same prefix maxima to skip every marker
//! that ends before the edit offset.

use crate::delta::EditSpan;
use crate::marker::{MarkerId, MarkerState, RangeMarker};
use crate::translate::{self, EndpointPolicy};
use slotmap::SlotMap;

/// Ordered collection of range markers.
///
/// Every marker that has not been disposed owns a slot, including markers an edit invalidated.
/// Disposing frees the slot for reuse.
#[derive(Debug, Clone, Default)]
pub struct MarkerTree {
    /// Markers that have not been disposed.
    states: SlotMap<MarkerId, MarkerState>,
    /// Valid markers sorted by `(start, seq)`.
    live: Vec<MarkerId>,
    /// `prefix_max_end[i] = max(end of live[0..=i])`
    prefix_max_end: Vec<usize>,
    next_seq: u64,
}

impl MarkerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, id: MarkerId) -> (usize, u64) {
        self.states[id].order_key()
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        self.prefix_max_end.truncate(start_idx);
        let mut max_end = start_idx
            .checked_sub(1)
            .map_or(0, |prev| self.prefix_max_end[prev]);

        for id in &self.live[start_idx..] {
            max_end = max_end.max(self.states[*id].end);
            self.prefix_max_end.push(max_end);
        }
    }

    /// Register a new valid, non-greedy marker. Bounds are checked by the caller.
    pub(crate) fn insert(&mut self, start: usize, end: usize) -> MarkerId {
        debug_assert!(start <= end);
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.states.insert(MarkerState::new(start, end, seq));

        // The new sequence number is the largest, so the marker goes after every equal start.
        let pos = self
            .live
            .partition_point(|&other| self.states[other].start <= start);
        self.live.insert(pos, id);
        self.rebuild_prefix_max_end_from(pos);
        id
    }

    fn live_position(&self, id: MarkerId) -> Option<usize> {
        let key = self.key(id);
        self.live
            .binary_search_by_key(&key, |&other| self.key(other))
            .ok()
    }

    /// Detach a marker and free its slot. Returns the state it had, or `None` for a stale id.
    pub(crate) fn remove(&mut self, id: MarkerId) -> Option<MarkerState> {
        if self.is_valid(id)
            && let Some(pos) = self.live_position(id)
        {
            self.live.remove(pos);
            self.rebuild_prefix_max_end_from(pos);
        }
        self.states.remove(id)
    }

    /// Returns `true` if `id` refers to a valid marker of this tree.
    pub fn is_valid(&self, id: MarkerId) -> bool {
        self.states.get(id).is_some_and(|state| state.valid)
    }

    /// Snapshot of a marker that has not been disposed, valid or not.
    pub fn get(&self, id: MarkerId) -> Option<RangeMarker> {
        self.states.get(id).map(|state| state.view(id))
    }

    /// Number of marker slots currently allocated.
    pub fn capacity(&self) -> usize {
        self.states.capacity()
    }

    /// Apply `update` to the endpoint policy of a valid marker.
    pub(crate) fn update_policy(
        &mut self,
        id: MarkerId,
        update: impl FnOnce(&mut EndpointPolicy),
    ) -> bool {
        match self.states.get_mut(id) {
            Some(state) if state.valid => {
                update(&mut state.policy);
                true
            }
            _ => false,
        }
    }

    /// Number of valid markers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no marker is valid.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Valid markers ordered by start offset, then creation order.
    pub fn iter(&self) -> impl Iterator<Item = RangeMarker> + '_ {
        self.live.iter().map(|&id| self.states[id].view(id))
    }

    /// Valid markers with `start <= offset < end`.
    pub fn query_point(&self, offset: usize) -> Vec<MarkerId> {
        let idx = self
            .live
            .partition_point(|&id| self.states[id].start <= offset);

        let mut result = Vec::new();
        // Every marker with start <= offset lies before idx.
        for i in (0..idx).rev() {
            if self.prefix_max_end[i] <= offset {
                break;
            }
            let state = &self.states[self.live[i]];
            if offset < state.end {
                result.push(self.live[i]);
            }
        }
        result.reverse();
        result
    }

    /// Valid markers with `max(start, marker.start) <= min(end, marker.end)`.
    ///
    /// Touching ranges count as overlapping, so an empty marker at `end` is reported.
    pub fn query_range(&self, start: usize, end: usize) -> Vec<MarkerId> {
        if start > end {
            return Vec::new();
        }
        let search_end = self
            .live
            .partition_point(|&id| self.states[id].start <= end);
        let scan_start = self
            .prefix_max_end
            .partition_point(|&max_end| max_end < start)
            .min(search_end);

        self.live[scan_start..search_end]
            .iter()
            .copied()
            .filter(|&id| self.states[id].end >= start)
            .collect()
    }

    /// Re-base every live marker after an edit and return the markers the edit invalidated.
    pub(crate) fn apply_edit(&mut self, edit: EditSpan) -> Vec<MarkerId> {
        // Markers that end before the edit can neither move nor die.
        let from = self
            .prefix_max_end
            .partition_point(|&max_end| max_end < edit.offset);
        if from == self.live.len() {
            return Vec::new();
        }

        let mut invalidated = Vec::new();
        let mut tail = self.live.split_off(from);
        let states = &mut self.states;
        tail.retain(|&id| {
            let state = &mut states[id];
            match translate::apply_change(edit, state.range(), state.policy) {
                Some(range) => {
                    state.start = range.start;
                    state.end = range.end;
                    true
                }
                None => {
                    state.valid = false;
                    invalidated.push(id);
                    false
                }
            }
        });
        // New starts are either unchanged or at least `edit.offset`, which is past every start
        // before `from`, so only the tail needs re-sorting.
        tail.sort_by_key(|&id| states[id].order_key());
        self.live.append(&mut tail);
        self.rebuild_prefix_max_end_from(from);

        if !invalidated.is_empty() {
            log::debug!(
                "edit at {} (-{} +{}) invalidated {} marker(s)",
                edit.offset,
                edit.old_length,
                edit.new_length,
                invalidated.len()
            );
        }
        invalidated
    }

    /// Validate ordering, prefix maxima and bounds. Returns a description of the first violation.
    pub(crate) fn check_invariants(&self, text_len: usize) -> Result<(), String> {
        if self.prefix_max_end.len() != self.live.len() {
            return Err(format!(
                "prefix array has {} entries for {} markers",
                self.prefix_max_end.len(),
                self.live.len()
            ));
        }
        let mut max_end = 0;
        for (i, &id) in self.live.iter().enumerate() {
            let state = &self.states[id];
            if !state.valid {
                return Err(format!("{id} is invalid but still live"));
            }
            if state.start > state.end || state.end > text_len {
                return Err(format!(
                    "{id} has range {}..{} in text of length {text_len}",
                    state.start, state.end
                ));
            }
            if i > 0 && self.key(self.live[i - 1]) >= self.key(id) {
                return Err(format!("{id} is out of order"));
            }
            max_end = max_end.max(state.end);
            if self.prefix_max_end[i] != max_end {
                return Err(format!("stale prefix maximum at {i}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(ranges: &[(usize, usize)]) -> (MarkerTree, Vec<MarkerId>) {
        let mut tree = MarkerTree::new();
        let ids = ranges.iter().map(|&(s, e)| tree.insert(s, e)).collect();
        (tree, ids)
    }

    #[test]
    fn test_insert_keeps_order() {
        let (tree, ids) = tree_with(&[(5, 9), (1, 2), (5, 6), (0, 10)]);
        let order: Vec<MarkerId> = tree.iter().map(|m| m.id).collect();
        assert_eq!(order, vec![ids[3], ids[1], ids[0], ids[2]]);
        assert_eq!(tree.prefix_max_end, vec![10, 10, 10, 10]);
        assert!(tree.check_invariants(10).is_ok());
    }

    #[test]
    fn test_query_point() {
        let (tree, ids) = tree_with(&[(0, 3), (2, 6), (4, 5), (8, 8)]);
        assert_eq!(tree.query_point(2), vec![ids[0], ids[1]]);
        assert_eq!(tree.query_point(4), vec![ids[1], ids[2]]);
        assert_eq!(tree.query_point(6), Vec::<MarkerId>::new());
        // Empty markers contain nothing.
        assert_eq!(tree.query_point(8), Vec::<MarkerId>::new());
    }

    #[test]
    fn test_query_range_is_inclusive() {
        let (tree, ids) = tree_with(&[(0, 3), (3, 5), (6, 6), (7, 9)]);
        assert_eq!(tree.query_range(3, 3), vec![ids[0], ids[1]]);
        assert_eq!(tree.query_range(5, 6), vec![ids[1], ids[2]]);
        assert_eq!(tree.query_range(10, 12), Vec::<MarkerId>::new());
        assert_eq!(tree.query_range(4, 2), Vec::<MarkerId>::new());
    }

    #[test]
    fn test_query_point_prunes_with_prefix_max() {
        let mut tree = MarkerTree::new();
        for i in 0..1000 {
            tree.insert(i * 2, i * 2 + 1);
        }
        let hit = tree.query_point(1500);
        assert_eq!(hit.len(), 1);
        assert_eq!(tree.get(hit[0]).unwrap().start_offset, 1500);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (mut tree, ids) = tree_with(&[(1, 4), (1, 4)]);
        assert!(tree.remove(ids[0]).is_some_and(|state| state.valid));
        assert!(tree.remove(ids[0]).is_none());
        assert_eq!(tree.len(), 1);
        assert!(tree.is_valid(ids[1]));
        assert_eq!(tree.get(ids[0]), None);
        assert!(tree.check_invariants(4).is_ok());
    }

    #[test]
    fn test_disposed_slots_are_reused() {
        let mut tree = MarkerTree::new();
        let keep = tree.insert(3, 7);
        for i in 0..100_000 {
            let id = tree.insert(i % 5, i % 5 + 1);
            assert!(tree.remove(id).is_some());
        }
        assert_eq!(tree.len(), 1);
        assert!(tree.capacity() <= 8, "capacity grew to {}", tree.capacity());
        assert_eq!(tree.get(keep).unwrap().range(), Some(3..7));
    }

    #[test]
    fn test_stale_id_does_not_alias_new_marker() {
        let mut tree = MarkerTree::new();
        let stale = tree.insert(0, 2);
        tree.remove(stale);
        let fresh = tree.insert(5, 6);
        assert_ne!(stale, fresh);
        assert!(!tree.is_valid(stale));
        assert_eq!(tree.get(stale), None);
        assert!(!tree.update_policy(stale, |p| p.greedy_to_left = true));
        assert!(tree.remove(stale).is_none());
        assert!(!tree.get(fresh).unwrap().greedy_to_left);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_equal_starts_keep_creation_order_after_reuse() {
        let mut tree = MarkerTree::new();
        let first = tree.insert(2, 4);
        let gone = tree.insert(0, 1);
        tree.remove(gone);
        // Reuses the freed slot but is still created after `first`.
        let second = tree.insert(2, 3);
        let order: Vec<MarkerId> = tree.iter().map(|m| m.id).collect();
        assert_eq!(order, vec![first, second]);
        assert!(tree.check_invariants(4).is_ok());
    }

    #[test]
    fn test_invalidated_marker_keeps_slot_until_removed() {
        let (mut tree, ids) = tree_with(&[(2, 4)]);
        assert_eq!(tree.apply_edit(EditSpan::new(1, 4, 0)), vec![ids[0]]);
        let frozen = tree.get(ids[0]).unwrap();
        assert!(!frozen.valid);
        assert_eq!((frozen.start_offset, frozen.end_offset), (2, 4));

        assert!(tree.remove(ids[0]).is_some_and(|state| !state.valid));
        assert_eq!(tree.get(ids[0]), None);
    }

    #[test]
    fn test_apply_edit_reorders_tail() {
        // Deleting [1, 3) turns (2, 8) into (1, 6) via the prefix rule and moves (3, 4) to (1, 2).
        let (mut tree, ids) = tree_with(&[(0, 1), (2, 8), (3, 4)]);
        let dead = tree.apply_edit(EditSpan::new(1, 2, 0));
        assert!(dead.is_empty());
        let ranges: Vec<_> = tree.iter().map(|m| (m.id, m.start_offset, m.end_offset)).collect();
        assert_eq!(
            ranges,
            vec![(ids[0], 0, 1), (ids[1], 1, 6), (ids[2], 1, 2)]
        );
        assert!(tree.check_invariants(8).is_ok());
    }

    #[test]
    fn test_apply_edit_invalidates() {
        let (mut tree, ids) = tree_with(&[(2, 5), (0, 10)]);
        let dead = tree.apply_edit(EditSpan::new(1, 5, 0));
        assert_eq!(dead, vec![ids[0]]);
        assert!(!tree.is_valid(ids[0]));
        assert_eq!(tree.get(ids[0]).unwrap().start_offset, 2);
        assert_eq!(tree.get(ids[1]).unwrap().range(), Some(0..5));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_policy_update_requires_valid_marker() {
        let (mut tree, ids) = tree_with(&[(0, 1)]);
        assert!(tree.update_policy(ids[0], |p| p.greedy_to_left = true));
        assert!(tree.get(ids[0]).unwrap().greedy_to_left);
        tree.remove(ids[0]);
        assert!(!tree.update_policy(ids[0], |p| p.greedy_to_right = true));
        assert!(!tree.update_policy(MarkerId::default(), |p| p.greedy_to_right = true));
    }
}
