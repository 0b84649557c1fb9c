//! Transactional synchronization of a working copy with its document.
//!
//! While a transaction is open, edits are applied to a working copy of the document text right
//! away, and each edit is recorded as an affected *fragment*: a range of the (still untouched)
//! peer document together with the text that should replace it. Fragments are kept sorted and
//! disjoint; an edit whose peer range touches or overlaps existing fragments is merged with them
//! into a single fragment. Committing replays the fragments onto the document from last to first,
//! so each one is applied exactly once with its original offsets, and markers on the document see
//! a minimal set of replacements.
//!
//! # Example
//!
//! ```rust
//! use text_model::{Document, DocumentSynchronizer};
//!
//! let mut doc = Document::new("0123456789");
//! let mut sync = DocumentSynchronizer::new();
//!
//! sync.start_transaction(&doc).unwrap();
//! sync.replace_string(&doc, 3, 4, "a").unwrap();
//! sync.replace_string(&doc, 3, 5, "bb").unwrap();
//! assert_eq!(sync.fragments(&doc).unwrap().len(), 1);
//!
//! let summary = sync.commit_transaction(&mut doc).unwrap();
//! assert_eq!(summary.fragments, 1);
//! assert_eq!(doc.text(), "012bb56789");
//! ```

use crate::delta::DocumentEvent;
use crate::document::{Document, DocumentId};
use crate::error::{Result, TextModelError, TransactionStateError};
use crate::text;
use ropey::Rope;
use std::collections::HashMap;
use std::ops::Range;

/// A pending replacement of a peer document range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    range: Range<usize>,
    replacement: String,
    replacement_len: usize,
}

impl Fragment {
    fn new(range: Range<usize>, replacement: String) -> Self {
        let replacement_len = text::char_len(&replacement);
        Self {
            range,
            replacement,
            replacement_len,
        }
    }

    /// Range of the peer document that will be replaced.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Text that will replace [`Self::range`].
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn contains(&self, offset: usize) -> bool {
        self.range.start <= offset && offset <= self.range.end
    }

    fn touches(&self, range: &Range<usize>) -> bool {
        self.range.start <= range.end && range.start <= self.range.end
    }
}

/// Result of [`DocumentSynchronizer::commit_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Number of merged fragments replayed onto the document.
    pub fragments: usize,
    /// Events produced by the document, in application order (last fragment first).
    pub events: Vec<DocumentEvent>,
}

struct ChangeTransaction {
    base_version: u64,
    text: Rope,
    fragments: Vec<Fragment>,
    align_deletions_to_lines: bool,
}

impl ChangeTransaction {
    fn new(document: &Document) -> Self {
        Self {
            base_version: document.version(),
            text: document.buffer().rope().clone(),
            fragments: Vec::new(),
            align_deletions_to_lines: document.options().align_deletions_to_lines,
        }
    }

    fn replace(&mut self, initial_start: usize, initial_end: usize, replace: &str) {
        let chars: Vec<char> = self.text.slice(initial_start..initial_end).chars().collect();
        let new: Vec<char> = replace.chars().collect();

        let (prefix, suffix) = text::common_affixes(&chars, &new);
        let (mut start, mut end) = (prefix, chars.len() - suffix);
        let (mut new_start, mut new_end) = (prefix, new.len() - suffix);

        // A deletion spanning lines can often be shifted left to end right after a newline,
        // which keeps the committed change confined to whole lines.
        if self.align_deletions_to_lines
            && new_start == new_end
            && start > 0
            && start < end
            && chars[start..end].contains(&'\n')
        {
            while start > 0
                && new_start > 0
                && chars[start - 1] == chars[end - 1]
                && chars[end - 1] != '\n'
            {
                start -= 1;
                end -= 1;
                new_start -= 1;
                new_end -= 1;
            }
        }

        if start == end && new_start == new_end {
            return;
        }
        let replacement = text::char_slice(replace, new_start, new_end);
        self.update_fragments(initial_start + start, initial_start + end, replacement);
    }

    fn update_fragments(&mut self, start: usize, end: usize, replacement: &str) {
        let peer_start = self.copy_to_peer_offset(start);
        let peer_end = self.copy_to_peer_offset(end);

        let merged_start = self
            .find_fragment(peer_start)
            .map_or(peer_start, |f| f.range.start);
        let merged_end = self
            .find_fragment(peer_end)
            .map_or(peer_end, |f| f.range.end);
        let merged = merged_start..merged_end;

        let copy_start = self.peer_to_copy_offset(merged.start, false);
        let copy_end = self.peer_to_copy_offset(merged.end, true);

        if start < end {
            self.text.remove(start..end);
        }
        if !replacement.is_empty() {
            self.text.insert(start, replacement);
        }
        let copy_end = copy_end - (end - start) + text::char_len(replacement);
        let merged_text = self.text.slice(copy_start..copy_end).to_string();

        self.fragments.retain(|fragment| !fragment.touches(&merged));
        let pos = self
            .fragments
            .partition_point(|fragment| fragment.range.start < merged.start);
        self.fragments.insert(pos, Fragment::new(merged, merged_text));
    }

    fn find_fragment(&self, peer_offset: usize) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|fragment| fragment.contains(peer_offset))
    }

    /// Offsets inside a replaced region map to the start of its fragment.
    fn copy_to_peer_offset(&self, mut offset: usize) -> usize {
        for fragment in &self.fragments {
            if fragment.range.start + fragment.replacement_len < offset {
                offset = offset - fragment.replacement_len + fragment.range.len();
                continue;
            }
            return fragment.range.start.min(offset);
        }
        offset
    }

    /// Offsets inside a fragment map to the start (or, with `greedy_right`, the end) of its
    /// replacement in the working copy.
    fn peer_to_copy_offset(&self, offset: usize, greedy_right: bool) -> usize {
        let (mut added, mut removed) = (0, 0);
        for fragment in &self.fragments {
            if fragment.contains(offset) {
                let start = fragment.range.start + added - removed;
                return if greedy_right {
                    start + fragment.replacement_len
                } else {
                    start
                };
            }
            if fragment.range.start > offset {
                break;
            }
            added += fragment.replacement_len;
            removed += fragment.range.len();
        }
        offset + added - removed
    }
}

/// Coordinates at most one open transaction per document.
#[derive(Default)]
pub struct DocumentSynchronizer {
    transactions: HashMap<DocumentId, ChangeTransaction>,
}

impl DocumentSynchronizer {
    /// Create a synchronizer with no open transactions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a transaction is open for `document`.
    pub fn is_in_transaction(&self, document: &Document) -> bool {
        self.transactions.contains_key(&document.id())
    }

    /// Open a transaction, taking a working copy of the document text.
    pub fn start_transaction(&mut self, document: &Document) -> Result<()> {
        let id = document.id();
        if self.transactions.contains_key(&id) {
            return Err(TransactionStateError::AlreadyStarted(id).into());
        }
        log::debug!("starting transaction for document {id} at version {}", document.version());
        self.transactions.insert(id, ChangeTransaction::new(document));
        Ok(())
    }

    fn transaction_mut(&mut self, id: DocumentId) -> Result<&mut ChangeTransaction> {
        self.transactions
            .get_mut(&id)
            .ok_or_else(|| TransactionStateError::NotStarted(id).into())
    }

    fn transaction(&self, id: DocumentId) -> Result<&ChangeTransaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| TransactionStateError::NotStarted(id).into())
    }

    /// Insert `text` at `offset` of the working copy.
    pub fn insert_string(&mut self, document: &Document, offset: usize, text: &str) -> Result<()> {
        self.replace_string(document, offset, offset, text)
    }

    /// Delete `start..end` of the working copy.
    pub fn delete_string(&mut self, document: &Document, start: usize, end: usize) -> Result<()> {
        self.replace_string(document, start, end, "")
    }

    /// Replace `start..end` of the working copy with `text`.
    pub fn replace_string(
        &mut self,
        document: &Document,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<()> {
        let transaction = self.transaction_mut(document.id())?;
        TextModelError::check_range(start, end, transaction.text.len_chars())?;
        transaction.replace(start, end, text);
        Ok(())
    }

    /// Current text of the working copy.
    pub fn transaction_text(&self, document: &Document) -> Result<String> {
        Ok(self.transaction(document.id())?.text.to_string())
    }

    /// Pending fragments, sorted by peer offset.
    pub fn fragments(&self, document: &Document) -> Result<&[Fragment]> {
        Ok(&self.transaction(document.id())?.fragments)
    }

    /// Replay all fragments onto `document` and close the transaction.
    ///
    /// Fails without closing the transaction if `document` was edited since
    /// [`Self::start_transaction`], or if a fragment does not fit the document. Nothing is
    /// replayed in either case.
    pub fn commit_transaction(&mut self, document: &mut Document) -> Result<CommitSummary> {
        let id = document.id();
        let expected = self.transaction(id)?.base_version;
        if expected != document.version() {
            return Err(TransactionStateError::PeerModified {
                document: id,
                expected,
                found: document.version(),
            }
            .into());
        }
        // Fragments are disjoint and replayed from the back, so each range is checked against
        // the unedited document.
        let len = document.len_chars();
        for fragment in &self.transaction(id)?.fragments {
            TextModelError::check_range(fragment.range.start, fragment.range.end, len)?;
        }
        let Some(transaction) = self.transactions.remove(&id) else {
            return Err(TransactionStateError::NotStarted(id).into());
        };

        let mut events = Vec::new();
        for fragment in transaction.fragments.iter().rev() {
            match document.replace_string(
                fragment.range.start,
                fragment.range.end,
                &fragment.replacement,
            ) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => {
                    log::error!("replaying fragment {:?} on document {id}: {err}", fragment.range);
                    debug_assert!(false, "checked fragment failed to replay: {err}");
                }
            }
        }

        if document.options().check_invariants && *document.buffer().rope() != transaction.text {
            log::error!("document {id} diverged from its transaction copy after commit");
            debug_assert!(false, "document diverged from transaction copy");
        }
        log::debug!(
            "committed {} fragment(s) to document {id}",
            transaction.fragments.len()
        );
        Ok(CommitSummary {
            fragments: transaction.fragments.len(),
            events,
        })
    }

    /// Discard the transaction without touching the document.
    pub fn abort_transaction(&mut self, document: &Document) -> Result<()> {
        let id = document.id();
        match self.transactions.remove(&id) {
            Some(transaction) => {
                log::debug!(
                    "aborted transaction for document {id} with {} pending fragment(s)",
                    transaction.fragments.len()
                );
                Ok(())
            }
            None => Err(TransactionStateError::NotStarted(id).into()),
        }
    }
}
