//! Text plus range markers.
//!
//! A [`Document`] couples a [`TextBuffer`] with a [`MarkerTree`]. Every successful edit re-bases
//! all affected markers before the call returns and then notifies registered listeners, so
//! markers are never observed in a state inconsistent with the text.
//!
//! # Example
//!
//! ```rust
//! use text_model::Document;
//!
//! let mut doc = Document::new("0123456789");
//! let marker = doc.create_range_marker(2, 5).unwrap();
//!
//! doc.insert_string(4, "xxx").unwrap();
//! assert_eq!(doc.marker(marker).unwrap().range(), Some(2..8));
//!
//! doc.delete_string(1, 9).unwrap();
//! assert!(!doc.is_valid(marker));
//! ```

use crate::buffer::TextBuffer;
use crate::config::DocumentOptions;
use crate::delta::DocumentEvent;
use crate::error::{Result, TextModelError};
use crate::intervals::MarkerTree;
use crate::marker::{MarkerId, RangeMarker};
use crate::translate::EndpointPolicy;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub(crate) u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Document change callback type
pub type DocumentListener = Box<dyn FnMut(&DocumentEvent) + Send>;

/// Handle returned by [`Document::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A text buffer with range markers and change listeners.
pub struct Document {
    id: DocumentId,
    buffer: TextBuffer,
    markers: MarkerTree,
    listeners: Vec<(ListenerId, DocumentListener)>,
    next_listener_id: u64,
    options: DocumentOptions,
}

impl Document {
    /// Create a document with default options.
    pub fn new(text: &str) -> Self {
        Self::with_options(text, DocumentOptions::default())
    }

    /// Create an empty document.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Create a document with explicit options.
    pub fn with_options(text: &str, options: DocumentOptions) -> Self {
        let mut buffer = TextBuffer::new(text);
        buffer.set_minimize_replacements(options.minimize_replacements);
        Self {
            id: DocumentId::next(),
            buffer,
            markers: MarkerTree::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            options,
        }
    }

    /// Identifier of this document.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Read-only access to the text buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The entire text.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Character length of the text.
    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    /// Buffer version (number of applied edits).
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    /// Insert `text` at `offset`.
    pub fn insert_string(&mut self, offset: usize, text: &str) -> Result<Option<DocumentEvent>> {
        let event = self.buffer.insert_string(offset, text)?;
        Ok(self.after_edit(event))
    }

    /// Delete the characters in `start..end`.
    pub fn delete_string(&mut self, start: usize, end: usize) -> Result<Option<DocumentEvent>> {
        let event = self.buffer.delete_string(start, end)?;
        Ok(self.after_edit(event))
    }

    /// Replace the characters in `start..end` with `text`.
    pub fn replace_string(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<Option<DocumentEvent>> {
        let event = self.buffer.replace_string(start, end, text)?;
        Ok(self.after_edit(event))
    }

    fn after_edit(&mut self, event: Option<DocumentEvent>) -> Option<DocumentEvent> {
        let event = event?;
        self.markers.apply_edit(event.span());

        if self.options.check_invariants
            && let Err(violation) = self.markers.check_invariants(self.buffer.len_chars())
        {
            log::error!("marker invariant violated in document {}: {violation}", self.id);
            debug_assert!(false, "marker invariant violated: {violation}");
        }

        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
        Some(event)
    }

    /// Register a listener called after every applied edit.
    pub fn add_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DocumentEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Detach a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Create a non-greedy marker over `start..end`.
    pub fn create_range_marker(&mut self, start: usize, end: usize) -> Result<MarkerId> {
        TextModelError::check_range(start, end, self.len_chars())?;
        Ok(self.markers.insert(start, end))
    }

    /// Create an empty marker at `offset`.
    pub fn create_point_marker(&mut self, offset: usize) -> Result<MarkerId> {
        self.create_range_marker(offset, offset)
    }

    /// Dispose a marker and release its storage.
    ///
    /// Returns `true` if the marker was valid. Disposing a marker an edit already invalidated
    /// frees its frozen snapshot and returns `false`; disposing twice is a no-op.
    pub fn dispose_marker(&mut self, id: MarkerId) -> bool {
        match self.markers.remove(id) {
            Some(state) => state.valid,
            None => {
                log::warn!("ignoring dispose of {id}: marker was already disposed");
                false
            }
        }
    }

    /// Make insertions at the marker start expand the marker.
    pub fn set_greedy_to_left(&mut self, id: MarkerId, greedy: bool) -> bool {
        self.update_policy(id, "set_greedy_to_left", |p| p.greedy_to_left = greedy)
    }

    /// Make insertions at the marker end expand the marker.
    pub fn set_greedy_to_right(&mut self, id: MarkerId, greedy: bool) -> bool {
        self.update_policy(id, "set_greedy_to_right", |p| p.greedy_to_right = greedy)
    }

    /// Set both greedy flags at once.
    pub fn set_greedy(&mut self, id: MarkerId, to_left: bool, to_right: bool) -> bool {
        self.update_policy(id, "set_greedy", |p| {
            p.greedy_to_left = to_left;
            p.greedy_to_right = to_right;
        })
    }

    /// Make an empty, non-greedy marker move behind text inserted at its offset.
    pub fn set_sticking_to_right(&mut self, id: MarkerId, sticking: bool) -> bool {
        self.update_policy(id, "set_sticking_to_right", |p| {
            p.sticking_to_right = sticking
        })
    }

    fn update_policy(
        &mut self,
        id: MarkerId,
        operation: &str,
        update: impl FnOnce(&mut EndpointPolicy),
    ) -> bool {
        let updated = self.markers.update_policy(id, update);
        if !updated {
            log::warn!("ignoring {operation} on {id}: marker is not valid");
        }
        updated
    }

    /// Snapshot of a marker that has not been disposed (including invalidated ones, for
    /// diagnostics).
    pub fn marker(&self, id: MarkerId) -> Option<RangeMarker> {
        self.markers.get(id)
    }

    /// Current range of a valid marker.
    pub fn marker_range(&self, id: MarkerId) -> Option<Range<usize>> {
        self.markers.get(id).and_then(|marker| marker.range())
    }

    /// Returns `true` if the marker still tracks a position.
    pub fn is_valid(&self, id: MarkerId) -> bool {
        self.markers.is_valid(id)
    }

    /// Number of valid markers.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Valid markers ordered by start offset, then creation order.
    pub fn markers(&self) -> impl Iterator<Item = RangeMarker> + '_ {
        self.markers.iter()
    }

    /// Valid markers containing `offset` (`start <= offset < end`).
    pub fn markers_containing(&self, offset: usize) -> Vec<MarkerId> {
        self.markers.query_point(offset)
    }

    /// Valid markers overlapping or touching `start..end`.
    pub fn markers_overlapping(&self, start: usize, end: usize) -> Vec<MarkerId> {
        self.markers.query_range(start, end)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("version", &self.buffer.version())
            .field("len_chars", &self.buffer.len_chars())
            .field("markers", &self.markers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}
