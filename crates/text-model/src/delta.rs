//! Structured edit descriptors.
//!
//! Every successful edit of a [`crate::TextBuffer`] produces one [`DocumentEvent`].
//! The event is handed to the marker translator and to document listeners, and is not
//! retained afterwards. Offsets are expressed in **character offsets** (Unicode scalar values).

/// A single applied text edit.
///
/// Semantics:
/// - `offset` is a character offset in the text **before** the edit.
/// - The removed range is `offset..offset + old_length()`.
/// - `initial_offset` / `initial_old_length` describe the range the caller originally asked to
///   replace. They differ from `offset` / `old_length()` when the buffer trimmed a common prefix or
///   suffix shared by the removed and inserted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    /// Start character offset of the edit.
    pub offset: usize,
    /// Exact removed text (may be empty).
    pub old_text: String,
    /// Exact inserted text (may be empty).
    pub new_text: String,
    /// Start offset of the range passed by the caller.
    pub initial_offset: usize,
    /// Length of the range passed by the caller.
    pub initial_old_length: usize,
    /// Buffer version before the edit.
    pub old_version: u64,
    /// Buffer version after the edit.
    pub new_version: u64,
    old_length: usize,
    new_length: usize,
}

impl DocumentEvent {
    pub(crate) fn new(
        offset: usize,
        old_text: String,
        new_text: String,
        initial_offset: usize,
        initial_old_length: usize,
        old_version: u64,
    ) -> Self {
        let old_length = old_text.chars().count();
        let new_length = new_text.chars().count();
        Self {
            offset,
            old_text,
            new_text,
            initial_offset,
            initial_old_length,
            old_version,
            new_version: old_version + 1,
            old_length,
            new_length,
        }
    }

    /// Length of `old_text` in characters.
    pub fn old_length(&self) -> usize {
        self.old_length
    }

    /// Length of `new_text` in characters.
    pub fn new_length(&self) -> usize {
        self.new_length
    }

    /// Net change in text length.
    pub fn delta(&self) -> isize {
        self.new_length as isize - self.old_length as isize
    }

    /// Exclusive end of the removed range, in pre-edit offsets.
    pub fn old_end(&self) -> usize {
        self.offset + self.old_length
    }

    /// Exclusive end of the inserted range, in post-edit offsets.
    pub fn new_end(&self) -> usize {
        self.offset + self.new_length
    }

    /// Returns `true` if the caller's range was trimmed before the edit was applied.
    pub fn is_minimized(&self) -> bool {
        self.initial_offset != self.offset || self.initial_old_length != self.old_length
    }

    /// The length-only view consumed by the marker translator.
    pub fn span(&self) -> EditSpan {
        EditSpan {
            offset: self.offset,
            old_length: self.old_length,
            new_length: self.new_length,
            initial_offset: self.initial_offset,
            initial_old_length: self.initial_old_length,
        }
    }
}

/// Offsets and lengths of a [`DocumentEvent`], without the texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSpan {
    /// Start offset of the edit.
    pub offset: usize,
    /// Removed length.
    pub old_length: usize,
    /// Inserted length.
    pub new_length: usize,
    /// Start offset of the caller's original range.
    pub initial_offset: usize,
    /// Length of the caller's original range.
    pub initial_old_length: usize,
}

impl EditSpan {
    /// A span that was applied exactly as requested.
    pub fn new(offset: usize, old_length: usize, new_length: usize) -> Self {
        Self {
            offset,
            old_length,
            new_length,
            initial_offset: offset,
            initial_old_length: old_length,
        }
    }

    /// Exclusive end of the removed range.
    pub fn old_end(&self) -> usize {
        self.offset + self.old_length
    }

    /// Shift an offset located at or after [`Self::old_end`].
    pub(crate) fn shift(&self, offset: usize) -> usize {
        offset + self.new_length - self.old_length
    }
}
