//! Canonical text storage.
//!
//! [`TextBuffer`] owns the character sequence (a [`ropey::Rope`], O(log N) edits by character
//! offset) and a version counter. Each mutation validates its arguments up front, applies the
//! edit atomically and returns the resulting [`DocumentEvent`].

use crate::delta::DocumentEvent;
use crate::error::{Result, TextModelError};
use crate::text;
use ropey::Rope;
use std::ops::Range;

/// Mutable text with a monotonically increasing version.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
    minimize_replacements: bool,
}

impl TextBuffer {
    /// Create a buffer holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
            minimize_replacements: true,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Enable or disable trimming of the common prefix/suffix in [`Self::replace_string`].
    pub fn set_minimize_replacements(&mut self, minimize: bool) {
        self.minimize_replacements = minimize;
    }

    /// Character length of the text.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of applied edits since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The entire text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text in `range` (character offsets).
    pub fn slice(&self, range: Range<usize>) -> Result<String> {
        TextModelError::check_range(range.start, range.end, self.len_chars())?;
        Ok(self.rope.slice(range).to_string())
    }

    /// Character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    /// Read-only access to the underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Insert `text` at `offset`.
    pub fn insert_string(&mut self, offset: usize, text: &str) -> Result<Option<DocumentEvent>> {
        TextModelError::check_offset(offset, self.len_chars())?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.apply(offset, offset, text.to_string(), offset, 0)))
    }

    /// Delete the characters in `start..end`.
    pub fn delete_string(&mut self, start: usize, end: usize) -> Result<Option<DocumentEvent>> {
        TextModelError::check_range(start, end, self.len_chars())?;
        if start == end {
            return Ok(None);
        }
        Ok(Some(self.apply(start, end, String::new(), start, end - start)))
    }

    /// Replace the characters in `start..end` with `text`.
    ///
    /// Unless disabled, the common prefix and suffix of the removed and inserted text are left
    /// untouched, so replacing a range with identical text produces no event at all.
    pub fn replace_string(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<Option<DocumentEvent>> {
        TextModelError::check_range(start, end, self.len_chars())?;

        let (mut from, mut to) = (start, end);
        let mut inserted = text;
        if self.minimize_replacements {
            let old: Vec<char> = self.rope.slice(start..end).chars().collect();
            let new: Vec<char> = text.chars().collect();
            let (prefix, suffix) = text::common_affixes(&old, &new);
            from += prefix;
            to -= suffix;
            inserted = text::char_slice(text, prefix, new.len() - suffix);
        }

        if from == to && inserted.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.apply(
            from,
            to,
            inserted.to_string(),
            start,
            end - start,
        )))
    }

    fn apply(
        &mut self,
        start: usize,
        end: usize,
        inserted: String,
        initial_offset: usize,
        initial_old_length: usize,
    ) -> DocumentEvent {
        let removed = self.rope.slice(start..end).to_string();
        if start < end {
            self.rope.remove(start..end);
        }
        if !inserted.is_empty() {
            self.rope.insert(start, &inserted);
        }

        let event = DocumentEvent::new(
            start,
            removed,
            inserted,
            initial_offset,
            initial_old_length,
            self.version,
        );
        self.version = event.new_version;
        log::trace!(
            "buffer edit at {} (-{} +{}), version {}",
            event.offset,
            event.old_length(),
            event.new_length(),
            self.version
        );
        event
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::empty()
    }
}
