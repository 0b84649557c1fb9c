use serde::{Deserialize, Serialize};

/// Behavior switches for a [`crate::Document`] and transactions committed onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// Trim the common prefix/suffix of `replace_string` arguments before applying them.
    pub minimize_replacements: bool,
    /// Slide pure deletions recorded by a transaction so they end on a line boundary.
    pub align_deletions_to_lines: bool,
    /// Verify marker ordering and bounds after every edit.
    pub check_invariants: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            minimize_replacements: true,
            align_deletions_to_lines: true,
            check_invariants: false,
        }
    }
}

impl DocumentOptions {
    /// Set [`Self::minimize_replacements`].
    pub fn with_minimize_replacements(mut self, enabled: bool) -> Self {
        self.minimize_replacements = enabled;
        self
    }

    /// Set [`Self::align_deletions_to_lines`].
    pub fn with_align_deletions_to_lines(mut self, enabled: bool) -> Self {
        self.align_deletions_to_lines = enabled;
        self
    }

    /// Set [`Self::check_invariants`].
    pub fn with_check_invariants(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }
}
