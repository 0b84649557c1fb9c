use crate::document::DocumentId;
use thiserror::Error;

/// Result alias used throughout `text-model`.
pub type Result<T> = std::result::Result<T, TextModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by buffer edits, marker creation and the document synchronizer.
pub enum TextModelError {
    #[error("range {start}..{end} is out of bounds for text of length {len}")]
    /// An offset or range was outside `[0, len]`, or had `start > end`.
    OutOfBounds {
        /// Requested start offset.
        start: usize,
        /// Requested end offset (equal to `start` for single-offset arguments).
        end: usize,
        /// Character length of the text at the time of the call.
        len: usize,
    },

    #[error(transparent)]
    /// A synchronizer operation was called in the wrong transaction state.
    TransactionState(#[from] TransactionStateError),
}

impl TextModelError {
    pub(crate) fn check_range(start: usize, end: usize, len: usize) -> Result<()> {
        if start > end || end > len {
            return Err(Self::OutOfBounds { start, end, len });
        }
        Ok(())
    }

    pub(crate) fn check_offset(offset: usize, len: usize) -> Result<()> {
        Self::check_range(offset, offset, len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Caller protocol violations of [`crate::DocumentSynchronizer`].
pub enum TransactionStateError {
    #[error("no transaction is open for document {0}")]
    /// An edit, commit or abort was issued without an open transaction.
    NotStarted(DocumentId),

    #[error("a transaction is already open for document {0}")]
    /// `start_transaction` was called twice for the same document.
    AlreadyStarted(DocumentId),

    #[error(
        "document {document} changed outside the transaction (expected version {expected}, found {found})"
    )]
    /// The peer document was edited directly while a transaction was open.
    PeerModified {
        /// The document the transaction belongs to.
        document: DocumentId,
        /// Version captured by `start_transaction`.
        expected: u64,
        /// Version found at commit time.
        found: u64,
    },
}
