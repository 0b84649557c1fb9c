#![warn(missing_docs)]
//! Text Model - Headless Text Buffer with Range Markers
//!
//! # Overview
//!
//! `text-model` keeps a mutable text buffer together with a set of **range markers**: tracked
//! `[start, end)` character ranges that are re-based on every insert, delete and replace. Markers
//! that an edit destroys are invalidated (permanently), everything else stays consistent with the
//! text before the mutating call returns.
//!
//! On top of that sits a transactional synchronizer that batches edits against a working copy of
//! a document, merges overlapping edits into minimal fragments, and replays them onto the
//! document in one commit.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  DocumentSynchronizer (transactions)        │  ← Batched edits
//! ├─────────────────────────────────────────────┤
//! │  Document (buffer + markers + listeners)    │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Edit translation (marker policy)           │  ← Offset adjustment
//! ├─────────────────────────────────────────────┤
//! │  MarkerTree (sorted, prefix max end)        │  ← Interval queries
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (Rope)                          │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use text_model::Document;
//!
//! let mut doc = Document::new("0123456789");
//! let marker = doc.create_range_marker(2, 5).unwrap();
//!
//! // Insertion at a non-greedy start pushes the marker right.
//! doc.insert_string(2, "xxx").unwrap();
//! assert_eq!(doc.marker_range(marker), Some(5..8));
//!
//! // A greedy start absorbs the insertion instead.
//! let greedy = doc.create_range_marker(5, 8).unwrap();
//! doc.set_greedy_to_left(greedy, true);
//! doc.insert_string(5, "yy").unwrap();
//! assert_eq!(doc.marker_range(greedy), Some(5..10));
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Rope based text storage producing [`DocumentEvent`]s
//! - [`intervals`] - Marker storage and interval queries
//! - [`translate`] - Marker offset adjustment policy
//! - [`document`] - Documents, markers and listeners
//! - [`sync`] - Transactional synchronization with a working copy
//!
//! # Concurrency
//!
//! A [`Document`] is `Send` but not shared: every mutating operation takes `&mut self`.
//! Independent documents can be edited from different threads.

pub mod buffer;
mod config;
pub mod delta;
pub mod document;
mod error;
pub mod intervals;
mod marker;
pub mod sync;
mod text;
pub mod translate;

pub use buffer::TextBuffer;
pub use config::DocumentOptions;
pub use delta::{DocumentEvent, EditSpan};
pub use document::{Document, DocumentId, DocumentListener, ListenerId};
pub use error::{Result, TextModelError, TransactionStateError};
pub use intervals::MarkerTree;
pub use marker::{MarkerId, RangeMarker};
pub use sync::{CommitSummary, DocumentSynchronizer, Fragment};
pub use translate::{EndpointPolicy, apply_change};
