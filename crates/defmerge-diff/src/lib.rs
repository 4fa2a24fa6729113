//! Diffs between analysis documents.
//!
//! Used to preview what a merge would write before it is written.
//!
//! # Key Types
//!
//! - [`DocumentDiff`] / [`SectionChange`] -- per-section summary of two documents
//! - [`LineDiff`] / [`DiffHunk`] / [`DiffLine`] -- line-level diff of their JSON

pub mod document_diff;
pub mod error;
pub mod line_diff;

pub use document_diff::{diff_documents, DocumentDiff, SectionChange};
pub use error::{DiffError, DiffResult};
pub use line_diff::{diff_lines, DiffHunk, DiffLine, LineDiff, DEFAULT_CONTEXT};
