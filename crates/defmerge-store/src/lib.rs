//! Document storage for defmerge.
//!
//! The merge engine reads its inputs from, and writes its result to, a
//! document store it does not own. This crate defines that boundary and ships
//! two backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsDocumentStore`] -- one pretty-printed `<id>.json` file per document
//!
//! # Design Rules
//!
//! 1. Operations are synchronous round-trips and are never retried here.
//! 2. Errors are propagated unchanged to the caller.
//! 3. The store never interprets a definition; it persists what it is given.
//! 4. Publishing never overwrites: replacing a document is delete + publish,
//!    or an explicit update.

pub mod error;
pub mod fs;
pub mod memory;
pub mod request;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use request::{PublishRequest, UpdateRequest};
pub use traits::DocumentStore;
