//! Merge engine for analysis definitions.
//!
//! Merging two definitions happens in three stages:
//!
//! 1. [`reconcile`](reconcile::reconcile) compares the dataset declarations
//!    of both sides and produces a [`RenamePlan`] for the incoming document:
//!    a dataset the target already knows is mapped onto the target's alias,
//!    and an alias the target uses for a different dataset is moved to a
//!    fresh one (`ds1` becomes `ds1-1`).
//! 2. The [`AliasRewrite`] visitor applies the plan to every
//!    `DataSetIdentifier` in the incoming document, at any depth.
//! 3. The collection passes append the incoming parameters, datasets, sheets,
//!    filter groups, calculated fields and column configurations to the
//!    target, skipping exact duplicates and failing on name conflicts.
//!
//! [`merge_definitions`] is the pure core. [`MergeEngine`] wraps it with the
//! document store round-trips for create-merges and update-merges.
//!
//! # Failure semantics
//!
//! Every error aborts the whole merge before the store is written.

pub mod config;
pub mod engine;
pub mod error;
pub mod passes;
pub mod reconcile;
pub mod rewrite;

pub use config::{CanvasConfig, MergeConfig};
pub use engine::{MergeEngine, MergeOutcome, MergeTarget};
pub use error::{DocumentRole, MergeError, MergeResult};
pub use passes::{
    merge_definitions, seed_target, structurally_equal, CollectionReport, MergeReport, Merged,
};
pub use reconcile::{reconcile, next_alias, Rename, RenamePlan, RenameReason};
pub use rewrite::{rewrite_map, rewrite_value, AliasRewrite};
