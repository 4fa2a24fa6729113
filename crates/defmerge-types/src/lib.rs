//! Foundation types for defmerge.
//!
//! This crate models the analysis definition document exchanged with the
//! document store. Field names mirror the store's native JSON shape
//! (PascalCase keys), so a document fetched from the store deserializes
//! without translation and unknown keys survive a round-trip.
//!
//! # Key Types
//!
//! - [`AnalysisDocument`] -- a stored document: id, name, definition, theme
//! - [`Definition`] -- the unit of merge, holding every collection
//! - [`DataSetReference`] -- canonical dataset ARN paired with its local alias
//! - [`ParameterDeclaration`] -- kind-tagged named parameter
//! - [`CalculatedField`] -- derived field owned by a dataset alias
//! - [`AnalysisId`] -- validated document identifier
//! - [`AccessPrincipal`] / [`ResourcePermission`] -- grants attached on publish

pub mod access;
pub mod calculated;
pub mod dataset;
pub mod document;
pub mod error;
pub mod identity;
pub mod parameter;

pub use access::{AccessPrincipal, ResourcePermission, DEFAULT_ANALYSIS_ACTIONS};
pub use calculated::{CalculatedField, LogicalKey};
pub use dataset::DataSetReference;
pub use document::{AnalysisDocument, Definition};
pub use error::TypeError;
pub use identity::AnalysisId;
pub use parameter::ParameterDeclaration;

/// Field that carries a dataset alias inside sheets, filters, calculated
/// fields, parameters and column configurations.
pub const ALIAS_FIELD: &str = "DataSetIdentifier";
