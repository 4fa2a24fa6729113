//! The merge orchestrator: store round-trips around [`merge_definitions`].

use defmerge_store::{DocumentStore, PublishRequest, UpdateRequest};
use defmerge_types::{AnalysisDocument, AnalysisId, Definition};
use tracing::{debug, info};

use crate::config::MergeConfig;
use crate::error::MergeResult;
use crate::passes::{merge_definitions, seed_target, MergeReport};

/// Where a merged document is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeTarget {
    pub id: AnalysisId,
    pub name: String,
}

impl MergeTarget {
    pub fn new(id: AnalysisId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A merged document, written or not, and how it was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    pub target: MergeTarget,
    pub definition: Definition,
    pub theme_arn: Option<String>,
    pub report: MergeReport,
}

impl MergeOutcome {
    /// The document as it is (or would be) stored.
    pub fn to_document(&self) -> AnalysisDocument {
        AnalysisDocument {
            analysis_id: Some(self.target.id.clone()),
            name: Some(self.target.name.clone()),
            definition: self.definition.clone(),
            theme_arn: self.theme_arn.clone(),
        }
    }
}

/// Merges documents held in a [`DocumentStore`].
///
/// Every operation computes the full merge in memory first; the store is only
/// written once all passes have succeeded. The engine does not lock across
/// its read-modify-write, so concurrent merges into one target must be
/// serialized by the caller.
pub struct MergeEngine<S: DocumentStore> {
    store: S,
    config: MergeConfig,
}

impl<S: DocumentStore> MergeEngine<S> {
    pub fn new(store: S, config: MergeConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge `first` and `second` into a brand new document at `target`.
    ///
    /// Any document already at the target identifier is replaced. The new
    /// document inherits the theme of `first` and is shared with the
    /// configured principal.
    pub fn create_merge(
        &self,
        first: &AnalysisId,
        second: &AnalysisId,
        target: &MergeTarget,
    ) -> MergeResult<MergeOutcome> {
        let outcome = self.plan_create(first, second, target)?;

        if self.store.delete(&target.id)? {
            debug!(id = %target.id, "replaced existing document");
        }
        self.store.publish(&PublishRequest {
            id: outcome.target.id.clone(),
            name: outcome.target.name.clone(),
            definition: outcome.definition.clone(),
            theme_arn: outcome.theme_arn.clone(),
            permissions: self.config.permissions(),
        })?;

        info!(
            id = %target.id,
            first = %first,
            second = %second,
            appended = outcome.report.total_appended(),
            renames = outcome.report.plan.len(),
            "create-merge published"
        );
        Ok(outcome)
    }

    /// Merge `source` into the existing document at `target`, in place.
    ///
    /// The target keeps its theme and permissions.
    pub fn update_merge(
        &self,
        source: &AnalysisId,
        target: &MergeTarget,
    ) -> MergeResult<MergeOutcome> {
        let outcome = self.plan_update(source, target)?;

        self.store.update(&UpdateRequest {
            id: outcome.target.id.clone(),
            name: outcome.target.name.clone(),
            definition: outcome.definition.clone(),
            theme_arn: outcome.theme_arn.clone(),
        })?;

        info!(
            id = %target.id,
            source = %source,
            appended = outcome.report.total_appended(),
            renames = outcome.report.plan.len(),
            "update-merge applied"
        );
        Ok(outcome)
    }

    /// Compute what [`create_merge`](Self::create_merge) would publish,
    /// without writing.
    pub fn plan_create(
        &self,
        first: &AnalysisId,
        second: &AnalysisId,
        target: &MergeTarget,
    ) -> MergeResult<MergeOutcome> {
        let first_doc = self.store.fetch(first)?;
        let second_doc = self.store.fetch(second)?;
        debug!(first = %first, second = %second, "fetched create-merge inputs");

        let seeded = seed_target(&first_doc.definition, &self.config);
        let merged = merge_definitions(seeded, second_doc.definition, &self.config)?;

        Ok(MergeOutcome {
            target: target.clone(),
            definition: merged.definition,
            theme_arn: first_doc.theme_arn,
            report: merged.report,
        })
    }

    /// Compute what [`update_merge`](Self::update_merge) would write,
    /// without writing.
    pub fn plan_update(
        &self,
        source: &AnalysisId,
        target: &MergeTarget,
    ) -> MergeResult<MergeOutcome> {
        let existing = self.store.fetch(&target.id)?;
        let source_doc = self.store.fetch(source)?;
        debug!(source = %source, target = %target.id, "fetched update-merge inputs");

        let merged = merge_definitions(existing.definition, source_doc.definition, &self.config)?;

        Ok(MergeOutcome {
            target: target.clone(),
            definition: merged.definition,
            theme_arn: existing.theme_arn,
            report: merged.report,
        })
    }
}
