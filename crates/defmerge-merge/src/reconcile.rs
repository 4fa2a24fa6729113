//! Reference reconciliation: decide how incoming dataset aliases must be
//! renamed before the incoming document can be merged into a target.
//!
//! Two kinds of disagreement are resolved:
//!
//! - **Shared dataset, different alias.** The incoming alias is renamed to the
//!   target's alias so existing target expressions stay valid.
//! - **Shared alias, different dataset.** The incoming alias is renamed to a
//!   fresh alias, keeping the two datasets distinct.
//!
//! Only the incoming side is ever renamed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use defmerge_types::DataSetReference;

use crate::error::{MergeError, MergeResult};

/// Why an incoming alias is being renamed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameReason {
    /// The target already declares the same dataset under another alias.
    SharedDataSet { data_set_arn: String },
    /// The target uses the same alias for a different dataset.
    AliasClash {
        target_arn: String,
        incoming_arn: String,
    },
}

/// One scheduled alias substitution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
    pub reason: RenameReason,
}

/// The alias substitutions to apply to the incoming document.
///
/// Keys are incoming aliases; a plan never contains identity mappings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenamePlan {
    renames: BTreeMap<String, Rename>,
    unchanged: Vec<String>,
}

impl RenamePlan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `from -> to`. Identity mappings are ignored.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>, reason: RenameReason) {
        let (from, to) = (from.into(), to.into());
        if from == to {
            return;
        }
        self.renames
            .insert(from.clone(), Rename { from, to, reason });
    }

    /// The new alias for `alias`, if it is being renamed.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.renames.get(alias).map(|r| r.to.as_str())
    }

    /// Returns `true` if no alias is renamed.
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Number of renamed aliases.
    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// Scheduled renames, ordered by incoming alias.
    pub fn renames(&self) -> impl Iterator<Item = &Rename> {
        self.renames.values()
    }

    /// Aliases both documents already use for the same dataset.
    pub fn unchanged(&self) -> &[String] {
        &self.unchanged
    }
}

/// Compute the renames that make `incoming` safe to merge into `target`.
///
/// Both slices are expected to satisfy the per-document invariant: each alias
/// and each dataset ARN appears once. `max_probes` bounds the search for a
/// fresh alias; exhausting it yields
/// [`MergeError::UnresolvableAliasCollision`].
pub fn reconcile(
    target: &[DataSetReference],
    incoming: &[DataSetReference],
    max_probes: usize,
) -> MergeResult<RenamePlan> {
    let target_alias_by_arn: HashMap<&str, &str> = target
        .iter()
        .map(|d| (d.data_set_arn.as_str(), d.identifier.as_str()))
        .collect();
    let target_arn_by_alias: HashMap<&str, &str> = target
        .iter()
        .map(|d| (d.identifier.as_str(), d.data_set_arn.as_str()))
        .collect();

    // Every alias either side uses, plus every alias this plan hands out.
    let mut taken: BTreeSet<String> = target
        .iter()
        .chain(incoming)
        .map(|d| d.identifier.clone())
        .collect();

    let mut plan = RenamePlan::new();
    for ds in incoming {
        let alias = ds.identifier.as_str();
        let arn = ds.data_set_arn.as_str();

        if let Some(&target_alias) = target_alias_by_arn.get(arn) {
            if target_alias == alias {
                plan.unchanged.push(alias.to_string());
            } else {
                debug!(from = alias, to = target_alias, arn, "dataset shared under a different alias");
                plan.insert(
                    alias,
                    target_alias,
                    RenameReason::SharedDataSet {
                        data_set_arn: arn.to_string(),
                    },
                );
            }
        } else if let Some(&target_arn) = target_arn_by_alias.get(alias) {
            let fresh = fresh_alias(alias, &taken, max_probes)?;
            debug!(from = alias, to = %fresh, target_arn, incoming_arn = arn, "alias clash");
            taken.insert(fresh.clone());
            plan.insert(
                alias,
                fresh,
                RenameReason::AliasClash {
                    target_arn: target_arn.to_string(),
                    incoming_arn: arn.to_string(),
                },
            );
        }
    }

    Ok(plan)
}

/// The alias that follows `alias` in the numbering sequence.
///
/// An alias ending in `-<digits>` has its number incremented (`ds-9` becomes
/// `ds-10`); any other alias gets `-1` appended. Leading zeros keep the
/// suffix at its original width (`ds-07` becomes `ds-08`) until the number
/// outgrows it.
///
/// ```
/// use defmerge_merge::reconcile::next_alias;
///
/// assert_eq!(next_alias("orders"), "orders-1");
/// assert_eq!(next_alias("orders-1"), "orders-2");
/// assert_eq!(next_alias("orders-9"), "orders-10");
/// assert_eq!(next_alias("orders-07"), "orders-08");
/// ```
pub fn next_alias(alias: &str) -> String {
    if let Some((stem, digits)) = alias.rsplit_once('-') {
        if !stem.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Some(next) = digits.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
                return format!("{stem}-{next:0width$}", width = digits.len());
            }
        }
    }
    format!("{alias}-1")
}

fn fresh_alias(alias: &str, taken: &BTreeSet<String>, max_probes: usize) -> MergeResult<String> {
    let attempts = max_probes.max(1);
    let mut candidate = next_alias(alias);
    for _ in 0..attempts {
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        candidate = next_alias(&candidate);
    }
    Err(MergeError::UnresolvableAliasCollision {
        alias: alias.to_string(),
        attempts,
    })
}
