//! Document-level diff: what a merge would change in a stored document.
//!
//! Each top-level section of the definition (`Sheets`, `FilterGroups`, ...)
//! is compared as a whole, and the pretty-printed JSON of both documents is
//! diffed line by line.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use defmerge_types::AnalysisDocument;

use crate::error::{DiffError, DiffResult};
use crate::line_diff::{diff_lines, LineDiff};

/// The result of comparing two documents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentDiff {
    pub sections: Vec<SectionChange>,
    pub lines: LineDiff,
}

impl DocumentDiff {
    /// Returns `true` if the documents are identical.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.lines.is_empty()
    }
}

/// A change to one top-level section of a definition, or to one of the
/// document's own fields (`Name`, `ThemeArn`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum SectionChange {
    Added { key: String, items: Option<usize> },
    Removed { key: String, items: Option<usize> },
    Modified {
        key: String,
        old_items: Option<usize>,
        new_items: Option<usize>,
    },
}

impl SectionChange {
    pub fn key(&self) -> &str {
        match self {
            SectionChange::Added { key, .. }
            | SectionChange::Removed { key, .. }
            | SectionChange::Modified { key, .. } => key,
        }
    }
}

/// Compare `old` with `new`, keeping `context` unchanged lines around each
/// textual change.
pub fn diff_documents(
    old: &AnalysisDocument,
    new: &AnalysisDocument,
    context: usize,
) -> DiffResult<DocumentDiff> {
    let old_sections = sections(old)?;
    let new_sections = sections(new)?;
    let mut changes = Vec::new();

    for (key, old_val) in &old_sections {
        match new_sections.get(key) {
            Some(new_val) if new_val != old_val => changes.push(SectionChange::Modified {
                key: key.clone(),
                old_items: item_count(old_val),
                new_items: item_count(new_val),
            }),
            Some(_) => {}
            None => changes.push(SectionChange::Removed {
                key: key.clone(),
                items: item_count(old_val),
            }),
        }
    }
    for (key, new_val) in &new_sections {
        if !old_sections.contains_key(key) {
            changes.push(SectionChange::Added {
                key: key.clone(),
                items: item_count(new_val),
            });
        }
    }

    let old_text = serde_json::to_string_pretty(old)?;
    let new_text = serde_json::to_string_pretty(new)?;

    Ok(DocumentDiff {
        sections: changes,
        lines: diff_lines(&old_text, &new_text, context),
    })
}

/// Flatten a document into its top-level fields and definition sections.
/// Empty collections count as absent.
fn sections(doc: &AnalysisDocument) -> DiffResult<BTreeMap<String, Value>> {
    let mut out = BTreeMap::new();
    if let Some(name) = &doc.name {
        out.insert("Name".to_string(), Value::from(name.as_str()));
    }
    if let Some(theme) = &doc.theme_arn {
        out.insert("ThemeArn".to_string(), Value::from(theme.as_str()));
    }
    match serde_json::to_value(&doc.definition)? {
        Value::Object(map) => {
            for (key, value) in map {
                if !matches!(&value, Value::Array(items) if items.is_empty()) {
                    out.insert(format!("Definition.{key}"), value);
                }
            }
        }
        other => {
            return Err(DiffError::UnexpectedShape(format!(
                "definition serialized as {other}"
            )))
        }
    }
    Ok(out)
}

fn item_count(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}
