//! Collection-by-collection merge of one definition into another.
//!
//! [`merge_definitions`] is the pure core shared by create- and
//! update-merges. It owns its working copy of the target, so a conflict in
//! any pass simply drops the half-merged copy: nothing escapes a failed merge.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use defmerge_types::{
    CalculatedField, DataSetReference, Definition, LogicalKey, ParameterDeclaration,
};

use crate::config::MergeConfig;
use crate::error::{DocumentRole, MergeError, MergeResult};
use crate::reconcile::{reconcile, RenamePlan};
use crate::rewrite::AliasRewrite;

/// Items appended to and skipped from one target collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub appended: usize,
    pub skipped: usize,
}

impl CollectionReport {
    fn append(&mut self) {
        self.appended += 1;
    }

    fn skip(&mut self) {
        self.skipped += 1;
    }
}

/// What a merge did, collection by collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub plan: RenamePlan,
    /// Alias occurrences rewritten in the incoming document.
    pub aliases_rewritten: usize,
    pub data_sets: CollectionReport,
    pub parameters: CollectionReport,
    pub sheets: CollectionReport,
    pub filter_groups: CollectionReport,
    pub calculated_fields: CollectionReport,
    pub column_configurations: CollectionReport,
}

impl MergeReport {
    /// Total number of items appended to the target.
    pub fn total_appended(&self) -> usize {
        self.data_sets.appended
            + self.parameters.appended
            + self.sheets.appended
            + self.filter_groups.appended
            + self.calculated_fields.appended
            + self.column_configurations.appended
    }
}

/// A successfully merged definition and the report describing it.
#[derive(Clone, Debug, PartialEq)]
pub struct Merged {
    pub definition: Definition,
    pub report: MergeReport,
}

/// The target a create-merge starts from: an empty shell with the configured
/// canvas, holding verbatim copies of every collection of `first`.
pub fn seed_target(first: &Definition, config: &MergeConfig) -> Definition {
    let mut target = Definition::with_defaults(config.canvas.to_analysis_defaults());
    target.data_set_identifier_declarations = first.data_set_identifier_declarations.clone();
    target.parameter_declarations = first.parameter_declarations.clone();
    target.sheets = first.sheets.clone();
    target.filter_groups = first.filter_groups.clone();
    target.calculated_fields = first.calculated_fields.clone();
    target.column_configurations = first.column_configurations.clone();
    target
}

/// Merge `incoming` into `target`.
///
/// Incoming aliases are reconciled against the target's datasets and
/// rewritten before any collection is compared, so every duplicate check
/// sees post-rewrite aliases. The target's own aliases, defaults and
/// unmodelled keys are never changed.
pub fn merge_definitions(
    mut target: Definition,
    mut incoming: Definition,
    config: &MergeConfig,
) -> MergeResult<Merged> {
    target
        .validate_references()
        .map_err(|source| MergeError::InvalidDocument {
            role: DocumentRole::Target,
            source,
        })?;
    incoming
        .validate_references()
        .map_err(|source| MergeError::InvalidDocument {
            role: DocumentRole::Incoming,
            source,
        })?;

    let plan = reconcile(
        &target.data_set_identifier_declarations,
        &incoming.data_set_identifier_declarations,
        config.max_alias_probes,
    )?;
    let aliases_rewritten = incoming.rewrite_aliases(&plan);
    debug!(renames = plan.len(), aliases_rewritten, "incoming aliases rewritten");

    let mut report = MergeReport {
        plan,
        aliases_rewritten,
        ..Default::default()
    };

    merge_parameters(
        &mut target.parameter_declarations,
        incoming.parameter_declarations,
        &mut report.parameters,
    )?;
    merge_data_sets(
        &mut target.data_set_identifier_declarations,
        incoming.data_set_identifier_declarations,
        &mut report.data_sets,
    );
    merge_trees(
        &mut target.sheets,
        incoming.sheets,
        &config.volatile_keys,
        &mut report.sheets,
    );
    merge_trees(
        &mut target.filter_groups,
        incoming.filter_groups,
        &config.volatile_keys,
        &mut report.filter_groups,
    );
    merge_calculated_fields(
        &mut target.calculated_fields,
        incoming.calculated_fields,
        &mut report.calculated_fields,
    )?;
    merge_trees(
        &mut target.column_configurations,
        incoming.column_configurations,
        &config.volatile_keys,
        &mut report.column_configurations,
    );

    target
        .validate_references()
        .map_err(|source| MergeError::InvalidDocument {
            role: DocumentRole::Merged,
            source,
        })?;

    debug!(
        data_sets = ?report.data_sets,
        parameters = ?report.parameters,
        sheets = ?report.sheets,
        filter_groups = ?report.filter_groups,
        calculated_fields = ?report.calculated_fields,
        column_configurations = ?report.column_configurations,
        "collections merged"
    );

    Ok(Merged {
        definition: target,
        report,
    })
}

/// Identical declarations are tolerated; a name reused for different
/// content is a conflict.
fn merge_parameters(
    target: &mut Vec<ParameterDeclaration>,
    incoming: Vec<ParameterDeclaration>,
    report: &mut CollectionReport,
) -> MergeResult<()> {
    let mut names: BTreeSet<String> = target.iter().map(|p| p.name().to_string()).collect();
    for param in incoming {
        if target.contains(&param) {
            report.skip();
        } else if names.contains(param.name()) {
            warn!(name = param.name(), kind = param.kind(), "conflicting parameter declarations");
            return Err(MergeError::DuplicateParameterName {
                name: param.name().to_string(),
            });
        } else {
            names.insert(param.name().to_string());
            target.push(param);
            report.append();
        }
    }
    Ok(())
}

/// After rewriting, an incoming dataset the target already declares carries
/// the target's alias; only genuinely new declarations are appended.
fn merge_data_sets(
    target: &mut Vec<DataSetReference>,
    incoming: Vec<DataSetReference>,
    report: &mut CollectionReport,
) {
    for ds in incoming {
        let present = target
            .iter()
            .any(|t| t.identifier == ds.identifier && t.data_set_arn == ds.data_set_arn);
        if present {
            report.skip();
        } else {
            target.push(ds);
            report.append();
        }
    }
}

/// Append every tree not already structurally present.
fn merge_trees(
    target: &mut Vec<Value>,
    incoming: Vec<Value>,
    volatile_keys: &[String],
    report: &mut CollectionReport,
) {
    for tree in incoming {
        if target
            .iter()
            .any(|existing| structurally_equal(existing, &tree, volatile_keys))
        {
            report.skip();
        } else {
            target.push(tree);
            report.append();
        }
    }
}

/// Calculated fields are keyed by `Name->DataSetIdentifier`, taken after
/// rewriting.
fn merge_calculated_fields(
    target: &mut Vec<CalculatedField>,
    incoming: Vec<CalculatedField>,
    report: &mut CollectionReport,
) -> MergeResult<()> {
    let mut keys: HashMap<LogicalKey, usize> = target
        .iter()
        .enumerate()
        .map(|(i, f)| (f.logical_key(), i))
        .collect();
    for field in incoming {
        let key = field.logical_key();
        match keys.get(&key).copied() {
            Some(i) if target[i] == field => report.skip(),
            Some(_) => {
                warn!(key = %key, "conflicting calculated fields");
                return Err(MergeError::DuplicateCalculatedFieldName {
                    name: key.name,
                    data_set_identifier: key.data_set_identifier,
                });
            }
            None => {
                keys.insert(key, target.len());
                target.push(field);
                report.append();
            }
        }
    }
    Ok(())
}

/// Whole-tree equality, ignoring any object key listed in `ignored`.
pub fn structurally_equal(a: &Value, b: &Value, ignored: &[String]) -> bool {
    if ignored.is_empty() {
        return a == b;
    }
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            let keep = |k: &&String| !ignored.contains(k);
            let a_keys: BTreeSet<&String> = a.keys().filter(keep).collect();
            let b_keys: BTreeSet<&String> = b.keys().filter(keep).collect();
            a_keys == b_keys
                && a_keys
                    .iter()
                    .all(|k| structurally_equal(&a[k.as_str()], &b[k.as_str()], ignored))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| structurally_equal(x, y, ignored))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defmerge_types::TypeError;
    use serde_json::json;

    fn definition(value: Value) -> Definition {
        serde_json::from_value(value).unwrap()
    }

    fn config() -> MergeConfig {
        MergeConfig::default()
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    #[test]
    fn seed_copies_collections_and_applies_canvas() {
        let first = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "a", "DataSetArn": "A" }],
            "Sheets": [{ "SheetId": "s1" }],
            "AnalysisDefaults": { "Custom": true },
            "Options": { "Timezone": "UTC" }
        }));
        let seeded = seed_target(&first, &config());
        assert_eq!(seeded.data_set_identifier_declarations, first.data_set_identifier_declarations);
        assert_eq!(seeded.sheets, first.sheets);
        assert_eq!(
            seeded.analysis_defaults,
            Some(config().canvas.to_analysis_defaults())
        );
        assert!(seeded.extra.is_empty());
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    #[test]
    fn identical_parameters_are_skipped() {
        let target = definition(json!({
            "ParameterDeclarations": [{ "StringParameterDeclaration": { "Name": "Region" } }]
        }));
        let merged = merge_definitions(target.clone(), target, &config()).unwrap();
        assert_eq!(merged.definition.parameter_declarations.len(), 1);
        assert_eq!(merged.report.parameters, CollectionReport { appended: 0, skipped: 1 });
    }

    #[test]
    fn conflicting_parameter_is_rejected() {
        let target = definition(json!({
            "ParameterDeclarations": [{ "StringParameterDeclaration": {
                "Name": "Region", "DefaultValues": { "StaticValues": ["EU"] } } }]
        }));
        let incoming = definition(json!({
            "ParameterDeclarations": [{ "StringParameterDeclaration": {
                "Name": "Region", "DefaultValues": { "StaticValues": ["US"] } } }]
        }));
        let err = merge_definitions(target, incoming, &config()).unwrap_err();
        assert!(matches!(err, MergeError::DuplicateParameterName { ref name } if name == "Region"));
        assert!(err.to_string().contains("Parameter: Region exists in both the analyses"));
    }

    #[test]
    fn same_name_different_kind_conflicts() {
        let target = definition(json!({
            "ParameterDeclarations": [{ "StringParameterDeclaration": { "Name": "Limit" } }]
        }));
        let incoming = definition(json!({
            "ParameterDeclarations": [{ "IntegerParameterDeclaration": { "Name": "Limit" } }]
        }));
        assert!(matches!(
            merge_definitions(target, incoming, &config()),
            Err(MergeError::DuplicateParameterName { .. })
        ));
    }

    #[test]
    fn new_parameters_are_appended_in_order() {
        let target = definition(json!({
            "ParameterDeclarations": [{ "StringParameterDeclaration": { "Name": "A" } }]
        }));
        let incoming = definition(json!({
            "ParameterDeclarations": [
                { "StringParameterDeclaration": { "Name": "B" } },
                { "DateTimeParameterDeclaration": { "Name": "C" } }
            ]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        let names: Vec<_> = merged
            .definition
            .parameter_declarations
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    // -----------------------------------------------------------------------
    // Datasets
    // -----------------------------------------------------------------------

    #[test]
    fn alias_clash_adds_renamed_dataset() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "A" }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "B" }],
            "Sheets": [{ "Visuals": [{ "Column": { "DataSetIdentifier": "ds1" } }] }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        let def = merged.definition;
        assert_eq!(def.arn_for_alias("ds1"), Some("A"));
        assert_eq!(def.arn_for_alias("ds1-1"), Some("B"));
        assert_eq!(def.sheets[0]["Visuals"][0]["Column"]["DataSetIdentifier"], "ds1-1");
        assert_eq!(merged.report.data_sets.appended, 1);
    }

    #[test]
    fn shared_dataset_keeps_target_alias() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "x", "DataSetArn": "R" }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "y", "DataSetArn": "R" }],
            "FilterGroups": [{ "FilterGroupId": "f1", "Filters": [{ "Column": { "DataSetIdentifier": "y" } }] }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        let def = merged.definition;
        assert_eq!(def.data_set_identifier_declarations.len(), 1);
        assert_eq!(def.alias_for_arn("R"), Some("x"));
        assert_eq!(def.filter_groups[0]["Filters"][0]["Column"]["DataSetIdentifier"], "x");
        assert_eq!(merged.report.data_sets, CollectionReport { appended: 0, skipped: 1 });
    }

    #[test]
    fn invalid_incoming_document_is_rejected() {
        let target = Definition::default();
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [
                { "Identifier": "a", "DataSetArn": "A" },
                { "Identifier": "a", "DataSetArn": "B" }
            ]
        }));
        assert!(matches!(
            merge_definitions(target, incoming, &config()),
            Err(MergeError::InvalidDocument { role: DocumentRole::Incoming, .. })
        ));
    }

    #[test]
    fn dangling_incoming_alias_is_rejected() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "A" }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "A" }],
            "Sheets": [{ "SheetId": "s1", "Column": { "DataSetIdentifier": "ghost" } }],
            "CalculatedFields": [{ "DataSetIdentifier": "ghost", "Name": "T", "Expression": "1" }]
        }));
        let err = merge_definitions(target, incoming, &config()).unwrap_err();
        match err {
            MergeError::InvalidDocument {
                role: DocumentRole::Incoming,
                source: TypeError::UnknownAlias { alias },
            } => assert_eq!(alias, "ghost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dangling_target_alias_is_rejected() {
        let target = definition(json!({
            "FilterGroups": [{ "FilterGroupId": "f1", "Column": { "DataSetIdentifier": "gone" } }]
        }));
        assert!(matches!(
            merge_definitions(target, Definition::default(), &config()),
            Err(MergeError::InvalidDocument { role: DocumentRole::Target, .. })
        ));
    }

    #[test]
    fn merged_references_all_resolve() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [
                { "Identifier": "ds1", "DataSetArn": "A" },
                { "Identifier": "x", "DataSetArn": "R" }
            ],
            "Sheets": [{ "SheetId": "s1", "Column": { "DataSetIdentifier": "ds1" } }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [
                { "Identifier": "ds1", "DataSetArn": "B" },
                { "Identifier": "y", "DataSetArn": "R" }
            ],
            "Sheets": [{ "SheetId": "s2", "Columns": [
                { "DataSetIdentifier": "ds1" },
                { "DataSetIdentifier": "y" }
            ] }],
            "CalculatedFields": [{ "DataSetIdentifier": "y", "Name": "T", "Expression": "1" }],
            "ColumnConfigurations": [{ "Column": { "DataSetIdentifier": "ds1", "ColumnName": "c" } }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap().definition;
        let declared = merged.aliases();
        let used = merged.referenced_aliases();
        assert!(used.is_subset(&declared), "{used:?} not within {declared:?}");
        assert_eq!(used.into_iter().collect::<Vec<_>>(), ["ds1", "ds1-1", "x"]);
        assert!(merged.validate_references().is_ok());
    }

    // -----------------------------------------------------------------------
    // Trees
    // -----------------------------------------------------------------------

    #[test]
    fn structural_duplicates_are_skipped() {
        let target = definition(json!({
            "Sheets": [{ "SheetId": "s1", "Name": "Overview" }]
        }));
        let incoming = definition(json!({
            "Sheets": [
                { "Name": "Overview", "SheetId": "s1" },
                { "SheetId": "s2", "Name": "Detail" }
            ]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        assert_eq!(merged.definition.sheets.len(), 2);
        assert_eq!(merged.definition.sheets[1]["SheetId"], "s2");
        assert_eq!(merged.report.sheets, CollectionReport { appended: 1, skipped: 1 });
    }

    #[test]
    fn near_duplicates_are_kept_unless_key_is_volatile() {
        let target = definition(json!({
            "FilterGroups": [{ "FilterGroupId": "f1", "Version": 1 }]
        }));
        let incoming = definition(json!({
            "FilterGroups": [{ "FilterGroupId": "f1", "Version": 2 }]
        }));

        let merged = merge_definitions(target.clone(), incoming.clone(), &config()).unwrap();
        assert_eq!(merged.definition.filter_groups.len(), 2);

        let cfg = MergeConfig {
            volatile_keys: vec!["Version".into()],
            ..config()
        };
        let merged = merge_definitions(target, incoming, &cfg).unwrap();
        assert_eq!(merged.definition.filter_groups.len(), 1);
    }

    #[test]
    fn structural_equality_ignores_nested_volatile_keys() {
        let ignored = vec!["Stamp".to_string()];
        let a = json!({ "A": [{ "B": 1, "Stamp": "x" }], "Stamp": 1 });
        let b = json!({ "A": [{ "B": 1, "Stamp": "y" }] });
        let c = json!({ "A": [{ "B": 2 }] });
        assert!(structurally_equal(&a, &b, &ignored));
        assert!(!structurally_equal(&a, &c, &ignored));
        assert!(!structurally_equal(&a, &b, &[]));
    }

    #[test]
    fn column_configurations_follow_renames() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "A" }],
            "ColumnConfigurations": [{ "Column": { "DataSetIdentifier": "ds1", "ColumnName": "amount" } }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "B" }],
            "ColumnConfigurations": [{ "Column": { "DataSetIdentifier": "ds1", "ColumnName": "amount" } }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        let cols = &merged.definition.column_configurations;
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[1]["Column"]["DataSetIdentifier"], "ds1-1");
    }

    // -----------------------------------------------------------------------
    // Calculated fields
    // -----------------------------------------------------------------------

    #[test]
    fn calculated_field_key_uses_rewritten_alias() {
        // Target has "Total" on ds1 (dataset A).
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [
                { "Identifier": "ds1", "DataSetArn": "A" }
            ],
            "CalculatedFields": [
                { "DataSetIdentifier": "ds1", "Name": "Total", "Expression": "sum({a})" }
            ]
        }));
        // Incoming "Total" lives on a different dataset also aliased ds1.
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "B" }],
            "CalculatedFields": [
                { "DataSetIdentifier": "ds1", "Name": "Total", "Expression": "sum({b})" }
            ]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        let keys: Vec<_> = merged
            .definition
            .calculated_fields
            .iter()
            .map(|f| f.logical_key().to_string())
            .collect();
        assert_eq!(keys, ["Total->ds1", "Total->ds1-1"]);
    }

    #[test]
    fn conflicting_calculated_field_is_rejected() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "x", "DataSetArn": "R" }],
            "CalculatedFields": [{ "DataSetIdentifier": "x", "Name": "Total", "Expression": "sum({a})" }]
        }));
        // Same dataset under alias y: after rewrite the key becomes Total->x.
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "y", "DataSetArn": "R" }],
            "CalculatedFields": [{ "DataSetIdentifier": "y", "Name": "Total", "Expression": "avg({a})" }]
        }));
        let err = merge_definitions(target, incoming, &config()).unwrap_err();
        match err {
            MergeError::DuplicateCalculatedFieldName {
                name,
                data_set_identifier,
            } => {
                assert_eq!(name, "Total");
                assert_eq!(data_set_identifier, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn identical_calculated_field_after_rewrite_is_skipped() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "x", "DataSetArn": "R" }],
            "CalculatedFields": [{ "DataSetIdentifier": "x", "Name": "Total", "Expression": "sum({a})" }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "y", "DataSetArn": "R" }],
            "CalculatedFields": [{ "DataSetIdentifier": "y", "Name": "Total", "Expression": "sum({a})" }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        assert_eq!(merged.definition.calculated_fields.len(), 1);
        assert_eq!(merged.report.calculated_fields.skipped, 1);
    }

    #[test]
    fn calculated_fields_merge_without_any_renames() {
        let target = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "x", "DataSetArn": "R" }]
        }));
        let incoming = definition(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "x", "DataSetArn": "R" }],
            "CalculatedFields": [{ "DataSetIdentifier": "x", "Name": "Margin", "Expression": "{p}-{c}" }]
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        assert_eq!(merged.definition.calculated_fields.len(), 1);
        assert!(merged.report.plan.is_empty());
    }

    #[test]
    fn target_extras_and_defaults_win() {
        let target = definition(json!({
            "AnalysisDefaults": { "Mine": true },
            "Options": { "WeekStart": "MONDAY" }
        }));
        let incoming = definition(json!({
            "AnalysisDefaults": { "Theirs": true },
            "Options": { "WeekStart": "SUNDAY" }
        }));
        let merged = merge_definitions(target, incoming, &config()).unwrap();
        assert_eq!(merged.definition.analysis_defaults, Some(json!({ "Mine": true })));
        assert_eq!(merged.definition.extra["Options"]["WeekStart"], "MONDAY");
    }
}
