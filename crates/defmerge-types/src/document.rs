//! The definition document and its stored envelope.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::calculated::CalculatedField;
use crate::dataset::DataSetReference;
use crate::error::TypeError;
use crate::identity::AnalysisId;
use crate::parameter::ParameterDeclaration;
use crate::ALIAS_FIELD;

/// A stored analysis: identity, display name, definition and theme.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<AnalysisId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub definition: Definition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_arn: Option<String>,
}

impl AnalysisDocument {
    /// A document with no identity, wrapping `definition`.
    pub fn from_definition(definition: Definition) -> Self {
        Self {
            analysis_id: None,
            name: None,
            definition,
            theme_arn: None,
        }
    }
}

/// The mergeable body of an analysis.
///
/// Sheets, filter groups and column configurations are open-ended trees; the
/// engine only interprets their `DataSetIdentifier` fields. Every key not
/// modelled here is kept in `extra` and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Definition {
    #[serde(default)]
    pub data_set_identifier_declarations: Vec<DataSetReference>,
    #[serde(default)]
    pub sheets: Vec<Value>,
    #[serde(default)]
    pub calculated_fields: Vec<CalculatedField>,
    #[serde(default)]
    pub parameter_declarations: Vec<ParameterDeclaration>,
    #[serde(default)]
    pub filter_groups: Vec<Value>,
    #[serde(default)]
    pub column_configurations: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_defaults: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Definition {
    /// An empty definition carrying only the given analysis defaults.
    pub fn with_defaults(analysis_defaults: Value) -> Self {
        Self {
            analysis_defaults: Some(analysis_defaults),
            ..Default::default()
        }
    }

    /// The set of dataset aliases declared by this definition.
    pub fn aliases(&self) -> BTreeSet<&str> {
        self.data_set_identifier_declarations
            .iter()
            .map(|d| d.identifier.as_str())
            .collect()
    }

    /// Canonical reference declared under `alias`, if any.
    pub fn arn_for_alias(&self, alias: &str) -> Option<&str> {
        self.data_set_identifier_declarations
            .iter()
            .find(|d| d.identifier == alias)
            .map(|d| d.data_set_arn.as_str())
    }

    /// Alias under which `arn` is declared, if any.
    pub fn alias_for_arn(&self, arn: &str) -> Option<&str> {
        self.data_set_identifier_declarations
            .iter()
            .find(|d| d.data_set_arn == arn)
            .map(|d| d.identifier.as_str())
    }

    /// Every alias referenced from parameters, sheets, filter groups,
    /// calculated fields and column configurations.
    ///
    /// Trees are walked the same way alias rewriting walks them: nested
    /// objects and the object elements of arrays.
    pub fn referenced_aliases(&self) -> BTreeSet<&str> {
        let mut used = BTreeSet::new();
        for field in &self.calculated_fields {
            used.insert(field.data_set_identifier.as_str());
            collect_map(&field.extra, &mut used);
        }
        for param in &self.parameter_declarations {
            collect_map(param.body(), &mut used);
        }
        for tree in self
            .sheets
            .iter()
            .chain(&self.filter_groups)
            .chain(&self.column_configurations)
        {
            collect_value(tree, &mut used);
        }
        used
    }

    /// Check that every alias and every canonical reference is declared at
    /// most once, and that every referenced alias is declared.
    pub fn validate_references(&self) -> Result<(), TypeError> {
        let mut seen_aliases = BTreeSet::new();
        let mut seen_arns: BTreeMap<&str, &str> = BTreeMap::new();
        for ds in &self.data_set_identifier_declarations {
            if !seen_aliases.insert(ds.identifier.as_str()) {
                return Err(TypeError::DuplicateAlias {
                    alias: ds.identifier.clone(),
                });
            }
            let previous = seen_arns.insert(ds.data_set_arn.as_str(), ds.identifier.as_str());
            if let Some(first) = previous {
                return Err(TypeError::DuplicateDataSet {
                    arn: ds.data_set_arn.clone(),
                    first: first.to_string(),
                    second: ds.identifier.clone(),
                });
            }
        }

        let declared = self.aliases();
        if let Some(alias) = self
            .referenced_aliases()
            .into_iter()
            .find(|alias| !declared.contains(alias))
        {
            return Err(TypeError::UnknownAlias {
                alias: alias.to_string(),
            });
        }
        Ok(())
    }

    /// Returns `true` if every collection is empty.
    pub fn is_empty(&self) -> bool {
        self.data_set_identifier_declarations.is_empty()
            && self.sheets.is_empty()
            && self.calculated_fields.is_empty()
            && self.parameter_declarations.is_empty()
            && self.filter_groups.is_empty()
            && self.column_configurations.is_empty()
    }
}

fn collect_map<'a>(map: &'a Map<String, Value>, used: &mut BTreeSet<&'a str>) {
    for (key, value) in map {
        if key == ALIAS_FIELD {
            if let Value::String(alias) = value {
                used.insert(alias.as_str());
                continue;
            }
        }
        collect_value(value, used);
    }
}

fn collect_value<'a>(node: &'a Value, used: &mut BTreeSet<&'a str>) {
    match node {
        Value::Object(map) => collect_map(map, used),
        Value::Array(items) => {
            for item in items.iter().filter(|item| item.is_object()) {
                collect_value(item, used);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "AnalysisId": "sales",
            "Name": "Sales",
            "ThemeArn": "arn:aws:quicksight::aws:theme/MIDNIGHT",
            "Definition": {
                "DataSetIdentifierDeclarations": [
                    { "Identifier": "orders", "DataSetArn": "arn:ds/orders" }
                ],
                "Sheets": [
                    { "SheetId": "s1", "Name": "Overview", "Visuals": [] }
                ],
                "CalculatedFields": [
                    { "DataSetIdentifier": "orders", "Name": "Total", "Expression": "sum({amount})" }
                ],
                "ParameterDeclarations": [
                    { "StringParameterDeclaration": { "Name": "Region", "ParameterValueType": "SINGLE_VALUED" } }
                ],
                "FilterGroups": [],
                "Options": { "WeekStart": "MONDAY" }
            }
        })
    }

    #[test]
    fn round_trips_store_shape() {
        let raw = sample();
        let doc: AnalysisDocument = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(doc.analysis_id.as_ref().unwrap().as_str(), "sales");
        assert_eq!(doc.definition.sheets.len(), 1);
        assert_eq!(doc.definition.extra.get("Options"), Some(&json!({ "WeekStart": "MONDAY" })));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["Definition"]["Options"], raw["Definition"]["Options"]);
        assert_eq!(back["ThemeArn"], raw["ThemeArn"]);
        assert_eq!(
            back["Definition"]["ParameterDeclarations"],
            raw["Definition"]["ParameterDeclarations"]
        );
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let def: Definition = serde_json::from_value(json!({})).unwrap();
        assert!(def.is_empty());
        assert!(def.analysis_defaults.is_none());
    }

    #[test]
    fn alias_lookups() {
        let doc: AnalysisDocument = serde_json::from_value(sample()).unwrap();
        let def = &doc.definition;
        assert_eq!(def.arn_for_alias("orders"), Some("arn:ds/orders"));
        assert_eq!(def.alias_for_arn("arn:ds/orders"), Some("orders"));
        assert_eq!(def.arn_for_alias("missing"), None);
        assert!(def.aliases().contains("orders"));
    }

    #[test]
    fn validate_rejects_duplicate_alias() {
        let mut def = Definition::default();
        def.data_set_identifier_declarations = vec![
            DataSetReference::new("a", "arn:1"),
            DataSetReference::new("a", "arn:2"),
        ];
        assert_eq!(
            def.validate_references(),
            Err(TypeError::DuplicateAlias { alias: "a".into() })
        );
    }

    #[test]
    fn validate_rejects_dataset_under_two_aliases() {
        let mut def = Definition::default();
        def.data_set_identifier_declarations = vec![
            DataSetReference::new("a", "arn:1"),
            DataSetReference::new("b", "arn:1"),
        ];
        assert!(matches!(
            def.validate_references(),
            Err(TypeError::DuplicateDataSet { .. })
        ));
    }

    #[test]
    fn referenced_aliases_cover_every_collection() {
        let def: Definition = serde_json::from_value(json!({
            "Sheets": [{ "Visuals": [{ "Column": { "DataSetIdentifier": "s" } }] }],
            "FilterGroups": [{ "Filters": [{ "Column": { "DataSetIdentifier": "f" } }] }],
            "ColumnConfigurations": [{ "Column": { "DataSetIdentifier": "c", "ColumnName": "x" } }],
            "CalculatedFields": [{ "DataSetIdentifier": "k", "Name": "T", "Expression": "1" }],
            "ParameterDeclarations": [{ "StringParameterDeclaration": {
                "Name": "P",
                "DefaultValues": { "DynamicValue": {
                    "DefaultValueColumn": { "DataSetIdentifier": "p", "ColumnName": "x" } } }
            } }],
            "Options": { "DataSetIdentifier": "ignored" }
        }))
        .unwrap();
        let used: Vec<&str> = def.referenced_aliases().into_iter().collect();
        assert_eq!(used, ["c", "f", "k", "p", "s"]);
    }

    #[test]
    fn validate_rejects_undeclared_alias() {
        let def: Definition = serde_json::from_value(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "arn:1" }],
            "Sheets": [{ "Visuals": [{ "Column": { "DataSetIdentifier": "ds1" } }] }],
            "CalculatedFields": [{ "DataSetIdentifier": "ghost", "Name": "T", "Expression": "1" }]
        }))
        .unwrap();
        assert_eq!(
            def.validate_references(),
            Err(TypeError::UnknownAlias { alias: "ghost".into() })
        );
    }

    #[test]
    fn validate_rejects_undeclared_alias_deep_in_a_sheet() {
        let def: Definition = serde_json::from_value(json!({
            "DataSetIdentifierDeclarations": [{ "Identifier": "ds1", "DataSetArn": "arn:1" }],
            "Sheets": [{ "Visuals": [{ "BarChartVisual": { "FieldWells": { "Category": [
                { "Column": { "DataSetIdentifier": "ghost" } }
            ] } } }] }]
        }))
        .unwrap();
        assert!(matches!(
            def.validate_references(),
            Err(TypeError::UnknownAlias { ref alias }) if alias == "ghost"
        ));
    }

    #[test]
    fn validate_accepts_distinct_declarations() {
        let mut def = Definition::default();
        def.data_set_identifier_declarations = vec![
            DataSetReference::new("a", "arn:1"),
            DataSetReference::new("b", "arn:2"),
        ];
        assert!(def.validate_references().is_ok());
    }
}
