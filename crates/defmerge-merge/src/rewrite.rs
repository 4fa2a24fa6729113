//! Deep reference rewriting.
//!
//! Walks a JSON tree and substitutes dataset aliases at alias-bearing keys
//! according to a [`RenamePlan`]. Substitution is simultaneous: each value is
//! looked up in the plan once, so a plan holding both `y -> x` and `x -> x-1`
//! moves `y` to `x` without cascading on to `x-1`.

use serde_json::{Map, Value};

use defmerge_types::{
    CalculatedField, DataSetReference, Definition, ParameterDeclaration, ALIAS_FIELD,
};

use crate::reconcile::RenamePlan;

/// Replace every string value stored under `field` that the plan renames.
///
/// Descends into nested objects and into the object elements of arrays.
/// Scalars and arrays of scalars are left alone. Returns the number of
/// replacements made.
pub fn rewrite_value(node: &mut Value, field: &str, plan: &RenamePlan) -> usize {
    match node {
        Value::Object(map) => rewrite_map(map, field, plan),
        Value::Array(items) => items
            .iter_mut()
            .filter(|item| item.is_object())
            .map(|item| rewrite_value(item, field, plan))
            .sum(),
        _ => 0,
    }
}

/// [`rewrite_value`] over the entries of an object.
pub fn rewrite_map(map: &mut Map<String, Value>, field: &str, plan: &RenamePlan) -> usize {
    if plan.is_empty() {
        return 0;
    }
    let mut replaced = 0;
    for (key, value) in map.iter_mut() {
        if key == field {
            if let Value::String(alias) = value {
                if let Some(new_alias) = plan.get(alias) {
                    *alias = new_alias.to_string();
                    replaced += 1;
                }
                continue;
            }
        }
        if value.is_object() || value.is_array() {
            replaced += rewrite_value(value, field, plan);
        }
    }
    replaced
}

/// Types whose dataset aliases can be rewritten in place.
pub trait AliasRewrite {
    /// Apply `plan` and return the number of aliases replaced.
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize;
}

impl AliasRewrite for Value {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        rewrite_value(self, ALIAS_FIELD, plan)
    }
}

impl AliasRewrite for DataSetReference {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        match plan.get(&self.identifier) {
            Some(new_alias) => {
                self.identifier = new_alias.to_string();
                1
            }
            None => 0,
        }
    }
}

impl AliasRewrite for CalculatedField {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        let mut replaced = rewrite_map(&mut self.extra, ALIAS_FIELD, plan);
        if let Some(new_alias) = plan.get(&self.data_set_identifier) {
            self.data_set_identifier = new_alias.to_string();
            replaced += 1;
        }
        replaced
    }
}

impl AliasRewrite for ParameterDeclaration {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        rewrite_map(self.body_mut(), ALIAS_FIELD, plan)
    }
}

impl<T: AliasRewrite> AliasRewrite for [T] {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        self.iter_mut().map(|item| item.rewrite_aliases(plan)).sum()
    }
}

impl<T: AliasRewrite> AliasRewrite for Vec<T> {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        self.as_mut_slice().rewrite_aliases(plan)
    }
}

impl AliasRewrite for Definition {
    fn rewrite_aliases(&mut self, plan: &RenamePlan) -> usize {
        self.data_set_identifier_declarations.rewrite_aliases(plan)
            + self.parameter_declarations.rewrite_aliases(plan)
            + self.sheets.rewrite_aliases(plan)
            + self.filter_groups.rewrite_aliases(plan)
            + self.calculated_fields.rewrite_aliases(plan)
            + self.column_configurations.rewrite_aliases(plan)
    }
}
