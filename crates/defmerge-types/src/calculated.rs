use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A derived field defined by an expression over one dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalculatedField {
    /// Alias of the owning dataset.
    pub data_set_identifier: String,
    pub name: String,
    pub expression: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalculatedField {
    pub fn new(
        data_set_identifier: impl Into<String>,
        name: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            data_set_identifier: data_set_identifier.into(),
            name: name.into(),
            expression: expression.into(),
            extra: Map::new(),
        }
    }

    /// The `(name, owning alias)` pair used for duplicate detection.
    ///
    /// The key reflects the field's current alias, so it must be taken after
    /// any alias rewriting has been applied.
    pub fn logical_key(&self) -> LogicalKey {
        LogicalKey {
            name: self.name.clone(),
            data_set_identifier: self.data_set_identifier.clone(),
        }
    }
}

/// Logical identity of a calculated field, rendered as `Name->Alias`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalKey {
    pub name: String,
    pub data_set_identifier: String,
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.name, self.data_set_identifier)
    }
}
