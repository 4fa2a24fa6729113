use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dataset declared by a definition: the canonical ARN paired with the
/// local alias that expressions and bindings use to refer to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetReference {
    /// Local alias, unique within one definition.
    pub identifier: String,
    /// Canonical reference, unique within one definition.
    pub data_set_arn: String,
    /// Keys the engine does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DataSetReference {
    pub fn new(identifier: impl Into<String>, data_set_arn: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            data_set_arn: data_set_arn.into(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_store_shape() {
        let raw = json!({
            "Identifier": "orders",
            "DataSetArn": "arn:aws:quicksight:us-east-1:111122223333:dataset/orders"
        });
        let ds: DataSetReference = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ds.identifier, "orders");
        assert!(ds.data_set_arn.ends_with("/orders"));
        assert_eq!(serde_json::to_value(&ds).unwrap(), raw);
    }

    #[test]
    fn unknown_keys_survive() {
        let raw = json!({
            "Identifier": "orders",
            "DataSetArn": "arn:x",
            "Comment": "kept"
        });
        let ds: DataSetReference = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ds.extra.get("Comment"), Some(&json!("kept")));
        assert_eq!(serde_json::to_value(&ds).unwrap(), raw);
    }
}
