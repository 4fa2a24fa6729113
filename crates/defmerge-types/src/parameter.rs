use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// A named parameter declaration.
///
/// In the store's JSON a declaration is a single-key object whose key names
/// the parameter kind and whose value holds the kind-specific fields:
///
/// ```json
/// { "StringParameterDeclaration": { "Name": "Region", "ParameterValueType": "SINGLE_VALUED" } }
/// ```
///
/// A declaration is identified by `(kind, name)`; two declarations are
/// identical only if every field matches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ParameterDeclaration {
    kind: String,
    body: Map<String, Value>,
}

impl ParameterDeclaration {
    /// Build a declaration of `kind` from its body. The body must carry a
    /// string `Name`.
    pub fn new(kind: impl Into<String>, body: Map<String, Value>) -> Result<Self, TypeError> {
        let kind = kind.into();
        match body.get("Name") {
            Some(Value::String(name)) if !name.is_empty() => Ok(Self { kind, body }),
            Some(_) => Err(TypeError::MalformedParameter(format!(
                "{kind}: Name must be a non-empty string"
            ))),
            None => Err(TypeError::MalformedParameter(format!("{kind}: missing Name"))),
        }
    }

    /// The declaration kind, e.g. `StringParameterDeclaration`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The parameter name.
    pub fn name(&self) -> &str {
        self.body
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.body
    }
}

impl TryFrom<Map<String, Value>> for ParameterDeclaration {
    type Error = TypeError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(TypeError::MalformedParameter(format!(
                "expected exactly one kind key, found {}",
                map.len()
            )));
        }
        let Some((kind, body)) = map.into_iter().next() else {
            return Err(TypeError::MalformedParameter("empty declaration".into()));
        };
        match body {
            Value::Object(body) => Self::new(kind, body),
            other => Err(TypeError::MalformedParameter(format!(
                "{kind}: expected an object, found {other}"
            ))),
        }
    }
}

impl From<ParameterDeclaration> for Map<String, Value> {
    fn from(decl: ParameterDeclaration) -> Self {
        let mut map = Map::new();
        map.insert(decl.kind, Value::Object(decl.body));
        map
    }
}
