use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum length of an analysis identifier accepted by the store.
pub const MAX_ANALYSIS_ID_LEN: usize = 512;

/// Identifier of a stored analysis document.
///
/// Valid identifiers are non-empty, at most [`MAX_ANALYSIS_ID_LEN`]
/// characters, and consist only of ASCII letters, digits, `-` and `_`.
/// The restricted alphabet keeps identifiers safe to use as file names in
/// filesystem-backed stores.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnalysisId(String);

impl AnalysisId {
    /// Parse and validate an analysis identifier.
    ///
    /// ```
    /// use defmerge_types::AnalysisId;
    ///
    /// assert!(AnalysisId::parse("sales-2024_q1").is_ok());
    /// assert!(AnalysisId::parse("").is_err());
    /// assert!(AnalysisId::parse("../etc").is_err());
    /// ```
    pub fn parse(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidAnalysisId {
                id,
                reason: "must not be empty".into(),
            });
        }
        if id.len() > MAX_ANALYSIS_ID_LEN {
            return Err(TypeError::InvalidAnalysisId {
                reason: format!("longer than {MAX_ANALYSIS_ID_LEN} characters"),
                id,
            });
        }
        if let Some(ch) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(TypeError::InvalidAnalysisId {
                reason: format!("contains forbidden character: {ch:?}"),
                id,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AnalysisId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AnalysisId> for String {
    fn from(id: AnalysisId) -> Self {
        id.0
    }
}

impl std::str::FromStr for AnalysisId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisId({})", self.0)
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
