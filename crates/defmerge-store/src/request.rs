use defmerge_types::{AnalysisDocument, AnalysisId, Definition, ResourcePermission};

/// Everything needed to create a new document.
#[derive(Clone, Debug, PartialEq)]
pub struct PublishRequest {
    pub id: AnalysisId,
    pub name: String,
    pub definition: Definition,
    pub theme_arn: Option<String>,
    pub permissions: Vec<ResourcePermission>,
}

/// Everything needed to replace an existing document in place.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    pub id: AnalysisId,
    pub name: String,
    pub definition: Definition,
    pub theme_arn: Option<String>,
}

impl PublishRequest {
    /// The document as it will be stored.
    pub fn to_document(&self) -> AnalysisDocument {
        AnalysisDocument {
            analysis_id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            definition: self.definition.clone(),
            theme_arn: self.theme_arn.clone(),
        }
    }
}

impl UpdateRequest {
    /// The document as it will be stored.
    pub fn to_document(&self) -> AnalysisDocument {
        AnalysisDocument {
            analysis_id: Some(self.id.clone()),
            name: Some(self.name.clone()),
            definition: self.definition.clone(),
            theme_arn: self.theme_arn.clone(),
        }
    }
}
