use serde::{Deserialize, Serialize};

/// Actions granted to the publishing principal on a newly created analysis.
pub const DEFAULT_ANALYSIS_ACTIONS: &[&str] = &[
    "quicksight:RestoreAnalysis",
    "quicksight:UpdateAnalysisPermissions",
    "quicksight:DeleteAnalysis",
    "quicksight:QueryAnalysis",
    "quicksight:DescribeAnalysisPermissions",
    "quicksight:DescribeAnalysis",
    "quicksight:UpdateAnalysis",
];

/// The user a published document is shared with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPrincipal {
    pub region: String,
    pub account_id: String,
    pub namespace: String,
    pub user_name: String,
}

impl AccessPrincipal {
    /// Render the principal as a user ARN.
    pub fn to_arn(&self) -> String {
        format!(
            "arn:aws:quicksight:{}:{}:user/{}/{}",
            self.region, self.account_id, self.namespace, self.user_name
        )
    }

    /// A permission granting `actions` to this principal.
    pub fn grant<I, S>(&self, actions: I) -> ResourcePermission
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResourcePermission {
            principal: self.to_arn(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

/// A grant attached to a document when it is published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourcePermission {
    pub principal: String,
    pub actions: Vec<String>,
}
