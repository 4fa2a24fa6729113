use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use defmerge_types::{AccessPrincipal, ResourcePermission, DEFAULT_ANALYSIS_ACTIONS};

/// Configuration for one merge engine.
///
/// Everything the engine needs about its surroundings is carried here
/// explicitly; nothing is read from the process environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Region embedded in the publishing principal's ARN.
    pub region: String,
    /// Account that owns published documents.
    pub account_id: String,
    /// Identity namespace of the publishing user.
    pub namespace: String,
    /// User granted access to newly published documents. No permissions are
    /// attached when this or `account_id` is empty.
    pub user_name: String,
    /// Actions granted to the publishing user.
    pub actions: Vec<String>,
    /// Canvas applied to the empty target of a create-merge.
    pub canvas: CanvasConfig,
    /// How many successive alias candidates to try when an incoming alias
    /// clashes with a different dataset.
    pub max_alias_probes: usize,
    /// Keys ignored when deciding whether a sheet, filter group or column
    /// configuration is already present in the target.
    pub volatile_keys: Vec<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            account_id: String::new(),
            namespace: "default".into(),
            user_name: String::new(),
            actions: DEFAULT_ANALYSIS_ACTIONS.iter().map(|a| a.to_string()).collect(),
            canvas: CanvasConfig::default(),
            max_alias_probes: 16,
            volatile_keys: Vec::new(),
        }
    }
}

impl MergeConfig {
    /// The user new documents are shared with, if one is configured.
    pub fn principal(&self) -> Option<AccessPrincipal> {
        if self.account_id.is_empty() || self.user_name.is_empty() {
            return None;
        }
        Some(AccessPrincipal {
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            namespace: self.namespace.clone(),
            user_name: self.user_name.clone(),
        })
    }

    /// Permissions attached to a newly published document.
    pub fn permissions(&self) -> Vec<ResourcePermission> {
        self.principal()
            .map(|p| vec![p.grant(self.actions.iter().cloned())])
            .unwrap_or_default()
    }
}

/// Default sheet canvas for a freshly created target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub resize_option: String,
    pub optimized_view_port_width: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            resize_option: "FIXED".into(),
            optimized_view_port_width: "1600px".into(),
        }
    }
}

impl CanvasConfig {
    /// Render as the definition's `AnalysisDefaults` tree.
    pub fn to_analysis_defaults(&self) -> Value {
        json!({
            "DefaultNewSheetConfiguration": {
                "InteractiveLayoutConfiguration": {
                    "Grid": {
                        "CanvasSizeOptions": {
                            "ScreenCanvasSizeOptions": {
                                "ResizeOption": self.resize_option,
                                "OptimizedViewPortWidth": self.optimized_view_port_width
                            }
                        }
                    }
                }
            }
        })
    }
}
