use crate::labels::Map;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes a namespace, its resource limits, and the users granted each
/// access tier within it.
#[derive(Clone, Debug, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "environment.tf.operator.com",
    version = "v1alpha1",
    kind = "Workspace",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    /// Names the namespace and prefixes every resource inside it.
    pub name: String,

    #[serde(default)]
    pub labels: Map,

    #[serde(default)]
    pub annotations: Map,

    pub resources: Resources,

    #[serde(default)]
    pub users: Users,
}

/// Quota hard limits, as Kubernetes quantity strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
}

/// A single subject per tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Users {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer: Option<String>,
}
