#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod labels;
pub mod quantity;
pub mod workspace;

pub use self::{
    quantity::ParsedQuantity,
    workspace::{Resources, Users, Workspace, WorkspaceSpec},
};
pub use k8s_openapi::{
    api::{
        self,
        core::v1::{Namespace, NamespaceSpec, ResourceQuota, ResourceQuotaSpec},
        rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject},
    },
    apimachinery::pkg::api::resource::Quantity,
};
pub use kube::{
    api::{Api, ObjectMeta, PostParams, Resource, ResourceExt},
    Client, Error,
};

pub const API_GROUP: &str = "environment.tf.operator.com";

/// Points a managed resource back at the workspace that produced it.
///
/// Nothing deletes resources based on it. A live object naming a different
/// workspace is never adopted.
pub const OWNER_ANNOTATION: &str = "environment.tf.operator.com/workspace";

pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Quota hard-limit keys, in the order they are corrected.
pub const QUOTA_CPU: &str = "cpu";
pub const QUOTA_MEMORY: &str = "memory";
pub const QUOTA_STORAGE: &str = "requests.storage";
