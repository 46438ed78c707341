//! The boundary between the engine and the cluster.

use crate::ResourceId;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use workspace_controller_core::WORKSPACE_CONTROLLER_NAME;
use workspace_controller_k8s_api::{
    self as k8s, Api, Client, Namespace, PostParams, Resource, ResourceExt, ResourceQuota, Role,
    RoleBinding, Workspace,
};

/// A kind of object the engine reads or writes.
pub trait Object:
    Resource<DynamicType = ()>
    + Clone
    + fmt::Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Returns an API handle scoped to `namespace`, ignored for cluster-scoped
    /// kinds.
    fn api(client: Client, namespace: Option<&str>) -> Api<Self>;
}

/// Generic get/create/update over cluster objects.
///
/// Implementations return the object as persisted, so callers may keep
/// writing it within a pass.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get<K: Object>(&self, id: &ResourceId) -> Result<K, StoreError>;

    async fn create<K: Object>(&self, obj: &K) -> Result<K, StoreError>;

    /// Replaces the object. Fails with [`StoreError::Conflict`] when the
    /// object changed since it was read.
    async fn update<K: Object>(&self, obj: &K) -> Result<K, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    /// The write carried a stale resource version.
    #[error("conflict")]
    Conflict,

    #[error(transparent)]
    Kube(kube::Error),
}

/// A [`Store`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    params: PostParams,
}

// === impl Object ===

impl Object for Workspace {
    fn api(client: Client, _: Option<&str>) -> Api<Self> {
        Api::all(client)
    }
}

impl Object for Namespace {
    fn api(client: Client, _: Option<&str>) -> Api<Self> {
        Api::all(client)
    }
}

macro_rules! namespaced_object {
    ($($kind:ty),+) => {
        $(
            impl Object for $kind {
                fn api(client: Client, namespace: Option<&str>) -> Api<Self> {
                    match namespace {
                        Some(ns) => Api::namespaced(client, ns),
                        None => Api::default_namespaced(client),
                    }
                }
            }
        )+
    };
}

namespaced_object!(ResourceQuota, Role, RoleBinding);

// === impl StoreError ===

impl From<k8s::Error> for StoreError {
    fn from(error: k8s::Error) -> Self {
        match error {
            k8s::Error::Api(rsp) if rsp.code == 404 => Self::NotFound,
            k8s::Error::Api(rsp) if rsp.code == 409 && rsp.reason == "AlreadyExists" => {
                Self::AlreadyExists
            }
            k8s::Error::Api(rsp) if rsp.code == 409 => Self::Conflict,
            error => Self::Kube(error),
        }
    }
}

// === impl KubeStore ===

impl KubeStore {
    pub fn new(client: Client) -> Self {
        let params = PostParams {
            field_manager: Some(WORKSPACE_CONTROLLER_NAME.to_string()),
            ..Default::default()
        };
        Self { client, params }
    }
}

#[async_trait]
impl Store for KubeStore {
    async fn get<K: Object>(&self, id: &ResourceId) -> Result<K, StoreError> {
        let api = K::api(self.client.clone(), id.namespace.as_deref());
        Ok(api.get(&id.name).await?)
    }

    async fn create<K: Object>(&self, obj: &K) -> Result<K, StoreError> {
        let api = K::api(self.client.clone(), obj.meta().namespace.as_deref());
        Ok(api.create(&self.params, obj).await?)
    }

    async fn update<K: Object>(&self, obj: &K) -> Result<K, StoreError> {
        let api = K::api(self.client.clone(), obj.meta().namespace.as_deref());
        Ok(api.replace(&obj.name_any(), &self.params, obj).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> k8s::Error {
        k8s::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} ({code})"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn classifies_api_errors() {
        assert!(matches!(
            StoreError::from(api_error(404, "NotFound")),
            StoreError::NotFound
        ));
        assert!(matches!(
            StoreError::from(api_error(409, "AlreadyExists")),
            StoreError::AlreadyExists
        ));
        assert!(matches!(
            StoreError::from(api_error(409, "Conflict")),
            StoreError::Conflict
        ));
        assert!(matches!(
            StoreError::from(api_error(500, "InternalError")),
            StoreError::Kube(_)
        ));
        assert!(matches!(
            StoreError::from(k8s::Error::Service("connection refused".into())),
            StoreError::Kube(_)
        ));
    }
}
