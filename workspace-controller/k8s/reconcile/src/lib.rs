#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Converges the namespace, quota, roles and bindings a `Workspace`
//! describes.

mod error;
mod metrics;
pub mod project;
mod reconciler;
mod resource_id;
pub mod store;


pub use self::{
    error::{Error, Op, Result},
    metrics::ReconcileMetrics,
    project::Projection,
    reconciler::Reconciler,
    resource_id::ResourceId,
    store::{KubeStore, Object, Store, StoreError},
};
