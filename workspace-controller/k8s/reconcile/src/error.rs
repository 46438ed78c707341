use crate::{ResourceId, StoreError};
use std::fmt;
use workspace_controller_core::{InvalidName, Tier};
use workspace_controller_k8s_api::quantity::ParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fails a pass. Every error is retried on the next pass.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid workspace name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: InvalidName,
    },

    /// A quota limit in the workspace could not be parsed.
    #[error("invalid {resource} quantity {value:?}: {source}")]
    Quantity {
        resource: &'static str,
        value: String,
        #[source]
        source: ParseError,
    },

    /// Bindings hold a single subject; lists are rejected.
    #[error("{tier} user {name:?} must name exactly one subject")]
    InvalidSubject { tier: Tier, name: String },

    /// The object is annotated as belonging to a different workspace.
    #[error("{kind} {id} belongs to workspace {owner}")]
    Claimed {
        kind: String,
        id: ResourceId,
        owner: String,
    },

    #[error("failed to {op} {kind} {id}: {source}")]
    Store {
        op: Op,
        kind: String,
        id: ResourceId,
        #[source]
        source: StoreError,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Create,
    Update,
}

// === impl Op ===

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
