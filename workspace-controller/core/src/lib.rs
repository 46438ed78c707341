#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Scheduling-independent pieces of the workspace controller: the access
//! tiers, the identities derived from a workspace name, the pass state
//! machine and the leveling policy that re-triggers passes.

mod identity;
pub mod leveling;
pub mod pass;
mod tier;

pub use self::{
    identity::{quota_name, validate_name, InvalidName, NAME_MAX_LEN},
    leveling::Leveling,
    pass::{Observation, Outcome, Step, Transition},
    tier::Tier,
};

pub const WORKSPACE_CONTROLLER_NAME: &str = "workspace-controller";
