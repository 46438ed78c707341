//! The reconciliation pass as an explicit state machine.
//!
//! A pass walks the managed resources in dependency order. Each step is
//! observed by the engine (which may create the resource) and the
//! observation decides whether the pass continues to the next step or
//! finishes. The first resource found missing ends the pass once it has been
//! created; drift is corrected only when nothing was missing.

use crate::Tier;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    EnsureNamespace,
    EnsureQuota,
    EnsureRole(Tier),
    EnsureBinding(Tier),
    CorrectDrift,
}

/// What the engine saw (or did) while evaluating a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Observation {
    /// The resource already existed.
    Present,
    /// The resource was missing and has been created.
    Created,
    /// Drift correction finished after issuing this many writes.
    Corrected { updates: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Continue(Step),
    Finish(Outcome),
}

/// The result of a successful pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The workspace does not exist; nothing was done.
    Absent,
    /// The pass stopped after creating the resource for this step.
    Created(Step),
    /// Every resource exists and drift correction completed.
    Converged { updates: usize },
}

// === impl Step ===

impl Step {
    pub const FIRST: Step = Step::EnsureNamespace;

    /// The step evaluated after this one when nothing was missing.
    pub fn successor(self) -> Option<Step> {
        let next = match self {
            Self::EnsureNamespace => Self::EnsureQuota,
            Self::EnsureQuota => Self::EnsureRole(Tier::Admin),
            Self::EnsureRole(Tier::Admin) => Self::EnsureRole(Tier::Editor),
            Self::EnsureRole(Tier::Editor) => Self::EnsureRole(Tier::Viewer),
            Self::EnsureRole(Tier::Viewer) => Self::EnsureBinding(Tier::Admin),
            Self::EnsureBinding(Tier::Admin) => Self::EnsureBinding(Tier::Editor),
            Self::EnsureBinding(Tier::Editor) => Self::EnsureBinding(Tier::Viewer),
            Self::EnsureBinding(Tier::Viewer) => Self::CorrectDrift,
            Self::CorrectDrift => return None,
        };
        Some(next)
    }

    pub fn transition(self, observation: Observation) -> Transition {
        match observation {
            Observation::Created => Transition::Finish(Outcome::Created(self)),
            Observation::Corrected { updates } => {
                Transition::Finish(Outcome::Converged { updates })
            }
            Observation::Present => match self.successor() {
                Some(next) => Transition::Continue(next),
                None => Transition::Finish(Outcome::Converged { updates: 0 }),
            },
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnsureNamespace => f.write_str("namespace"),
            Self::EnsureQuota => f.write_str("quota"),
            Self::EnsureRole(tier) => write!(f, "{tier} role"),
            Self::EnsureBinding(tier) => write!(f, "{tier} rolebinding"),
            Self::CorrectDrift => f.write_str("drift"),
        }
    }
}

// === impl Outcome ===

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Created(_) => "created",
            Self::Converged { .. } => "converged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps() -> Vec<Step> {
        std::iter::successors(Some(Step::FIRST), |s| s.successor()).collect()
    }

    #[test]
    fn dependency_order() {
        assert_eq!(
            steps(),
            vec![
                Step::EnsureNamespace,
                Step::EnsureQuota,
                Step::EnsureRole(Tier::Admin),
                Step::EnsureRole(Tier::Editor),
                Step::EnsureRole(Tier::Viewer),
                Step::EnsureBinding(Tier::Admin),
                Step::EnsureBinding(Tier::Editor),
                Step::EnsureBinding(Tier::Viewer),
                Step::CorrectDrift,
            ]
        );
    }

    #[test]
    fn creation_ends_the_pass() {
        for step in steps() {
            assert_eq!(
                step.transition(Observation::Created),
                Transition::Finish(Outcome::Created(step)),
                "{step}"
            );
        }
    }

    #[test]
    fn presence_advances() {
        assert_eq!(
            Step::EnsureQuota.transition(Observation::Present),
            Transition::Continue(Step::EnsureRole(Tier::Admin))
        );
        assert_eq!(
            Step::EnsureBinding(Tier::Viewer).transition(Observation::Present),
            Transition::Continue(Step::CorrectDrift)
        );
    }

    #[test]
    fn drift_correction_finishes() {
        assert_eq!(
            Step::CorrectDrift.transition(Observation::Corrected { updates: 2 }),
            Transition::Finish(Outcome::Converged { updates: 2 })
        );
        assert_eq!(
            Step::CorrectDrift.transition(Observation::Present),
            Transition::Finish(Outcome::Converged { updates: 0 })
        );
    }
}
