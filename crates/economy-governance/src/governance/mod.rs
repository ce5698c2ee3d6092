//! Governance evaluation
//!
//! Structural guards run first and fail closed. Only a context that passes
//! every guard reaches the [`GovernancePolicy`].

mod guards;
mod logic;
mod service;

pub use guards::check_guards;
pub use logic::ThresholdGovernancePolicy;
pub use service::{GovernanceOutcome, GovernanceService};

use crate::context::GovernanceContext;
use crate::decision::GovernanceDecision;

/// Business rules applied to a context that passed the guards.
///
/// Implementations must be pure: same context, same decision.
pub trait GovernancePolicy: Send + Sync {
    fn evaluate(&self, ctx: &GovernanceContext) -> GovernanceDecision;
}
