use chrono::{DateTime, Utc};

use crate::context::AccessContext;
use crate::currency::{CurrencyUnit, LifecycleState};
use crate::decision::{AccessDecision, AccessDeniedReason};

/// Sum of usable amounts at `at`. Saturates instead of overflowing.
pub fn available_balance(snapshot: &[CurrencyUnit], at: DateTime<Utc>) -> u64 {
    snapshot
        .iter()
        .filter(|u| u.is_usable_at(at))
        .fold(0u64, |acc, u| acc.saturating_add(u.amount()))
}

/// Store eligibility for a snapshot that already passed the guards.
///
/// `ALL_MC_FROZEN` needs a unit that is still frozen at `evaluated_at`; a
/// frozen unit that has expired counts as expired and yields `NO_ACTIVE_MC`.
pub fn evaluate_access(ctx: &AccessContext) -> AccessDecision {
    let at = ctx.evaluated_at;
    let balance = available_balance(&ctx.snapshot, at);

    if balance > 0 {
        return AccessDecision::eligible(balance, at);
    }

    let any_frozen = ctx
        .snapshot
        .iter()
        .any(|u| u.lifecycle_state(at) == LifecycleState::Frozen);
    let reason = if any_frozen {
        AccessDeniedReason::AllMcFrozen
    } else {
        AccessDeniedReason::NoActiveMc
    };
    AccessDecision::ineligible(reason, balance, at)
}
