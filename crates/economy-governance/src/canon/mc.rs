//! MC canon
//!
//! MC is the operational behavioural currency: granted by humans, it
//! expires, and it is never money, never salary, never a KPI payout.

use super::{
    first_violation, CanonAction, CanonCheck, CanonGuard, CanonKind, CanonRequest, CanonRule,
    McViolation,
};
use crate::context::ActorType;

static MC_RULES: &[CanonRule<McViolation>] = &[
    CanonRule {
        violation: McViolation::AiActor,
        applies: |r| r.actor_type == ActorType::Ai,
        message: "AI actors cannot initiate MC operations",
    },
    CanonRule {
        violation: McViolation::AutomatedOperation,
        applies: |r| r.actor_type.is_automated() && r.action != CanonAction::Expire,
        message: "automated actors may only expire MC; grants and movements require a human",
    },
    CanonRule {
        violation: McViolation::Monetization,
        applies: |r| r.payload.monetary_equivalent,
        message: "MC is not money and cannot carry a monetary equivalent",
    },
    CanonRule {
        violation: McViolation::KpiCoupling,
        applies: |r| r.payload.kpi_based,
        message: "MC cannot be coupled to KPI payouts",
    },
    CanonRule {
        violation: McViolation::SalarySubstitute,
        applies: |r| r.payload.salary_substitute,
        message: "MC cannot substitute salary",
    },
    CanonRule {
        violation: McViolation::CreativeRecognition,
        applies: |r| r.payload.creative_task,
        message: "creative contribution is recognized with GMC, not paid with MC",
    },
    CanonRule {
        violation: McViolation::NoExpiration,
        applies: |r| r.payload.no_expiration,
        message: "MC must always carry an expiry",
    },
    CanonRule {
        violation: McViolation::UnlimitedAccumulation,
        applies: |r| r.payload.unlimited,
        message: "MC accumulation must be bounded",
    },
];

pub(crate) struct McCanonGuard;

impl CanonGuard for McCanonGuard {
    fn kind(&self) -> CanonKind {
        CanonKind::Mc
    }

    fn check(&self, request: &CanonRequest<'_>) -> CanonCheck {
        first_violation(MC_RULES, request)
    }
}
