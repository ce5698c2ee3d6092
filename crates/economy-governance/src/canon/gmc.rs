//! GMC canon
//!
//! GMC is recognition. Only humans recognize, and recognized GMC is never
//! spent, transferred, or handed out as a reward.

use super::{
    first_violation, CanonAction, CanonCheck, CanonGuard, CanonKind, CanonRequest, CanonRule,
    GmcViolation, MIN_JUSTIFICATION_CHARS,
};
use crate::context::ActorType;

fn lacks_justification(r: &CanonRequest<'_>) -> bool {
    if r.action != CanonAction::Recognize {
        return false;
    }
    let len = r
        .payload
        .justification
        .as_deref()
        .map_or(0, |j| j.trim().chars().count());
    len < MIN_JUSTIFICATION_CHARS
}

static GMC_RULES: &[CanonRule<GmcViolation>] = &[
    CanonRule {
        violation: GmcViolation::AiRecognizer,
        applies: |r| r.actor_type == ActorType::Ai,
        message: "AI actors cannot recognize or operate GMC",
    },
    CanonRule {
        violation: GmcViolation::AutomatedRecognition,
        applies: |r| r.actor_type.is_automated(),
        message: "GMC recognition cannot be automated",
    },
    CanonRule {
        violation: GmcViolation::Monetization,
        applies: |r| r.payload.monetary_equivalent,
        message: "GMC is not money and cannot carry a monetary equivalent",
    },
    CanonRule {
        violation: GmcViolation::KpiCoupling,
        applies: |r| r.payload.kpi_based,
        message: "GMC cannot be coupled to KPI payouts",
    },
    CanonRule {
        violation: GmcViolation::SalarySubstitute,
        applies: |r| r.payload.salary_substitute,
        message: "GMC cannot substitute salary",
    },
    CanonRule {
        violation: GmcViolation::RewardUsage,
        applies: |r| r.payload.reward_context,
        message: "GMC cannot be used as a reward or bonus",
    },
    CanonRule {
        violation: GmcViolation::Farming,
        applies: |r| r.payload.farming_indicator,
        message: "GMC farming detected",
    },
    CanonRule {
        violation: GmcViolation::Spend,
        applies: |r| r.action == CanonAction::Spend,
        message: "GMC is never spent",
    },
    CanonRule {
        violation: GmcViolation::Transfer,
        applies: |r| r.action == CanonAction::Transfer,
        message: "GMC is never transferred",
    },
    CanonRule {
        violation: GmcViolation::JustificationRequired,
        applies: lacks_justification,
        message: "GMC recognition requires a justification of at least 50 characters",
    },
];

pub(crate) struct GmcCanonGuard;

impl CanonGuard for GmcCanonGuard {
    fn kind(&self) -> CanonKind {
        CanonKind::Gmc
    }

    fn check(&self, request: &CanonRequest<'_>) -> CanonCheck {
        first_violation(GMC_RULES, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::CanonViolation;
    use crate::context::ActionPayload;

    const JUSTIFICATION: &str =
        "Led the warehouse migration over three weekends and trained the night shift.";

    fn violation_of(
        action: CanonAction,
        actor: ActorType,
        payload: ActionPayload,
    ) -> Option<GmcViolation> {
        let request = CanonRequest {
            action,
            actor_type: actor,
            payload: &payload,
        };
        match GmcCanonGuard.check(&request).violation() {
            Some(CanonViolation::Gmc(v)) => Some(v),
            Some(other) => panic!("GMC guard returned {other}"),
            None => None,
        }
    }

    fn justified() -> ActionPayload {
        ActionPayload::new().with_justification(JUSTIFICATION)
    }

    #[test]
    fn justified_human_recognition_is_allowed() {
        let found = violation_of(CanonAction::Recognize, ActorType::Human, justified());
        assert_eq!(found, None);
    }

    #[test]
    fn each_violation_has_an_isolating_payload() {
        use ActorType::{Ai, Cron, Human};
        use CanonAction::{Recognize, Spend, Transfer};
        use GmcViolation::*;

        let p = ActionPayload::new;
        let cases = [
            (Recognize, Ai, justified(), AiRecognizer),
            (Recognize, Cron, justified(), AutomatedRecognition),
            (Recognize, Human, justified().monetary_equivalent(), Monetization),
            (Recognize, Human, justified().kpi_based(), KpiCoupling),
            (Recognize, Human, justified().salary_substitute(), SalarySubstitute),
            (Recognize, Human, justified().reward_context(), RewardUsage),
            (Recognize, Human, justified().farming_indicator(), Farming),
            (Spend, Human, p(), GmcViolation::Spend),
            (Transfer, Human, p(), GmcViolation::Transfer),
            (Recognize, Human, p(), JustificationRequired),
        ];

        assert_eq!(cases.len(), GmcViolation::ALL.len());
        for (action, actor, payload, expected) in cases {
            assert_eq!(violation_of(action, actor, payload), Some(expected));
        }
    }

    #[test]
    fn justification_length_counts_trimmed_characters() {
        let short = format!("   {}   ", "x".repeat(MIN_JUSTIFICATION_CHARS - 1));
        assert_eq!(
            violation_of(
                CanonAction::Recognize,
                ActorType::Human,
                ActionPayload::new().with_justification(short)
            ),
            Some(GmcViolation::JustificationRequired)
        );

        let exact = "é".repeat(MIN_JUSTIFICATION_CHARS);
        assert_eq!(
            violation_of(
                CanonAction::Recognize,
                ActorType::Human,
                ActionPayload::new().with_justification(exact)
            ),
            None
        );
    }

    #[test]
    fn justification_only_required_for_recognition() {
        assert_eq!(violation_of(CanonAction::Freeze, ActorType::Human, ActionPayload::new()), None);
    }

    #[test]
    fn automated_expiry_is_not_exempt() {
        assert_eq!(
            violation_of(CanonAction::Expire, ActorType::System, ActionPayload::new()),
            Some(GmcViolation::AutomatedRecognition)
        );
    }
}
