//! Store-access scenarios through the public service.

use chrono::{DateTime, Duration, Utc};
use economy_governance::{
    AccessContext, AccessDeniedReason, AccessOutcome, ActorType, AuditEvent, CurrencyUnit,
    EligibilityStatus, EngineConfig, SourceType, StoreAccessService,
};

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-06-15T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn mc(amount: u64, frozen: bool, expires_at: DateTime<Utc>) -> CurrencyUnit {
    CurrencyUnit::builder("user-1")
        .amount(amount)
        .issued_at(now() - Duration::days(60))
        .expires_at(expires_at)
        .frozen(frozen)
        .source(SourceType::EventParticipation, "event-2026-q2")
        .build()
        .unwrap()
}

fn evaluate(ctx: AccessContext) -> AccessOutcome {
    StoreAccessService::new(EngineConfig::default())
        .evaluate_store_access(&ctx)
        .unwrap()
}

fn event_counts(outcome: &AccessOutcome) -> (usize, usize) {
    let evaluated = outcome
        .events
        .iter()
        .filter(|e| matches!(e, AuditEvent::StoreAccessEvaluated(_)))
        .count();
    let denied = outcome
        .events
        .iter()
        .filter(|e| matches!(e, AuditEvent::StoreAccessDenied(_)))
        .count();
    (evaluated, denied)
}

#[test]
fn active_unit_makes_user_eligible() {
    let outcome = evaluate(AccessContext::new(
        "user-1",
        vec![mc(100, false, now() + Duration::days(30))],
        now(),
    ));

    assert_eq!(outcome.decision.status, EligibilityStatus::Eligible);
    assert_eq!(outcome.decision.available_balance, 100);
    assert_eq!(outcome.decision.denial_reason, None);
    assert_eq!(event_counts(&outcome), (1, 0));
}

#[test]
fn frozen_unit_makes_user_ineligible() {
    let outcome = evaluate(AccessContext::new(
        "user-1",
        vec![mc(100, true, now() + Duration::days(30))],
        now(),
    ));

    assert_eq!(outcome.decision.status, EligibilityStatus::Ineligible);
    assert_eq!(
        outcome.decision.denial_reason,
        Some(AccessDeniedReason::AllMcFrozen)
    );
    assert_eq!(outcome.decision.available_balance, 0);
    assert_eq!(event_counts(&outcome), (1, 0));
}

#[test]
fn unit_expiring_at_evaluation_instant_is_excluded() {
    let outcome = evaluate(AccessContext::new(
        "user-1",
        vec![mc(100, false, now()), mc(30, false, now() + Duration::seconds(1))],
        now(),
    ));
    assert_eq!(outcome.decision.available_balance, 30);
}

#[test]
fn maintenance_denies_regardless_of_balance() {
    let outcome = evaluate(
        AccessContext::new(
            "user-1",
            vec![mc(10_000, false, now() + Duration::days(30))],
            now(),
        )
        .with_system_maintenance(true),
    );

    assert_eq!(outcome.decision.status, EligibilityStatus::Ineligible);
    assert_eq!(outcome.decision.available_balance, 0);
    assert_eq!(
        outcome.decision.denial_reason,
        Some(AccessDeniedReason::SystemMaintenance)
    );
    assert_eq!(event_counts(&outcome), (0, 1));
}

#[test]
fn restricted_user_is_denied() {
    let outcome = evaluate(
        AccessContext::new("user-1", vec![mc(10, false, now() + Duration::days(1))], now())
            .with_user_restricted(true),
    );
    assert_eq!(
        outcome.decision.denial_reason,
        Some(AccessDeniedReason::UserRestricted)
    );
    assert_eq!(event_counts(&outcome), (0, 1));
}

#[test]
fn foreign_unit_is_an_invalid_context() {
    let foreign = CurrencyUnit::builder("user-2")
        .amount(10)
        .issued_at(now() - Duration::days(1))
        .expires_at(now() + Duration::days(1))
        .build()
        .unwrap();
    let outcome = evaluate(AccessContext::new("user-1", vec![foreign], now()));

    assert_eq!(
        outcome.decision.denial_reason,
        Some(AccessDeniedReason::InvalidContext)
    );
    match &outcome.events[0] {
        AuditEvent::StoreAccessDenied(e) => {
            assert_eq!(e.denial_reason, AccessDeniedReason::InvalidContext);
            assert_eq!(e.attempt_timestamp, now());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn access_context_from_json_rejects_unit_without_expiry() {
    let json = serde_json::json!({
        "userId": "user-1",
        "evaluatedAt": "2026-06-15T08:00:00Z",
        "snapshot": [{
            "id": "mc-1",
            "ownerId": "user-1",
            "amount": 10,
            "issuedAt": "2026-06-01T00:00:00Z",
            "sourceType": "MANUAL_GRANT"
        }]
    });
    assert!(serde_json::from_value::<AccessContext>(json).is_err());
}

#[test]
fn frozen_unit_thawed_by_human_restores_access() {
    let mut unit = mc(40, true, now() + Duration::days(5));
    let service = StoreAccessService::default();

    let before = service
        .evaluate_store_access(&AccessContext::new("user-1", vec![unit.clone()], now()))
        .unwrap();
    assert!(!before.decision.is_eligible());

    assert!(unit.unfreeze(ActorType::Cron, now()).is_err());
    unit.unfreeze(ActorType::Human, now()).unwrap();

    let after = service
        .evaluate_store_access(&AccessContext::new("user-1", vec![unit], now()))
        .unwrap();
    assert!(after.decision.is_eligible());
    assert_eq!(after.decision.available_balance, 40);
}
