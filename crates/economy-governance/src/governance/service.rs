use serde::Serialize;
use tracing::{info, warn};

use super::guards::check_guards;
use super::{GovernancePolicy, ThresholdGovernancePolicy};
use crate::audit::{
    id_or_unknown, AuditEvent, AuditHeader, AuditTrail, GovernanceEvaluated, GovernanceFlagged,
    GovernanceViolation,
};
use crate::config::EngineConfig;
use crate::context::GovernanceContext;
use crate::decision::{GovernanceDecision, GovernanceStatus, Restriction, ViolationReason};
use crate::error::{EngineError, Result};
use crate::registry::{CanonError, CanonInvocation, CanonRegistry};

const REVIEW_REQUIRED: &str = "Review Required";

/// Decision plus the audit events that record it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceOutcome {
    pub decision: GovernanceDecision,
    pub events: Vec<AuditEvent>,
}

/// Governance entry point.
///
/// Guards, then policy, then audit. Guard failures come back as a
/// `DISALLOWED` decision; only misuse of the engine is an `Err`.
#[derive(Debug, Clone)]
pub struct GovernanceService<P = ThresholdGovernancePolicy> {
    config: EngineConfig,
    policy: P,
}

impl GovernanceService<ThresholdGovernancePolicy> {
    /// Service with the default threshold policy
    pub fn new(config: EngineConfig) -> Self {
        let policy = ThresholdGovernancePolicy::new(config.governance.clone());
        Self { config, policy }
    }
}

impl<P: GovernancePolicy> GovernanceService<P> {
    pub fn with_policy(config: EngineConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `ctx` without consulting the canon registry
    pub fn evaluate_governance(&self, ctx: &GovernanceContext) -> Result<GovernanceOutcome> {
        info!(
            usage_context_id = %ctx.usage_context_id,
            user_id = %ctx.user_id,
            domain = %ctx.domain,
            "evaluating governance"
        );

        if let Err(blocked) = check_guards(ctx, &self.config.governance) {
            return self.fail_closed(ctx, blocked.reason, blocked.message);
        }

        self.apply_policy(ctx)
    }

    /// Evaluate `ctx`, enforcing its canon when it names one.
    ///
    /// Structural guards run first, so an unattributable context never
    /// reaches the violation log. A canon violation then fails closed with
    /// the violation's own code. An unregistered canon or a violation log
    /// failure is an `Err`.
    pub async fn evaluate_governance_with_canon(
        &self,
        ctx: &GovernanceContext,
        registry: &CanonRegistry,
    ) -> Result<GovernanceOutcome> {
        info!(
            usage_context_id = %ctx.usage_context_id,
            user_id = %ctx.user_id,
            domain = %ctx.domain,
            canon = ?ctx.canon,
            "evaluating governance with canon"
        );

        if let Err(blocked) = check_guards(ctx, &self.config.governance) {
            return self.fail_closed(ctx, blocked.reason, blocked.message);
        }

        if let Some(canon) = ctx.canon {
            let invocation = CanonInvocation {
                canon,
                action: ctx.action,
                actor_type: ctx.actor_type,
                payload: &ctx.payload,
                actor_id: &ctx.user_id,
            };
            match registry.check_canon(invocation).await {
                Ok(()) => {}
                Err(CanonError::Violation {
                    violation, message, ..
                }) => return self.fail_closed(ctx, ViolationReason::Canon(violation), message),
                Err(e) => return Err(e.into()),
            }
        }

        self.apply_policy(ctx)
    }

    fn apply_policy(&self, ctx: &GovernanceContext) -> Result<GovernanceOutcome> {
        let decision = self.policy.evaluate(ctx);
        decision.check_consistency()?;

        let mut trail = AuditTrail::new();
        trail.push(AuditEvent::GovernanceEvaluated(GovernanceEvaluated {
            header: self.header(ctx),
            usage_context_id: ctx.usage_context_id.clone(),
            user_id: ctx.user_id.clone(),
            domain: ctx.domain.clone(),
            status: decision.status,
            evaluated_at: ctx.evaluated_at,
        }))?;

        match decision.status {
            GovernanceStatus::Allowed => {}
            GovernanceStatus::AllowedWithReview => {
                let review_level = decision.review_level.ok_or_else(|| {
                    EngineError::InconsistentDecision("review without level".into())
                })?;
                let reason = review_reason(&decision);
                trail.push(AuditEvent::GovernanceFlagged(GovernanceFlagged {
                    header: self.header(ctx),
                    usage_context_id: ctx.usage_context_id.clone(),
                    user_id: ctx.user_id.clone(),
                    domain: ctx.domain.clone(),
                    review_level,
                    reason,
                    flagged_at: ctx.evaluated_at,
                }))?;
            }
            GovernanceStatus::Disallowed => {
                let (violation_reason, restriction) =
                    match (decision.violation_reason, decision.restriction) {
                        (Some(reason), Some(restriction)) => (reason, restriction),
                        _ => {
                            return Err(EngineError::InconsistentDecision(
                                "disallowed without reason or restriction".into(),
                            ))
                        }
                    };
                trail.push(self.violation_event(ctx, violation_reason, restriction))?;
            }
        }

        info!(
            usage_context_id = %ctx.usage_context_id,
            status = ?decision.status,
            events = trail.len(),
            "governance evaluated"
        );

        Ok(GovernanceOutcome {
            decision,
            events: trail.into_events(),
        })
    }

    fn fail_closed(
        &self,
        ctx: &GovernanceContext,
        reason: ViolationReason,
        message: String,
    ) -> Result<GovernanceOutcome> {
        warn!(
            usage_context_id = %ctx.usage_context_id,
            reason = %reason,
            message = %message,
            "governance failed closed"
        );

        let decision = GovernanceDecision::disallowed(reason, message, ctx.evaluated_at);
        let mut trail = AuditTrail::new();
        trail.push(self.violation_event(ctx, reason, Restriction::BlockOperation))?;

        Ok(GovernanceOutcome {
            decision,
            events: trail.into_events(),
        })
    }

    fn violation_event(
        &self,
        ctx: &GovernanceContext,
        violation_reason: ViolationReason,
        restriction: Restriction,
    ) -> AuditEvent {
        AuditEvent::GovernanceViolation(GovernanceViolation {
            header: self.header(ctx),
            usage_context_id: id_or_unknown(&ctx.usage_context_id),
            user_id: id_or_unknown(&ctx.user_id),
            domain: id_or_unknown(&ctx.domain),
            violation_reason,
            restriction,
            detected_at: ctx.evaluated_at,
        })
    }

    fn header(&self, ctx: &GovernanceContext) -> AuditHeader {
        AuditHeader::new(&self.config.audit_actor, ctx.evaluated_at)
    }
}

/// Flagged-event reason: explanation, else violation code, else a fixed text
fn review_reason(decision: &GovernanceDecision) -> String {
    decision
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
        .or_else(|| decision.violation_reason.map(|r| r.code().to_owned()))
        .unwrap_or_else(|| REVIEW_REQUIRED.to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::canon::{CanonAction, CanonKind, CanonViolation, GmcViolation};
    use crate::context::{ActionPayload, ActorType};
    use crate::decision::ReviewLevel;
    use crate::registry::{InMemoryViolationLog, LogError, ViolationLog, ViolationLogEntry};

    /// Counts invocations and returns a fixed decision
    struct SpyPolicy {
        calls: Arc<AtomicUsize>,
        decide: fn(&GovernanceContext) -> GovernanceDecision,
    }

    impl GovernancePolicy for SpyPolicy {
        fn evaluate(&self, ctx: &GovernanceContext) -> GovernanceDecision {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.decide)(ctx)
        }
    }

    fn spy(
        decide: fn(&GovernanceContext) -> GovernanceDecision,
    ) -> (GovernanceService<SpyPolicy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = GovernanceService::with_policy(
            EngineConfig::default(),
            SpyPolicy {
                calls: calls.clone(),
                decide,
            },
        );
        (service, calls)
    }

    fn ctx(domain: &str) -> GovernanceContext {
        GovernanceContext::new("uc-1", "user-1", domain, CanonAction::Spend, Utc::now())
    }

    #[test]
    fn allowed_produces_single_evaluated_event() {
        let service = GovernanceService::new(EngineConfig::default());
        let outcome = service
            .evaluate_governance(&ctx("STORE").with_payload(ActionPayload::new().with_amount(10)))
            .unwrap();

        assert_eq!(outcome.decision.status, GovernanceStatus::Allowed);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].event_type(), "GOVERNANCE_EVALUATED");
    }

    #[test]
    fn review_adds_flagged_event() {
        let service = GovernanceService::new(EngineConfig::default());
        let c = ctx("STORE").with_payload(ActionPayload::new().with_amount(2_000));
        let outcome = service.evaluate_governance(&c).unwrap();

        let types: Vec<_> = outcome.events.iter().map(AuditEvent::event_type).collect();
        assert_eq!(types, ["GOVERNANCE_EVALUATED", "GOVERNANCE_FLAGGED"]);
        match &outcome.events[1] {
            AuditEvent::GovernanceFlagged(e) => {
                assert_eq!(e.review_level, ReviewLevel::Elevated);
                assert!(!e.reason.is_empty());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn policy_disallow_adds_violation_event() {
        let service = GovernanceService::new(EngineConfig::default());
        let outcome = service.evaluate_governance(&ctx("PAYROLL")).unwrap();

        assert_eq!(outcome.decision.status, GovernanceStatus::Disallowed);
        let types: Vec<_> = outcome.events.iter().map(AuditEvent::event_type).collect();
        assert_eq!(types, ["GOVERNANCE_EVALUATED", "GOVERNANCE_VIOLATION"]);
    }

    #[test]
    fn guard_failure_skips_policy() {
        let (service, calls) = spy(|c| GovernanceDecision::allowed(c.evaluated_at));
        let outcome = service.evaluate_governance(&ctx("CASINO")).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.decision.status, GovernanceStatus::Disallowed);
        assert_eq!(outcome.decision.review_level, Some(ReviewLevel::Critical));
        assert_eq!(
            outcome.decision.violation_reason,
            Some(ViolationReason::RestrictedDomain)
        );
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].event_type(), "GOVERNANCE_VIOLATION");
    }

    #[test]
    fn empty_context_fails_closed_with_valid_event() {
        let (service, calls) = spy(|c| GovernanceDecision::allowed(c.evaluated_at));
        let mut bad = ctx("STORE");
        bad.user_id.clear();

        let outcome = service.evaluate_governance(&bad).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            outcome.decision.violation_reason,
            Some(ViolationReason::SystemInvariantBreach)
        );
        match &outcome.events[0] {
            AuditEvent::GovernanceViolation(e) => assert_eq!(e.user_id, crate::audit::UNKNOWN_ID),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn passing_guards_invokes_policy_once() {
        let (service, calls) = spy(|c| GovernanceDecision::allowed(c.evaluated_at));
        service.evaluate_governance(&ctx("STORE")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn inconsistent_policy_decision_is_an_error() {
        let (service, _) = spy(|c| {
            let mut d = GovernanceDecision::allowed(c.evaluated_at);
            d.status = GovernanceStatus::AllowedWithReview;
            d
        });
        assert!(matches!(
            service.evaluate_governance(&ctx("STORE")),
            Err(EngineError::InconsistentDecision(_))
        ));
    }

    fn review_level_only(c: &GovernanceContext) -> GovernanceDecision {
        GovernanceDecision {
            status: GovernanceStatus::AllowedWithReview,
            review_level: Some(ReviewLevel::Routine),
            restriction: None,
            violation_reason: None,
            explanation: None,
            evaluated_at: c.evaluated_at,
        }
    }

    fn flagged_reason(outcome: &GovernanceOutcome) -> &str {
        match &outcome.events[1] {
            AuditEvent::GovernanceFlagged(e) => &e.reason,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn review_with_level_only_falls_back_to_fixed_reason() {
        let (service, _) = spy(review_level_only);
        let outcome = service.evaluate_governance(&ctx("STORE")).unwrap();

        assert_eq!(outcome.decision.status, GovernanceStatus::AllowedWithReview);
        assert_eq!(flagged_reason(&outcome), "Review Required");
    }

    #[test]
    fn blank_review_explanation_falls_back_to_reason_code() {
        let (service, _) = spy(|c| GovernanceDecision {
            violation_reason: Some(ViolationReason::SuspiciousFrequency),
            explanation: Some("   ".into()),
            ..review_level_only(c)
        });
        let outcome = service.evaluate_governance(&ctx("STORE")).unwrap();
        assert_eq!(flagged_reason(&outcome), "SUSPICIOUS_FREQUENCY");
    }

    #[test]
    fn review_explanation_is_used_when_present() {
        let (service, _) = spy(|c| GovernanceDecision {
            explanation: Some("unusual basket".into()),
            ..review_level_only(c)
        });
        let outcome = service.evaluate_governance(&ctx("STORE")).unwrap();
        assert_eq!(flagged_reason(&outcome), "unusual basket");
    }

    #[test]
    fn events_are_stamped_with_context_time_and_audit_actor() {
        let service = GovernanceService::new(EngineConfig::default());
        let c = ctx("STORE");
        let outcome = service.evaluate_governance(&c).unwrap();
        let header = outcome.events[0].header();
        assert_eq!(header.timestamp, c.evaluated_at);
        assert_eq!(header.actor_id, "economy-governance");
        assert_eq!(outcome.decision.evaluated_at, c.evaluated_at);
    }

    #[tokio::test]
    async fn canon_violation_fails_closed_with_canon_code() {
        let log = Arc::new(InMemoryViolationLog::new());
        let registry = CanonRegistry::new(log.clone());
        let (service, calls) = spy(|c| GovernanceDecision::allowed(c.evaluated_at));

        let c = ctx("STORE").with_canon(CanonKind::Gmc);
        let outcome = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            outcome.decision.violation_reason,
            Some(ViolationReason::Canon(CanonViolation::Gmc(GmcViolation::Spend)))
        );
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn empty_context_is_rejected_before_canon_is_logged() {
        let log = Arc::new(InMemoryViolationLog::new());
        let registry = CanonRegistry::new(log.clone());
        let service = GovernanceService::new(EngineConfig::default());

        let c = GovernanceContext::new("", "", "", CanonAction::Spend, Utc::now())
            .with_canon(CanonKind::Mc)
            .with_actor_type(ActorType::Ai);
        let outcome = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap();

        assert_eq!(
            outcome.decision.violation_reason,
            Some(ViolationReason::SystemInvariantBreach)
        );
        assert_eq!(outcome.events.len(), 1);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_domain_is_rejected_before_canon_is_logged() {
        let log = Arc::new(InMemoryViolationLog::new());
        let registry = CanonRegistry::new(log.clone());
        let service = GovernanceService::new(EngineConfig::default());

        let c = ctx("CASINO").with_canon(CanonKind::Gmc);
        let outcome = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap();

        assert_eq!(
            outcome.decision.violation_reason,
            Some(ViolationReason::RestrictedDomain)
        );
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn canon_pass_falls_through_to_policy() {
        let registry = CanonRegistry::new(Arc::new(InMemoryViolationLog::new()));
        let service = GovernanceService::new(EngineConfig::default());

        let c = ctx("STORE").with_canon(CanonKind::Mc);
        let outcome = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap();
        assert_eq!(outcome.decision.status, GovernanceStatus::Allowed);
    }

    #[tokio::test]
    async fn unregistered_canon_propagates() {
        let registry =
            CanonRegistry::with_canons(Arc::new(InMemoryViolationLog::new()), &[CanonKind::Mc]);
        let service = GovernanceService::new(EngineConfig::default());

        let c = ctx("RECOGNITION").with_canon(CanonKind::Gmc);
        let err = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Canon(CanonError::UnregisteredCanon(CanonKind::Gmc))
        ));
    }

    #[tokio::test]
    async fn log_failure_propagates() {
        struct BrokenLog;

        #[async_trait::async_trait]
        impl ViolationLog for BrokenLog {
            async fn record(&self, _entry: ViolationLogEntry) -> std::result::Result<(), LogError> {
                Err(LogError("unavailable".into()))
            }
        }

        let registry = CanonRegistry::new(Arc::new(BrokenLog));
        let service = GovernanceService::new(EngineConfig::default());
        let c = ctx("STORE")
            .with_canon(CanonKind::Mc)
            .with_actor_type(ActorType::Ai);

        let err = service
            .evaluate_governance_with_canon(&c, &registry)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Canon(CanonError::Log(_))));
    }
}
