use serde::Serialize;
use tracing::{info, warn};

use super::guards::check_guards;
use super::logic::evaluate_access;
use crate::audit::{
    id_or_unknown, AuditEvent, AuditHeader, AuditTrail, StoreAccessDenied, StoreAccessEvaluated,
};
use crate::config::EngineConfig;
use crate::context::AccessContext;
use crate::decision::AccessDecision;
use crate::error::Result;

/// Decision plus the audit events that record it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessOutcome {
    pub decision: AccessDecision,
    pub events: Vec<AuditEvent>,
}

/// Store-access entry point
#[derive(Debug, Clone, Default)]
pub struct StoreAccessService {
    config: EngineConfig,
}

impl StoreAccessService {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Guards, then eligibility, then audit.
    ///
    /// A guard failure yields `INELIGIBLE` with a zero balance and a single
    /// `STORE_ACCESS_DENIED` event.
    pub fn evaluate_store_access(&self, ctx: &AccessContext) -> Result<AccessOutcome> {
        info!(user_id = %ctx.user_id, units = ctx.snapshot.len(), "evaluating store access");
        let header = AuditHeader::new(&self.config.audit_actor, ctx.evaluated_at);
        let mut trail = AuditTrail::new();

        if let Err(blocked) = check_guards(ctx) {
            warn!(
                user_id = %ctx.user_id,
                reason = %blocked.reason,
                message = %blocked.message,
                "store access denied by guard"
            );
            trail.push(AuditEvent::StoreAccessDenied(StoreAccessDenied {
                header,
                user_id: id_or_unknown(&ctx.user_id),
                denial_reason: blocked.reason,
                attempt_timestamp: ctx.evaluated_at,
            }))?;
            return Ok(AccessOutcome {
                decision: AccessDecision::ineligible(blocked.reason, 0, ctx.evaluated_at),
                events: trail.into_events(),
            });
        }

        let decision = evaluate_access(ctx);
        trail.push(AuditEvent::StoreAccessEvaluated(StoreAccessEvaluated {
            header,
            user_id: ctx.user_id.clone(),
            snapshot_balance: decision.available_balance,
            decision: decision.status,
            denial_reason: decision.denial_reason,
            evaluated_at: ctx.evaluated_at,
        }))?;

        info!(
            user_id = %ctx.user_id,
            status = ?decision.status,
            available_balance = decision.available_balance,
            "store access evaluated"
        );

        Ok(AccessOutcome {
            decision,
            events: trail.into_events(),
        })
    }
}
