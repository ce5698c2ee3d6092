use std::collections::HashSet;

use tracing::debug;

use crate::config::GovernancePolicyConfig;
use crate::context::GovernanceContext;
use crate::decision::ViolationReason;
use crate::error::GovernanceGuardError;

type GovernanceGuard =
    fn(&GovernanceContext, &GovernancePolicyConfig) -> Result<(), GovernanceGuardError>;

/// Guards in evaluation order
static GOVERNANCE_GUARDS: &[(&str, GovernanceGuard)] = &[
    ("valid_context", valid_context),
    ("known_domain", known_domain),
    ("snapshot_integrity", snapshot_integrity),
];

/// Run every structural guard; the first failure stops the chain
pub fn check_guards(
    ctx: &GovernanceContext,
    config: &GovernancePolicyConfig,
) -> Result<(), GovernanceGuardError> {
    for (name, guard) in GOVERNANCE_GUARDS {
        guard(ctx, config)?;
        debug!(guard = *name, usage_context_id = %ctx.usage_context_id, "governance guard passed");
    }
    Ok(())
}

fn valid_context(
    ctx: &GovernanceContext,
    _config: &GovernancePolicyConfig,
) -> Result<(), GovernanceGuardError> {
    let missing = [
        ("usageContextId", &ctx.usage_context_id),
        ("userId", &ctx.user_id),
        ("domain", &ctx.domain),
    ]
    .into_iter()
    .find(|(_, value)| value.trim().is_empty());

    match missing {
        Some((field, _)) => Err(GovernanceGuardError::new(
            ViolationReason::SystemInvariantBreach,
            format!("governance context has an empty {field}"),
        )),
        None => Ok(()),
    }
}

fn known_domain(
    ctx: &GovernanceContext,
    config: &GovernancePolicyConfig,
) -> Result<(), GovernanceGuardError> {
    if config.is_recognized_domain(&ctx.domain) {
        Ok(())
    } else {
        Err(GovernanceGuardError::new(
            ViolationReason::RestrictedDomain,
            format!("domain {} is not recognized", ctx.domain),
        ))
    }
}

fn snapshot_integrity(
    ctx: &GovernanceContext,
    _config: &GovernancePolicyConfig,
) -> Result<(), GovernanceGuardError> {
    let mut seen = HashSet::with_capacity(ctx.snapshot.len());
    for unit in &ctx.snapshot {
        if unit.owner_id() != ctx.user_id {
            return Err(GovernanceGuardError::new(
                ViolationReason::DataIntegrityIssue,
                format!(
                    "unit {} belongs to {}, not {}",
                    unit.id(),
                    unit.owner_id(),
                    ctx.user_id
                ),
            ));
        }
        if !seen.insert(unit.id()) {
            return Err(GovernanceGuardError::new(
                ViolationReason::DataIntegrityIssue,
                format!("unit {} appears twice in the snapshot", unit.id()),
            ));
        }
    }
    Ok(())
}
