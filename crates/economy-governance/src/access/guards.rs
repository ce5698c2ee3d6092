use tracing::debug;

use crate::context::AccessContext;
use crate::decision::AccessDeniedReason;
use crate::error::AccessGuardError;

type AccessGuard = fn(&AccessContext) -> Result<(), AccessGuardError>;

static ACCESS_GUARDS: &[(&str, AccessGuard)] = &[
    ("valid_context", valid_context),
    ("system_operational", system_operational),
    ("user_not_restricted", user_not_restricted),
];

/// Run the store-access guards in order
pub fn check_guards(ctx: &AccessContext) -> Result<(), AccessGuardError> {
    for (name, guard) in ACCESS_GUARDS {
        guard(ctx)?;
        debug!(guard = *name, user_id = %ctx.user_id, "store access guard passed");
    }
    Ok(())
}

fn valid_context(ctx: &AccessContext) -> Result<(), AccessGuardError> {
    if ctx.user_id.trim().is_empty() {
        return Err(AccessGuardError::new(
            AccessDeniedReason::InvalidContext,
            "access context has no user id",
        ));
    }
    if let Some(unit) = ctx.snapshot.iter().find(|u| u.owner_id() != ctx.user_id) {
        return Err(AccessGuardError::new(
            AccessDeniedReason::InvalidContext,
            format!("unit {} does not belong to {}", unit.id(), ctx.user_id),
        ));
    }
    Ok(())
}

fn system_operational(ctx: &AccessContext) -> Result<(), AccessGuardError> {
    if ctx.is_system_maintenance {
        Err(AccessGuardError::new(
            AccessDeniedReason::SystemMaintenance,
            "store is under maintenance",
        ))
    } else {
        Ok(())
    }
}

fn user_not_restricted(ctx: &AccessContext) -> Result<(), AccessGuardError> {
    if ctx.is_user_restricted {
        Err(AccessGuardError::new(
            AccessDeniedReason::UserRestricted,
            format!("user {} is restricted from the store", ctx.user_id),
        ))
    } else {
        Ok(())
    }
}
