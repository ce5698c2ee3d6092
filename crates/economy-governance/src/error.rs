use thiserror::Error;

use crate::audit::AuditError;
use crate::decision::{AccessDeniedReason, ViolationReason};
use crate::registry::CanonError;

/// Errors that indicate the engine itself is misused.
///
/// These never describe a domain outcome. A denied action is a
/// [`GovernanceDecision`](crate::GovernanceDecision) or an
/// [`AccessDecision`](crate::AccessDecision), not an `EngineError`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown currency canon: {0}")]
    UnknownCanon(String),

    #[error("unknown {kind} code: {value}")]
    UnknownCode { kind: &'static str, value: String },

    #[error("invalid currency unit: {0}")]
    InvalidCurrencyUnit(String),

    #[error("malformed audit event: {0}")]
    MalformedAuditEvent(#[from] AuditError),

    #[error("policy returned an inconsistent decision: {0}")]
    InconsistentDecision(String),

    #[error("canon registry failure: {0}")]
    Canon(#[from] CanonError),

    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// A structural governance guard blocked the evaluation.
///
/// Raised only inside the governance pipeline and converted into a
/// fail-closed decision by the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("governance guard blocked ({reason}): {message}")]
pub struct GovernanceGuardError {
    pub reason: ViolationReason,
    pub message: String,
}

impl GovernanceGuardError {
    pub fn new(reason: ViolationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// A store-access guard blocked the evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store access guard blocked ({reason}): {message}")]
pub struct AccessGuardError {
    pub reason: AccessDeniedReason,
    pub message: String,
}

impl AccessGuardError {
    pub fn new(reason: AccessDeniedReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}
