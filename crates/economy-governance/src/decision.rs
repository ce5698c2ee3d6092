//! Decisions returned by the engine
//!
//! A denial is a decision, not an error. Both decision types serialize in
//! camelCase with SCREAMING_SNAKE_CASE codes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canon::CanonViolation;
use crate::error::EngineError;

/// Governance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernanceStatus {
    Allowed,
    AllowedWithReview,
    Disallowed,
}

/// How urgently a human has to look at an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewLevel {
    Routine,
    Elevated,
    Critical,
}

/// Restriction placed on the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Restriction {
    FlagForAudit,
    BlockOperation,
}

/// Why governance flagged or blocked an operation.
///
/// Canon breaches keep their own code so the caller can tell
/// `GMC_SPEND` from `ANOMALOUS_VOLUME` without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationReason {
    AnomalousVolume,
    SuspiciousFrequency,
    RestrictedDomain,
    SystemInvariantBreach,
    DataIntegrityIssue,
    Canon(CanonViolation),
}

impl ViolationReason {
    const STRUCTURAL: [ViolationReason; 5] = [
        ViolationReason::AnomalousVolume,
        ViolationReason::SuspiciousFrequency,
        ViolationReason::RestrictedDomain,
        ViolationReason::SystemInvariantBreach,
        ViolationReason::DataIntegrityIssue,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::AnomalousVolume => "ANOMALOUS_VOLUME",
            Self::SuspiciousFrequency => "SUSPICIOUS_FREQUENCY",
            Self::RestrictedDomain => "RESTRICTED_DOMAIN",
            Self::SystemInvariantBreach => "SYSTEM_INVARIANT_BREACH",
            Self::DataIntegrityIssue => "DATA_INTEGRITY_ISSUE",
            Self::Canon(v) => v.code(),
        }
    }

    pub fn is_canon(&self) -> bool {
        matches!(self, Self::Canon(_))
    }
}

impl From<CanonViolation> for ViolationReason {
    fn from(v: CanonViolation) -> Self {
        Self::Canon(v)
    }
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ViolationReason {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(reason) = Self::STRUCTURAL.into_iter().find(|r| r.code() == s) {
            return Ok(reason);
        }
        s.parse::<CanonViolation>()
            .map(Self::Canon)
            .map_err(|_| EngineError::UnknownCode {
                kind: "violation reason",
                value: s.to_string(),
            })
    }
}

impl Serialize for ViolationReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for ViolationReason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of a governance evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceDecision {
    pub status: GovernanceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_level: Option<ReviewLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<Restriction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_reason: Option<ViolationReason>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    pub evaluated_at: DateTime<Utc>,
}

impl GovernanceDecision {
    pub fn allowed(evaluated_at: DateTime<Utc>) -> Self {
        Self {
            status: GovernanceStatus::Allowed,
            review_level: None,
            restriction: None,
            violation_reason: None,
            explanation: None,
            evaluated_at,
        }
    }

    /// Allowed, but flagged for audit at `level`
    pub fn review(
        level: ReviewLevel,
        reason: ViolationReason,
        explanation: impl Into<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: GovernanceStatus::AllowedWithReview,
            review_level: Some(level),
            restriction: Some(Restriction::FlagForAudit),
            violation_reason: Some(reason),
            explanation: Some(explanation.into()),
            evaluated_at,
        }
    }

    /// Blocked. Always critical.
    pub fn disallowed(
        reason: ViolationReason,
        explanation: impl Into<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: GovernanceStatus::Disallowed,
            review_level: Some(ReviewLevel::Critical),
            restriction: Some(Restriction::BlockOperation),
            violation_reason: Some(reason),
            explanation: Some(explanation.into()),
            evaluated_at,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.status != GovernanceStatus::Disallowed
    }

    pub fn requires_review(&self) -> bool {
        self.status == GovernanceStatus::AllowedWithReview
    }

    /// Reject decisions no consumer could act on consistently
    pub fn check_consistency(&self) -> Result<(), EngineError> {
        match self.status {
            GovernanceStatus::AllowedWithReview if self.review_level.is_none() => {
                Err(EngineError::InconsistentDecision(
                    "ALLOWED_WITH_REVIEW without a review level".into(),
                ))
            }
            GovernanceStatus::Disallowed if self.violation_reason.is_none() => Err(
                EngineError::InconsistentDecision("DISALLOWED without a violation reason".into()),
            ),
            GovernanceStatus::Disallowed if self.restriction.is_none() => Err(
                EngineError::InconsistentDecision("DISALLOWED without a restriction".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Store eligibility verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityStatus {
    Eligible,
    Ineligible,
}

/// Why a user may not spend in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessDeniedReason {
    NoActiveMc,
    AllMcFrozen,
    UserRestricted,
    SystemMaintenance,
    InvalidContext,
}

impl AccessDeniedReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoActiveMc => "NO_ACTIVE_MC",
            Self::AllMcFrozen => "ALL_MC_FROZEN",
            Self::UserRestricted => "USER_RESTRICTED",
            Self::SystemMaintenance => "SYSTEM_MAINTENANCE",
            Self::InvalidContext => "INVALID_CONTEXT",
        }
    }
}

impl fmt::Display for AccessDeniedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a store-access evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub status: EligibilityStatus,

    /// Spendable MC at `evaluated_at`. Always populated, zero when denied.
    pub available_balance: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<AccessDeniedReason>,

    pub evaluated_at: DateTime<Utc>,
}

impl AccessDecision {
    pub fn eligible(available_balance: u64, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            status: EligibilityStatus::Eligible,
            available_balance,
            denial_reason: None,
            evaluated_at,
        }
    }

    pub fn ineligible(
        reason: AccessDeniedReason,
        available_balance: u64,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: EligibilityStatus::Ineligible,
            available_balance,
            denial_reason: Some(reason),
            evaluated_at,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.status == EligibilityStatus::Eligible
    }
}
