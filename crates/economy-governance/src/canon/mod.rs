//! Canon guards
//!
//! The canon is the set of rules of each currency that no business logic
//! may override. Each currency kind has one guard holding an ordered rule
//! table; the first matching rule decides. Guards are only reachable
//! through [`CanonRegistry`](crate::CanonRegistry).

mod gmc;
mod mc;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::{ActionPayload, ActorType};
use crate::error::EngineError;

pub(crate) use gmc::GmcCanonGuard;
pub(crate) use mc::McCanonGuard;

/// Minimum length, in characters, of a GMC recognition justification
pub const MIN_JUSTIFICATION_CHARS: usize = 50;

/// Currency kind governed by a canon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonKind {
    /// Operational behavioural currency
    Mc,
    /// Strategic recognition currency
    Gmc,
}

impl CanonKind {
    pub const ALL: [CanonKind; 2] = [CanonKind::Mc, CanonKind::Gmc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mc => "MC",
            Self::Gmc => "GMC",
        }
    }
}

impl fmt::Display for CanonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EngineError::UnknownCanon(s.to_string()))
    }
}

/// Canonical economic action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonAction {
    Grant,
    Earn,
    Transfer,
    Spend,
    Freeze,
    Unfreeze,
    Expire,
    Recognize,
}

impl CanonAction {
    pub const ALL: [CanonAction; 8] = [
        CanonAction::Grant,
        CanonAction::Earn,
        CanonAction::Transfer,
        CanonAction::Spend,
        CanonAction::Freeze,
        CanonAction::Unfreeze,
        CanonAction::Expire,
        CanonAction::Recognize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "GRANT",
            Self::Earn => "EARN",
            Self::Transfer => "TRANSFER",
            Self::Spend => "SPEND",
            Self::Freeze => "FREEZE",
            Self::Unfreeze => "UNFREEZE",
            Self::Expire => "EXPIRE",
            Self::Recognize => "RECOGNIZE",
        }
    }

    /// Brings new currency into existence
    pub fn is_issuance(&self) -> bool {
        matches!(self, Self::Grant | Self::Earn | Self::Recognize)
    }
}

impl fmt::Display for CanonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonAction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| EngineError::UnknownCode {
                kind: "canon action",
                value: s.to_string(),
            })
    }
}

/// MC canon violations, in rule priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum McViolation {
    AiActor,
    AutomatedOperation,
    Monetization,
    KpiCoupling,
    SalarySubstitute,
    CreativeRecognition,
    NoExpiration,
    UnlimitedAccumulation,
}

impl McViolation {
    pub const ALL: [McViolation; 8] = [
        McViolation::AiActor,
        McViolation::AutomatedOperation,
        McViolation::Monetization,
        McViolation::KpiCoupling,
        McViolation::SalarySubstitute,
        McViolation::CreativeRecognition,
        McViolation::NoExpiration,
        McViolation::UnlimitedAccumulation,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::AiActor => "MC_AI_ACTOR",
            Self::AutomatedOperation => "MC_AUTOMATED_OPERATION",
            Self::Monetization => "MC_MONETIZATION",
            Self::KpiCoupling => "MC_KPI_COUPLING",
            Self::SalarySubstitute => "MC_SALARY_SUBSTITUTE",
            Self::CreativeRecognition => "MC_CREATIVE_RECOGNITION",
            Self::NoExpiration => "MC_NO_EXPIRATION",
            Self::UnlimitedAccumulation => "MC_UNLIMITED_ACCUMULATION",
        }
    }
}

/// GMC canon violations, in rule priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GmcViolation {
    AiRecognizer,
    AutomatedRecognition,
    Monetization,
    KpiCoupling,
    SalarySubstitute,
    RewardUsage,
    Farming,
    Spend,
    Transfer,
    JustificationRequired,
}

impl GmcViolation {
    pub const ALL: [GmcViolation; 10] = [
        GmcViolation::AiRecognizer,
        GmcViolation::AutomatedRecognition,
        GmcViolation::Monetization,
        GmcViolation::KpiCoupling,
        GmcViolation::SalarySubstitute,
        GmcViolation::RewardUsage,
        GmcViolation::Farming,
        GmcViolation::Spend,
        GmcViolation::Transfer,
        GmcViolation::JustificationRequired,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::AiRecognizer => "GMC_AI_RECOGNIZER",
            Self::AutomatedRecognition => "GMC_AUTOMATED_RECOGNITION",
            Self::Monetization => "GMC_MONETIZATION",
            Self::KpiCoupling => "GMC_KPI_COUPLING",
            Self::SalarySubstitute => "GMC_SALARY_SUBSTITUTE",
            Self::RewardUsage => "GMC_REWARD_USAGE",
            Self::Farming => "GMC_FARMING",
            Self::Spend => "GMC_SPEND",
            Self::Transfer => "GMC_TRANSFER",
            Self::JustificationRequired => "GMC_JUSTIFICATION_REQUIRED",
        }
    }
}

/// A canonical violation of either currency.
///
/// Serialized as its wire code, e.g. `"GMC_SPEND"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonViolation {
    Mc(McViolation),
    Gmc(GmcViolation),
}

impl CanonViolation {
    /// Every violation of both canons, MC first
    pub fn all() -> impl Iterator<Item = CanonViolation> {
        McViolation::ALL
            .into_iter()
            .map(CanonViolation::Mc)
            .chain(GmcViolation::ALL.into_iter().map(CanonViolation::Gmc))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Mc(v) => v.code(),
            Self::Gmc(v) => v.code(),
        }
    }

    pub fn canon(&self) -> CanonKind {
        match self {
            Self::Mc(_) => CanonKind::Mc,
            Self::Gmc(_) => CanonKind::Gmc,
        }
    }
}

impl From<McViolation> for CanonViolation {
    fn from(v: McViolation) -> Self {
        Self::Mc(v)
    }
}

impl From<GmcViolation> for CanonViolation {
    fn from(v: GmcViolation) -> Self {
        Self::Gmc(v)
    }
}

impl fmt::Display for CanonViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CanonViolation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|v| v.code() == s)
            .ok_or_else(|| EngineError::UnknownCode {
                kind: "canon violation",
                value: s.to_string(),
            })
    }
}

impl Serialize for CanonViolation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for CanonViolation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// What a canon guard is asked about
#[derive(Debug, Clone, Copy)]
pub(crate) struct CanonRequest<'a> {
    pub action: CanonAction,
    pub actor_type: ActorType,
    pub payload: &'a ActionPayload,
}

/// Outcome of a canon check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonCheck {
    Allowed,
    Violated {
        violation: CanonViolation,
        message: String,
    },
}

impl CanonCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn violation(&self) -> Option<CanonViolation> {
        match self {
            Self::Allowed => None,
            Self::Violated { violation, .. } => Some(*violation),
        }
    }
}

/// Per-currency canon guard. Pure and total.
pub(crate) trait CanonGuard: Send + Sync {
    fn kind(&self) -> CanonKind;

    fn check(&self, request: &CanonRequest<'_>) -> CanonCheck;
}

/// One row of a canon rule table
pub(crate) struct CanonRule<V> {
    pub violation: V,
    pub applies: fn(&CanonRequest<'_>) -> bool,
    pub message: &'static str,
}

/// Evaluate `rules` in order; the first matching rule decides
pub(crate) fn first_violation<V>(rules: &[CanonRule<V>], request: &CanonRequest<'_>) -> CanonCheck
where
    V: Copy + Into<CanonViolation>,
{
    rules
        .iter()
        .find(|rule| (rule.applies)(request))
        .map_or(CanonCheck::Allowed, |rule| CanonCheck::Violated {
            violation: rule.violation.into(),
            message: rule.message.to_string(),
        })
}
