//! Evaluation contexts
//!
//! A context is a consistent snapshot assembled by the caller from
//! already-loaded state. The engine never reads live state; one context
//! is one evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canon::{CanonAction, CanonKind};
use crate::currency::CurrencyUnit;

/// Kind of entity acting on the economy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorType {
    /// Human operator or user (including requests arriving over the API)
    Human,

    /// Automated system process
    System,

    /// AI agent
    Ai,

    /// Scheduled job
    Cron,
}

impl ActorType {
    pub fn is_human(&self) -> bool {
        matches!(self, Self::Human)
    }

    /// System or scheduled actor. AI is tracked separately.
    pub fn is_automated(&self) -> bool {
        matches!(self, Self::System | Self::Cron)
    }
}

/// Characteristics of the action under evaluation.
///
/// The canonical flags are typed; anything else the caller wants recorded
/// goes into `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionPayload {
    /// The action treats currency as money
    pub monetary_equivalent: bool,

    /// The action binds currency to a KPI payout
    pub kpi_based: bool,

    /// The action uses currency in place of salary
    pub salary_substitute: bool,

    /// The action pays for creative contribution
    pub creative_task: bool,

    /// The grant carries no expiry
    pub no_expiration: bool,

    /// The action allows unlimited accumulation
    pub unlimited: bool,

    /// The currency is handed out as a reward or bonus
    pub reward_context: bool,

    /// Farming behaviour was detected
    pub farming_indicator: bool,

    /// Amount moved by the action
    pub amount: Option<u64>,

    /// Operations of the same kind by this user in the recent window
    pub recent_operation_count: Option<u32>,

    /// Human-written justification (GMC recognition)
    pub justification: Option<String>,

    /// Open-ended extra attributes
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ActionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_recent_operation_count(mut self, count: u32) -> Self {
        self.recent_operation_count = Some(count);
        self
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    pub fn monetary_equivalent(mut self) -> Self {
        self.monetary_equivalent = true;
        self
    }

    pub fn kpi_based(mut self) -> Self {
        self.kpi_based = true;
        self
    }

    pub fn salary_substitute(mut self) -> Self {
        self.salary_substitute = true;
        self
    }

    pub fn creative_task(mut self) -> Self {
        self.creative_task = true;
        self
    }

    pub fn no_expiration(mut self) -> Self {
        self.no_expiration = true;
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.unlimited = true;
        self
    }

    pub fn reward_context(mut self) -> Self {
        self.reward_context = true;
        self
    }

    pub fn farming_indicator(mut self) -> Self {
        self.farming_indicator = true;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Context for a governance evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceContext {
    /// Identifier of the usage being evaluated
    pub usage_context_id: String,

    /// User the action belongs to
    pub user_id: String,

    /// Domain tag (STORE, AUCTION, RECOGNITION, ...)
    pub domain: String,

    /// Who initiates the action
    pub actor_type: ActorType,

    /// Canonical action
    pub action: CanonAction,

    /// Currency whose canon must hold for this action, if any
    #[serde(default)]
    pub canon: Option<CanonKind>,

    /// Action characteristics
    #[serde(default)]
    pub payload: ActionPayload,

    /// Currency snapshot backing the action, if the caller loaded one
    #[serde(default)]
    pub snapshot: Vec<CurrencyUnit>,

    /// Evaluation instant
    pub evaluated_at: DateTime<Utc>,
}

impl GovernanceContext {
    /// Create a context for a human-initiated action with an empty payload
    pub fn new(
        usage_context_id: impl Into<String>,
        user_id: impl Into<String>,
        domain: impl Into<String>,
        action: CanonAction,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            usage_context_id: usage_context_id.into(),
            user_id: user_id.into(),
            domain: domain.into(),
            actor_type: ActorType::Human,
            action,
            canon: None,
            payload: ActionPayload::default(),
            snapshot: Vec::new(),
            evaluated_at,
        }
    }

    pub fn with_actor_type(mut self, actor_type: ActorType) -> Self {
        self.actor_type = actor_type;
        self
    }

    /// Require the canon of `kind` to hold before any business rule runs
    pub fn with_canon(mut self, kind: CanonKind) -> Self {
        self.canon = Some(kind);
        self
    }

    pub fn with_payload(mut self, payload: ActionPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Vec<CurrencyUnit>) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// Context for a store-access evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessContext {
    pub user_id: String,

    /// Every unit the user holds at evaluation time, usable or not
    pub snapshot: Vec<CurrencyUnit>,

    pub evaluated_at: DateTime<Utc>,

    /// Store-wide maintenance mode
    #[serde(default)]
    pub is_system_maintenance: bool,

    /// User-level restriction
    #[serde(default)]
    pub is_user_restricted: bool,
}

impl AccessContext {
    pub fn new(
        user_id: impl Into<String>,
        snapshot: Vec<CurrencyUnit>,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            snapshot,
            evaluated_at,
            is_system_maintenance: false,
            is_user_restricted: false,
        }
    }

    pub fn with_system_maintenance(mut self, on: bool) -> Self {
        self.is_system_maintenance = on;
        self
    }

    pub fn with_user_restricted(mut self, restricted: bool) -> Self {
        self.is_user_restricted = restricted;
        self
    }
}
