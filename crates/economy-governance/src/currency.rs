//! Currency units: granted lots of MC.
//!
//! A unit always carries an expiry. There is no way to build one without it:
//! [`CurrencyUnitBuilder::build`] rejects a missing `expires_at`, and
//! deserialization goes through the same validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ActorType;
use crate::error::{EngineError, Result};

/// Where a unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    ManualGrant,
    EventParticipation,
    PeerTransfer,
}

/// Lifecycle state of a unit at a given instant.
///
/// Derived, never stored. Expiry dominates the frozen flag: a frozen unit
/// still expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Active,
    Frozen,
    Expired,
}

/// Rejected freeze/unfreeze transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("unit {unit_id} cannot be transitioned by a {actor:?} actor; only humans may")]
    NonHumanActor { unit_id: String, actor: ActorType },

    #[error("unit {0} is expired; expired units are terminal")]
    Expired(String),

    #[error("unit {0} is already frozen")]
    AlreadyFrozen(String),

    #[error("unit {0} is not frozen")]
    NotFrozen(String),
}

/// One granted lot of currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CurrencyUnitRecord")]
pub struct CurrencyUnit {
    id: String,
    owner_id: String,
    amount: u64,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    frozen: bool,
    source_type: SourceType,
    source_ref: String,
}

impl CurrencyUnit {
    /// Start building a unit owned by `owner_id`.
    pub fn builder(owner_id: impl Into<String>) -> CurrencyUnitBuilder {
        CurrencyUnitBuilder::new(owner_id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }

    /// Expired at `at`. The boundary is inclusive: a unit expiring exactly
    /// at `at` is expired.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }

    /// Spendable at `at`: neither frozen nor expired.
    pub fn is_usable_at(&self, at: DateTime<Utc>) -> bool {
        !self.frozen && !self.is_expired_at(at)
    }

    pub fn lifecycle_state(&self, at: DateTime<Utc>) -> LifecycleState {
        if self.is_expired_at(at) {
            LifecycleState::Expired
        } else if self.frozen {
            LifecycleState::Frozen
        } else {
            LifecycleState::Active
        }
    }

    /// Move the unit into the safe. Does not extend the expiry.
    pub fn freeze(
        &mut self,
        actor: ActorType,
        at: DateTime<Utc>,
    ) -> std::result::Result<(), LifecycleError> {
        self.check_transition_actor(actor)?;
        match self.lifecycle_state(at) {
            LifecycleState::Expired => Err(LifecycleError::Expired(self.id.clone())),
            LifecycleState::Frozen => Err(LifecycleError::AlreadyFrozen(self.id.clone())),
            LifecycleState::Active => {
                self.frozen = true;
                Ok(())
            }
        }
    }

    /// Take the unit out of the safe.
    pub fn unfreeze(
        &mut self,
        actor: ActorType,
        at: DateTime<Utc>,
    ) -> std::result::Result<(), LifecycleError> {
        self.check_transition_actor(actor)?;
        match self.lifecycle_state(at) {
            LifecycleState::Expired => Err(LifecycleError::Expired(self.id.clone())),
            LifecycleState::Active => Err(LifecycleError::NotFrozen(self.id.clone())),
            LifecycleState::Frozen => {
                self.frozen = false;
                Ok(())
            }
        }
    }

    fn check_transition_actor(&self, actor: ActorType) -> std::result::Result<(), LifecycleError> {
        if actor.is_human() {
            Ok(())
        } else {
            Err(LifecycleError::NonHumanActor {
                unit_id: self.id.clone(),
                actor,
            })
        }
    }
}

/// Builder for [`CurrencyUnit`].
#[derive(Debug, Clone)]
pub struct CurrencyUnitBuilder {
    id: Option<String>,
    owner_id: String,
    amount: u64,
    issued_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    frozen: bool,
    source_type: SourceType,
    source_ref: String,
}

impl CurrencyUnitBuilder {
    fn new(owner_id: impl Into<String>) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            amount: 0,
            issued_at: None,
            expires_at: None,
            frozen: false,
            source_type: SourceType::ManualGrant,
            source_ref: String::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn source(mut self, source_type: SourceType, source_ref: impl Into<String>) -> Self {
        self.source_type = source_type;
        self.source_ref = source_ref.into();
        self
    }

    /// Validate and build.
    ///
    /// A missing issue timestamp defaults to the earliest representable
    /// instant. The expiry has no default.
    pub fn build(self) -> Result<CurrencyUnit> {
        let expires_at = self.expires_at.ok_or_else(|| {
            EngineError::InvalidCurrencyUnit(
                "expiresAt is mandatory; a unit without expiry is an architectural error".into(),
            )
        })?;
        let issued_at = self.issued_at.unwrap_or(DateTime::<Utc>::MIN_UTC);

        CurrencyUnitRecord {
            id: self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            owner_id: self.owner_id,
            amount: self.amount,
            issued_at,
            expires_at: Some(expires_at),
            frozen: self.frozen,
            source_type: self.source_type,
            source_ref: self.source_ref,
        }
        .try_into()
    }
}

/// Unvalidated wire shape of a unit.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyUnitRecord {
    id: String,
    owner_id: String,
    amount: u64,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    frozen: bool,
    source_type: SourceType,
    #[serde(default)]
    source_ref: String,
}

impl TryFrom<CurrencyUnitRecord> for CurrencyUnit {
    type Error = EngineError;

    fn try_from(record: CurrencyUnitRecord) -> Result<Self> {
        let expires_at = record.expires_at.ok_or_else(|| {
            EngineError::InvalidCurrencyUnit(format!("unit {} has no expiresAt", record.id))
        })?;
        if record.id.trim().is_empty() {
            return Err(EngineError::InvalidCurrencyUnit("unit id is empty".into()));
        }
        if record.owner_id.trim().is_empty() {
            return Err(EngineError::InvalidCurrencyUnit(format!(
                "unit {} has no owner",
                record.id
            )));
        }
        if expires_at <= record.issued_at {
            return Err(EngineError::InvalidCurrencyUnit(format!(
                "unit {}: expiresAt {} must be after issuedAt {}",
                record.id, expires_at, record.issued_at
            )));
        }

        Ok(Self {
            id: record.id,
            owner_id: record.owner_id,
            amount: record.amount,
            issued_at: record.issued_at,
            expires_at,
            frozen: record.frozen,
            source_type: record.source_type,
            source_ref: record.source_ref,
        })
    }
}
