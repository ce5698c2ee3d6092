//! # Economy Governance
//!
//! Canonical governance and store-access policy engine for the MC/GMC
//! dual-currency economy.
//!
//! ## Overview
//!
//! - **MC** is the operational behavioural currency. It is granted by
//!   humans, always expires, and can be frozen into a safe.
//! - **GMC** is the strategic recognition currency. It is recognized by
//!   humans with a written justification and is never spent or moved.
//!
//! The engine answers two questions: may this economic action happen, and
//! may this user spend in the store right now. It evaluates an
//! already-assembled context, returns a decision plus validated audit
//! events, and performs no I/O apart from writing canon violations to the
//! injected [`ViolationLog`].
//!
//! ## Key Components
//!
//! - [`CanonRegistry`]: routes canon checks to the MC or GMC canon
//! - [`GovernanceService`]: guards, policy and audit for economic actions
//! - [`GovernancePolicy`]: business rules; [`ThresholdGovernancePolicy`] by default
//! - [`StoreAccessService`]: store eligibility and spendable balance
//! - [`AuditEvent`]: the closed set of audit events
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use economy_governance::{
//!     ActionPayload, CanonAction, CanonKind, CanonRegistry, EngineConfig, GovernanceContext,
//!     GovernanceService, GovernanceStatus, InMemoryViolationLog,
//! };
//!
//! # async fn example() -> economy_governance::Result<()> {
//! let registry = CanonRegistry::new(Arc::new(InMemoryViolationLog::new()));
//! let service = GovernanceService::new(EngineConfig::default());
//!
//! let ctx = GovernanceContext::new("uc-42", "user-7", "STORE", CanonAction::Spend, Utc::now())
//!     .with_canon(CanonKind::Mc)
//!     .with_payload(ActionPayload::new().with_amount(120));
//!
//! let outcome = service.evaluate_governance_with_canon(&ctx, &registry).await?;
//! match outcome.decision.status {
//!     GovernanceStatus::Allowed => println!("allowed"),
//!     GovernanceStatus::AllowedWithReview => println!("allowed, flagged for review"),
//!     GovernanceStatus::Disallowed => {
//!         println!("blocked: {:?}", outcome.decision.violation_reason)
//!     }
//! }
//! // persist outcome.events
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod access;
pub mod audit;
pub mod canon;
pub mod config;
pub mod context;
pub mod currency;
pub mod decision;
pub mod error;
pub mod governance;
pub mod registry;

// Re-exports
pub use access::{AccessOutcome, StoreAccessService};
pub use audit::{AuditActor, AuditActorType, AuditError, AuditEvent, AuditHeader, AuditTrail};
pub use canon::{
    CanonAction, CanonCheck, CanonKind, CanonViolation, GmcViolation, McViolation,
    MIN_JUSTIFICATION_CHARS,
};
pub use config::{EngineConfig, GovernancePolicyConfig};
pub use context::{AccessContext, ActionPayload, ActorType, GovernanceContext};
pub use currency::{CurrencyUnit, CurrencyUnitBuilder, LifecycleError, LifecycleState, SourceType};
pub use decision::{
    AccessDecision, AccessDeniedReason, EligibilityStatus, GovernanceDecision, GovernanceStatus,
    Restriction, ReviewLevel, ViolationReason,
};
pub use error::{AccessGuardError, EngineError, GovernanceGuardError, Result};
pub use governance::{
    GovernanceOutcome, GovernancePolicy, GovernanceService, ThresholdGovernancePolicy,
};
pub use registry::{
    CanonError, CanonInvocation, CanonRegistry, InMemoryViolationLog, LogError, ViolationLog,
    ViolationLogEntry,
};
