//! Guard registry
//!
//! The single public entry point to the canon guards. A canon violation is
//! written to the violation log before it is returned to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::canon::{
    CanonAction, CanonCheck, CanonGuard, CanonKind, CanonRequest, CanonViolation, GmcCanonGuard,
    McCanonGuard,
};
use crate::context::{ActionPayload, ActorType};

/// Violation log write failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("violation log write failed: {0}")]
pub struct LogError(pub String);

/// Error returned by [`CanonRegistry::check_canon`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// The action breaks the canon. Already logged.
    #[error("{canon} canon violation {violation}: {message}")]
    Violation {
        canon: CanonKind,
        violation: CanonViolation,
        message: String,
    },

    #[error("no canon guard registered for {0}")]
    UnregisteredCanon(CanonKind),

    #[error(transparent)]
    Log(#[from] LogError),
}

impl CanonError {
    pub fn violation(&self) -> Option<CanonViolation> {
        match self {
            Self::Violation { violation, .. } => Some(*violation),
            _ => None,
        }
    }
}

/// One persisted canon violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationLogEntry {
    pub id: Uuid,
    pub canon: CanonKind,
    pub violation: CanonViolation,
    pub actor_id: String,
    pub actor_type: ActorType,
    pub action: CanonAction,
    pub payload: serde_json::Value,
    pub message: String,
    pub logged_at: DateTime<Utc>,
}

/// Append-only sink for canon violations
#[async_trait]
pub trait ViolationLog: Send + Sync {
    async fn record(&self, entry: ViolationLogEntry) -> Result<(), LogError>;
}

/// In-memory violation log
#[derive(Debug, Default)]
pub struct InMemoryViolationLog {
    entries: RwLock<Vec<ViolationLogEntry>>,
}

impl InMemoryViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<ViolationLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn by_canon(&self, canon: CanonKind) -> Vec<ViolationLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.canon == canon)
            .cloned()
            .collect()
    }

    pub async fn by_actor(&self, actor_id: &str) -> Vec<ViolationLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.actor_id == actor_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ViolationLog for InMemoryViolationLog {
    async fn record(&self, entry: ViolationLogEntry) -> Result<(), LogError> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// Arguments of a canon check
#[derive(Debug, Clone)]
pub struct CanonInvocation<'a> {
    pub canon: CanonKind,
    pub action: CanonAction,
    pub actor_type: ActorType,
    pub payload: &'a ActionPayload,
    pub actor_id: &'a str,
}

/// Routes canon checks to the guard of each currency kind
pub struct CanonRegistry {
    guards: HashMap<CanonKind, Box<dyn CanonGuard>>,
    log: Arc<dyn ViolationLog>,
}

impl CanonRegistry {
    /// Registry with both MC and GMC canons
    pub fn new(log: Arc<dyn ViolationLog>) -> Self {
        Self::with_canons(log, &CanonKind::ALL)
    }

    /// Registry with only the listed canons
    pub fn with_canons(log: Arc<dyn ViolationLog>, kinds: &[CanonKind]) -> Self {
        let mut guards: HashMap<CanonKind, Box<dyn CanonGuard>> = HashMap::new();
        for kind in kinds {
            let guard: Box<dyn CanonGuard> = match kind {
                CanonKind::Mc => Box::new(McCanonGuard),
                CanonKind::Gmc => Box::new(GmcCanonGuard),
            };
            guards.insert(guard.kind(), guard);
        }
        Self { guards, log }
    }

    pub fn is_registered(&self, canon: CanonKind) -> bool {
        self.guards.contains_key(&canon)
    }

    /// Check `invocation` against its canon.
    ///
    /// Allowed actions return `Ok(())` with no side effect. A violation is
    /// logged and then returned as [`CanonError::Violation`].
    pub async fn check_canon(&self, invocation: CanonInvocation<'_>) -> Result<(), CanonError> {
        let guard = self
            .guards
            .get(&invocation.canon)
            .ok_or(CanonError::UnregisteredCanon(invocation.canon))?;

        let request = CanonRequest {
            action: invocation.action,
            actor_type: invocation.actor_type,
            payload: invocation.payload,
        };

        let (violation, message) = match guard.check(&request) {
            CanonCheck::Allowed => {
                debug!(
                    canon = %invocation.canon,
                    action = %invocation.action,
                    actor_id = invocation.actor_id,
                    "canon check passed"
                );
                return Ok(());
            }
            CanonCheck::Violated { violation, message } => (violation, message),
        };

        warn!(
            canon = %invocation.canon,
            violation = %violation,
            action = %invocation.action,
            actor_id = invocation.actor_id,
            actor_type = ?invocation.actor_type,
            "canon violation"
        );

        let recorded = match serde_json::to_value(invocation.payload) {
            Ok(payload) => {
                let entry = ViolationLogEntry {
                    id: Uuid::new_v4(),
                    canon: invocation.canon,
                    violation,
                    actor_id: invocation.actor_id.to_string(),
                    actor_type: invocation.actor_type,
                    action: invocation.action,
                    payload,
                    message: message.clone(),
                    logged_at: Utc::now(),
                };
                self.log.record(entry).await
            }
            Err(e) => Err(LogError(format!("payload not serializable: {e}"))),
        };

        if let Err(e) = recorded {
            error!(
                canon = %invocation.canon,
                violation = %violation,
                error = %e,
                "failed to record canon violation"
            );
            return Err(e.into());
        }

        Err(CanonError::Violation {
            canon: invocation.canon,
            violation,
            message,
        })
    }
}

impl std::fmt::Debug for CanonRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.guards.keys().map(CanonKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("CanonRegistry").field("canons", &kinds).finish()
    }
}
